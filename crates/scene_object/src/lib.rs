//! # Scene Object
//!
//! Scene-graph object nodes with transform hierarchies and an evaluated-state
//! cache.
//!
//! ## Features
//!
//! - **Transform Channels**: location, rotation (Euler, quaternion or
//!   axis-angle) and scale with layered delta channels
//! - **Parent Bindings**: object, skeleton, vertex, vertex-triangle and bone
//!   parenting with a bind-time inverse correction
//! - **Hierarchy Passes**: parent-first world evaluation, with wide levels
//!   split across threads
//! - **Evaluated Data**: memoized, copy-on-write evaluation of derived
//!   geometry with explicit ownership of produced data
//! - **Bounds**: lazily recomputed local bounds, world boxes and ray picking
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_object::prelude::*;
//!
//! let mut scene = SceneGraph::new(SceneConfig::default());
//!
//! let parent = scene
//!     .add_object(Object::new("Parent", ObjectType::Empty)
//!         .with_transform(TransformChannels::identity().with_location(Vec3::new(0.0, 5.0, 0.0))))
//!     .unwrap();
//! let child = scene
//!     .add_object(Object::new("Child", ObjectType::Empty)
//!         .with_transform(TransformChannels::identity().with_location(Vec3::new(1.0, 0.0, 0.0))))
//!     .unwrap();
//!
//! scene.set_parent(child, parent, ParentBinding::Object).unwrap();
//! let report = scene.evaluate_transforms(&EvalContext::default());
//! assert!(report.is_complete());
//!
//! // The bind-time correction keeps the child where it was.
//! let world = scene.object_to_world(child).unwrap();
//! assert!((world.m14 - 1.0).abs() < 1e-6 && world.m24.abs() < 1e-6);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod bounds;
pub mod config;
pub mod error;
pub mod eval;
pub mod foundation;
pub mod geometry;
pub mod legacy;
pub mod object;
pub mod parent;
pub mod scene;
pub mod transform;

pub use error::{GenerationError, ObjectError, ObjectResult};

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        bounds::{Aabb, BoundingBox},
        config::{Config, SceneConfig},
        error::{GenerationError, ObjectError, ObjectResult},
        eval::{
            DataMask, Derived, EvaluatedData, EvaluatedPayload, GeneratedData, GenerationRequest,
            GeometryGenerator, PassthroughGenerator,
        },
        foundation::{
            collections::{DataKey, ObjectKey},
            math::{Mat3, Mat4, Quat, Vec3},
        },
        geometry::Geometry,
        object::{Object, ObjectType},
        parent::{ParentBinding, ParentOptions, PoseProvider, StaticPose},
        scene::{EvalContext, PassReport, SceneGraph},
        transform::{EulerOrder, RotationMode, TransformChannels},
    };
}
