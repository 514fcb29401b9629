//! Evaluated-data and bounds scenarios through the scene API

use std::cell::Cell;

use approx::assert_relative_eq;

use super::{located, world_translation};
use crate::config::SceneConfig;
use crate::error::{GenerationError, ObjectError};
use crate::eval::{DataMask, GeneratedData, GenerationRequest, GeometryGenerator, PassthroughGenerator};
use crate::foundation::collections::ObjectKey;
use crate::foundation::math::Vec3;
use crate::geometry::Geometry;
use crate::object::ObjectType;
use crate::parent::ParentBinding;
use crate::scene::{EvalContext, SceneGraph};
use crate::transform::TransformChannels;

/// Produces a shifted copy of the authored geometry and counts its calls
struct Shifting {
    offset: Vec3,
    calls: Cell<usize>,
}

impl Shifting {
    fn new(offset: Vec3) -> Self {
        Self { offset, calls: Cell::new(0) }
    }
}

impl GeometryGenerator for Shifting {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedData, GenerationError> {
        self.calls.set(self.calls.get() + 1);
        Ok(GeneratedData::new(request.original.translated(self.offset)))
    }
}

struct Failing;

impl GeometryGenerator for Failing {
    fn generate(&self, _request: &GenerationRequest<'_>) -> Result<GeneratedData, GenerationError> {
        Err(GenerationError::new("array modifier ran out of memory"))
    }
}

fn mesh_with_cube(scene: &mut SceneGraph, name: &str, location: Vec3) -> ObjectKey {
    let key = scene.add_object(located(name, ObjectType::Mesh, location)).unwrap();
    let data = scene.add_data(Geometry::cube(1.0));
    scene.set_data(key, Some(data)).unwrap();
    key
}

#[test]
fn test_broadened_mask_rebuilds_only_that_object() {
    let mut scene = SceneGraph::default();
    let keys: Vec<_> = ["A", "B", "C"]
        .into_iter()
        .map(|name| mesh_with_cube(&mut scene, name, Vec3::zeros()))
        .collect();
    let generator = Shifting::new(Vec3::new(0.0, 0.0, 1.0));

    let mut ids = Vec::new();
    for &key in &keys {
        ids.push(scene.evaluate(key, DataMask::VIEWPORT, &generator).unwrap().id());
    }
    assert_eq!(generator.calls.get(), 3);

    let broad = DataMask::VIEWPORT | DataMask::TANGENTS;
    for (i, &key) in keys.iter().enumerate() {
        let mask = if i == 1 { broad } else { DataMask::POSITIONS };
        let payload = scene.evaluate(key, mask, &generator).unwrap();
        if i == 1 {
            assert_ne!(payload.id(), ids[i]);
            assert!(payload.mask().satisfies(broad));
        } else {
            assert_eq!(payload.id(), ids[i]);
        }
    }
    assert_eq!(generator.calls.get(), 4);
}

#[test]
fn test_duplicates_share_authored_data_but_own_their_results() {
    let mut scene = SceneGraph::default();
    let original = mesh_with_cube(&mut scene, "Cube", Vec3::zeros());
    let copy = scene.duplicate_object(original).unwrap();
    assert_eq!(scene.get(copy).unwrap().data(), scene.get(original).unwrap().data());

    let generator = Shifting::new(Vec3::new(2.0, 0.0, 0.0));
    scene.evaluate(original, DataMask::VIEWPORT, &generator).unwrap();
    scene.evaluate(copy, DataMask::VIEWPORT, &generator).unwrap();
    assert_eq!(scene.store().evaluated_count(), 2);

    let data = scene.get(original).unwrap().data().unwrap();
    assert_eq!(scene.store().geometry(data).unwrap(), &Geometry::cube(1.0));
    let (min, _) = scene.evaluated_geometry(copy).unwrap().min_max().unwrap();
    assert_relative_eq!(min, Vec3::new(1.0, -1.0, -1.0));

    scene.remove_object(copy).unwrap();
    assert_eq!(scene.store().released_count(), 1);
    assert_eq!(scene.store().evaluated_count(), 1);

    scene.release_evaluated(original).unwrap();
    assert_eq!(scene.store().released_count(), 2);
    assert_eq!(scene.store().evaluated_count(), 0);
    assert_eq!(scene.store().live_count(), 1);
    assert!(scene.get(original).unwrap().runtime().payload().is_none());
}

#[test]
fn test_bounds_follow_data_not_transforms() {
    let mut scene = SceneGraph::default();
    let key = mesh_with_cube(&mut scene, "Cube", Vec3::zeros());

    let before = scene.get_bounds(key).unwrap();
    assert_relative_eq!(before.min(), Vec3::new(-1.0, -1.0, -1.0));

    scene
        .evaluate(key, DataMask::VIEWPORT, &Shifting::new(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    assert!(scene.get(key).unwrap().runtime().bounds().is_dirty());
    let after = scene.get_bounds(key).unwrap();
    assert_relative_eq!(after.min(), Vec3::new(0.0, -1.0, -1.0));
    assert!(!scene.get(key).unwrap().runtime().bounds().is_dirty());

    scene.get_mut(key).unwrap().transform.location = Vec3::new(0.0, 4.0, 0.0);
    scene.evaluate_transforms(&EvalContext::default());
    assert!(!scene.get(key).unwrap().runtime().bounds().is_dirty());

    let world = scene.world_bounds(key).unwrap();
    assert_relative_eq!(world.min, Vec3::new(0.0, 3.0, -1.0), epsilon = 1e-6);
    assert_relative_eq!(world.max, Vec3::new(2.0, 5.0, 1.0), epsilon = 1e-6);
}

#[test]
fn test_bounds_fallbacks() {
    let mut scene = SceneGraph::new(SceneConfig::new().with_default_bounds_half_size(0.5));

    let mut empty = located("Empty", ObjectType::Empty, Vec3::zeros());
    empty.empty_display.size = 2.0;
    let empty = scene.add_object(empty).unwrap();
    assert_relative_eq!(scene.get_bounds(empty).unwrap().size(), Vec3::new(4.0, 4.0, 4.0));

    let camera = scene.add_object(located("Camera", ObjectType::Camera, Vec3::zeros())).unwrap();
    assert_relative_eq!(scene.get_bounds(camera).unwrap().size(), Vec3::new(1.0, 1.0, 1.0));

    let hollow = scene.add_object(located("Hollow", ObjectType::Mesh, Vec3::zeros())).unwrap();
    let nothing = scene.add_data(Geometry::from_positions(Vec::new()));
    scene.set_data(hollow, Some(nothing)).unwrap();
    let bounds = scene.get_bounds(hollow).unwrap();
    assert_eq!(bounds.size(), Vec3::zeros());
    assert_eq!(bounds.center(), Vec3::zeros());
}

#[test]
fn test_dimensions_include_world_scale() {
    let mut scene = SceneGraph::default();
    let parent = scene
        .add_object(located("Root", ObjectType::Empty, Vec3::zeros()).with_transform(
            TransformChannels::identity().with_scale(Vec3::new(2.0, 2.0, 2.0)),
        ))
        .unwrap();
    let key = mesh_with_cube(&mut scene, "Cube", Vec3::zeros());
    scene.get_mut(key).unwrap().transform.scale = Vec3::new(2.0, 3.0, 1.0);
    scene.set_parent_without_inverse(key, parent, ParentBinding::Object).unwrap();
    scene.evaluate_transforms(&EvalContext::default());

    assert_relative_eq!(scene.dimensions(key).unwrap(), Vec3::new(8.0, 12.0, 4.0), epsilon = 1e-5);
}

#[test]
fn test_pick_nearest_selectable() {
    let mut scene = SceneGraph::default();
    let near = mesh_with_cube(&mut scene, "Near", Vec3::new(5.0, 0.0, 0.0));
    let far = mesh_with_cube(&mut scene, "Far", Vec3::new(10.0, 0.0, 0.0));
    mesh_with_cube(&mut scene, "Aside", Vec3::new(5.0, 8.0, 0.0));
    scene.evaluate_transforms(&EvalContext::default());

    let origin = Vec3::new(0.0, 0.25, 0.25);
    let (hit, distance) = scene.pick(origin, Vec3::x()).unwrap();
    assert_eq!(hit, near);
    assert_relative_eq!(distance, 4.0, epsilon = 1e-5);

    scene.get_mut(near).unwrap().visibility.hide_select = true;
    let (hit, distance) = scene.pick(origin, Vec3::x()).unwrap();
    assert_eq!(hit, far);
    assert_relative_eq!(distance, 9.0, epsilon = 1e-5);

    assert!(scene.pick(origin, -Vec3::x()).is_none());
}

#[test]
fn test_failed_rebuild_keeps_previous_result() {
    let mut scene = SceneGraph::default();
    let key = mesh_with_cube(&mut scene, "Cube", Vec3::zeros());
    let data = scene.get(key).unwrap().data().unwrap();

    let id = scene
        .evaluate(key, DataMask::VIEWPORT, &Shifting::new(Vec3::new(0.0, 3.0, 0.0)))
        .unwrap()
        .id();
    scene.edit_data(data, |g| g.positions.push(Vec3::new(0.0, 9.0, 0.0))).unwrap();

    let err = scene.evaluate(key, DataMask::VIEWPORT, &Failing).unwrap_err();
    assert!(matches!(err, ObjectError::GeometryGeneration(_)));

    let payload = scene.get(key).unwrap().runtime().payload().unwrap();
    assert_eq!(payload.id(), id);
    assert_eq!(scene.store().evaluated_count(), 1);
    assert_relative_eq!(scene.get_bounds(key).unwrap().min(), Vec3::new(-1.0, 2.0, -1.0));
}

#[test]
fn test_missing_and_unsupported_data() {
    let mut scene = SceneGraph::default();
    let key = mesh_with_cube(&mut scene, "Cube", Vec3::zeros());
    let data = scene.get(key).unwrap().data().unwrap();

    assert!(scene.remove_data(data).is_some());
    assert_eq!(
        scene.evaluate(key, DataMask::VIEWPORT, &PassthroughGenerator).unwrap_err(),
        ObjectError::DataNotFound(data)
    );

    let empty = scene.add_object(located("Empty", ObjectType::Empty, Vec3::zeros())).unwrap();
    assert_eq!(
        scene.evaluate(empty, DataMask::VIEWPORT, &PassthroughGenerator).unwrap_err(),
        ObjectError::MissingData(empty)
    );
    let other = scene.add_data(Geometry::cube(1.0));
    assert_eq!(scene.set_data(empty, Some(other)), Err(ObjectError::DataUnsupported("Empty")));
}

#[test]
fn test_vertex_parent_reads_evaluated_geometry() {
    let mut scene = SceneGraph::default();
    let ctx = EvalContext::default();
    let parent = mesh_with_cube(&mut scene, "Cube", Vec3::zeros());
    let child = scene.add_object(located("Marker", ObjectType::Empty, Vec3::zeros())).unwrap();
    scene.set_parent_without_inverse(child, parent, ParentBinding::Vertex(6)).unwrap();

    scene.evaluate_transforms(&ctx);
    assert_relative_eq!(world_translation(&scene, child), Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-6);

    scene
        .evaluate(parent, DataMask::VIEWPORT, &Shifting::new(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    scene.evaluate_transforms(&ctx);
    assert_relative_eq!(world_translation(&scene, child), Vec3::new(2.0, 1.0, 1.0), epsilon = 1e-6);
}

#[test]
fn test_removing_data_releases_results_built_from_it() {
    let mut scene = SceneGraph::default();
    let shifted = scene.add_object(located("Shifted", ObjectType::Mesh, Vec3::zeros())).unwrap();
    let plain = scene.add_object(located("Plain", ObjectType::Mesh, Vec3::zeros())).unwrap();
    let data = scene.add_data(Geometry::cube(3.0));
    scene.set_data(shifted, Some(data)).unwrap();
    scene.set_data(plain, Some(data)).unwrap();

    scene
        .evaluate(shifted, DataMask::VIEWPORT, &Shifting::new(Vec3::new(1.0, 0.0, 0.0)))
        .unwrap();
    scene.evaluate(plain, DataMask::VIEWPORT, &PassthroughGenerator).unwrap();
    for key in [shifted, plain] {
        assert_relative_eq!(scene.get_bounds(key).unwrap().size(), Vec3::new(6.0, 6.0, 6.0));
    }

    assert!(scene.remove_data(data).is_some());
    assert_eq!(scene.store().evaluated_count(), 0);
    assert_eq!(scene.store().released_count(), 1);

    for key in [shifted, plain] {
        let object = scene.get(key).unwrap();
        assert!(object.runtime().payload().is_none());
        assert!(object.runtime().bounds().is_dirty());
        assert!(scene.evaluated_geometry(key).is_none());
        assert_relative_eq!(scene.get_bounds(key).unwrap().size(), Vec3::new(2.0, 2.0, 2.0));
    }
}

#[test]
fn test_relinking_data_releases_previous_result() {
    let mut scene = SceneGraph::default();
    let key = mesh_with_cube(&mut scene, "Cube", Vec3::zeros());
    let first = scene.get(key).unwrap().data().unwrap();
    let generator = Shifting::new(Vec3::new(5.0, 0.0, 0.0));

    scene.evaluate(key, DataMask::VIEWPORT, &generator).unwrap();
    assert_eq!(scene.store().evaluated_count(), 1);

    scene.set_data(key, Some(first)).unwrap();
    assert!(scene.get(key).unwrap().runtime().payload().is_some());

    scene.set_data(key, None).unwrap();
    assert_eq!(scene.store().evaluated_count(), 0);
    assert_eq!(scene.store().released_count(), 1);
    assert!(scene.get(key).unwrap().runtime().payload().is_none());
    assert_relative_eq!(scene.get_bounds(key).unwrap().size(), Vec3::new(2.0, 2.0, 2.0));

    scene.set_data(key, Some(first)).unwrap();
    scene.evaluate(key, DataMask::VIEWPORT, &generator).unwrap();
    let second = scene.add_data(Geometry::cube(2.0));
    scene.set_data(key, Some(second)).unwrap();
    assert_eq!(scene.store().released_count(), 2);
    assert_relative_eq!(scene.get_bounds(key).unwrap().size(), Vec3::new(4.0, 4.0, 4.0));

    let payload = scene.evaluate(key, DataMask::VIEWPORT, &PassthroughGenerator).unwrap();
    assert_eq!(payload.original(), second);
    assert_eq!(generator.calls.get(), 2);
}
