//! Scenario tests across hierarchy, evaluation and bounds

mod evaluation_integration;

use crate::foundation::collections::ObjectKey;
use crate::foundation::math::{translation_of, Vec3};
use crate::object::{Object, ObjectType};
use crate::scene::SceneGraph;
use crate::transform::TransformChannels;

fn located(name: &str, object_type: ObjectType, location: Vec3) -> Object {
    Object::new(name, object_type).with_transform(TransformChannels::identity().with_location(location))
}

fn world_translation(scene: &SceneGraph, key: ObjectKey) -> Vec3 {
    translation_of(&scene.object_to_world(key).unwrap())
}
