//! Evaluated-state cache
//!
//! Produces the evaluated version of an object's data without touching the
//! authored block. A payload is rebuilt at most once per authored revision:
//! repeated requests whose mask is covered by the cached one return the same
//! payload. Ownership of derived data is tracked by [`EvaluatedData`], so a
//! superseded payload releases exactly what it owned.

mod generator;
mod mask;
mod payload;
mod runtime;
mod store;

pub use generator::{
    CrazySpace, Derived, GeneratedData, GenerationRequest, GeometryGenerator, PassthroughGenerator,
};
pub use mask::DataMask;
pub use payload::{EvaluatedData, EvaluatedPayload, GeometrySet, PayloadId};
pub use runtime::{ObjectRuntime, RuntimeCache};
pub use store::{DataBlock, DataOrigin, GeometryStore};

use crate::error::{ObjectError, ObjectResult};
use crate::foundation::collections::{DataKey, ObjectKey};
use crate::geometry::Geometry;
use crate::object::Object;

/// Authored state a payload is keyed on
#[derive(Debug, Clone, Copy)]
struct SourceState {
    original: DataKey,
    data_revision: u64,
    modifier_revision: u64,
}

impl SourceState {
    fn of(object: &Object, key: ObjectKey, store: &GeometryStore) -> ObjectResult<Self> {
        let original = object.data().ok_or(ObjectError::MissingData(key))?;
        let block = store.get(original).ok_or(ObjectError::DataNotFound(original))?;
        Ok(Self {
            original,
            data_revision: block.revision(),
            modifier_revision: object.modifiers.revision(),
        })
    }

    fn matches(&self, payload: &EvaluatedPayload) -> bool {
        payload.is_current(self.original, self.data_revision, self.modifier_revision)
    }
}

/// Evaluate `object`'s data for `mask`, reusing the cached payload when it is
/// current and covers the request
///
/// When the authored state is unchanged but the mask broadened, the rebuild
/// uses the union of the cached and requested masks so alternating requests
/// do not thrash. On generator failure the previous payload stays in place
/// and the error is returned.
pub(crate) fn evaluate_object<'o>(
    object: &'o mut Object,
    key: ObjectKey,
    store: &mut GeometryStore,
    mask: DataMask,
    generator: &dyn GeometryGenerator,
) -> ObjectResult<&'o EvaluatedPayload> {
    let source = SourceState::of(object, key, store)?;

    let current = object.runtime.payload.as_ref().filter(|p| source.matches(p));
    match current {
        Some(payload) if payload.mask().satisfies(mask) => {
            log::trace!("Reusing evaluated payload {:?} of '{}'", payload.id(), object.name);
        }
        _ => {
            let rebuild_mask = current.map_or(mask, |p| p.mask() | mask);
            rebuild(object, store, source, rebuild_mask, generator)?;
        }
    }

    object.runtime.payload.as_ref().ok_or(ObjectError::MissingData(key))
}

fn rebuild(
    object: &mut Object,
    store: &mut GeometryStore,
    source: SourceState,
    mask: DataMask,
    generator: &dyn GeometryGenerator,
) -> ObjectResult<()> {
    let original = store
        .geometry(source.original)
        .ok_or(ObjectError::DataNotFound(source.original))?;
    let request = GenerationRequest {
        name: &object.name,
        object_type: object.object_type(),
        original,
        modifiers: &object.modifiers,
        mask,
    };

    let mut generated = match generator.generate(&request) {
        Ok(generated) => generated,
        Err(err) => {
            log::warn!(
                "Evaluating '{}' failed, keeping previous result: {err}",
                object.name
            );
            return Err(err.into());
        }
    };

    let cache = RuntimeCache::from_generated(&mut generated);
    let evaluated = match generated.geometry {
        Derived::Original => EvaluatedData::Borrowed(source.original),
        Derived::New(geometry) => EvaluatedData::Owned(store.insert_evaluated(geometry)),
    };
    let payload = EvaluatedPayload::new(
        source.original,
        evaluated,
        mask,
        source.data_revision,
        source.modifier_revision,
        GeometrySet { instances: generated.instances },
    );

    log::debug!(
        "Rebuilt evaluated payload {:?} of '{}' (owned: {}, mask: {mask:?})",
        payload.id(),
        object.name,
        payload.evaluated().is_owned()
    );

    if let Some(previous) = object.runtime.payload.replace(payload) {
        previous.release(store);
    }
    object.runtime.cache = cache;
    object.runtime.bounds.mark_dirty();
    Ok(())
}

/// Evaluated geometry of `object`, or its authored geometry before the first
/// evaluation
///
/// A payload built from a block the object no longer links is ignored.
pub(crate) fn current_geometry<'s>(object: &Object, store: &'s GeometryStore) -> Option<&'s Geometry> {
    object
        .runtime
        .payload
        .as_ref()
        .filter(|payload| object.data() == Some(payload.original()))
        .map(|payload| payload.evaluated().key())
        .or_else(|| object.data())
        .and_then(|key| store.geometry(key))
}

/// Drop the evaluated payload and runtime caches, releasing owned data
pub(crate) fn release_evaluated(object: &mut Object, store: &mut GeometryStore) {
    if let Some(payload) = object.runtime.payload.take() {
        log::trace!("Releasing evaluated payload {:?} of '{}'", payload.id(), object.name);
        payload.release(store);
    }
    object.runtime.cache = RuntimeCache::default();
    object.runtime.bounds.mark_dirty();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::foundation::collections::SlotMap;
    use crate::foundation::math::Vec3;
    use crate::geometry::Geometry;
    use crate::object::{ModifierEntry, ObjectType};
    use std::cell::Cell;

    /// Generator that counts calls and optionally produces new geometry
    struct CountingGenerator {
        calls: Cell<usize>,
        produce_new: bool,
    }

    impl CountingGenerator {
        fn new(produce_new: bool) -> Self {
            Self { calls: Cell::new(0), produce_new }
        }
    }

    impl GeometryGenerator for CountingGenerator {
        fn generate(&self, request: &GenerationRequest<'_>) -> Result<GeneratedData, GenerationError> {
            self.calls.set(self.calls.get() + 1);
            if self.produce_new {
                Ok(GeneratedData::new(request.original.translated(Vec3::new(1.0, 0.0, 0.0))))
            } else {
                Ok(GeneratedData::original())
            }
        }
    }

    struct FailingGenerator;

    impl GeometryGenerator for FailingGenerator {
        fn generate(&self, _request: &GenerationRequest<'_>) -> Result<GeneratedData, GenerationError> {
            Err(GenerationError::new("modifier failed"))
        }
    }

    fn mesh_with_data(store: &mut GeometryStore) -> (ObjectKey, Object) {
        let key = SlotMap::<ObjectKey, ()>::with_key().insert(());
        let mut object = Object::new("Cube", ObjectType::Mesh);
        let data = store.insert(Geometry::cube(1.0));
        object.set_data(Some(data)).unwrap();
        (key, object)
    }

    #[test]
    fn test_repeated_request_returns_same_payload() {
        let mut store = GeometryStore::new();
        let (key, mut object) = mesh_with_data(&mut store);
        let generator = CountingGenerator::new(false);

        let first = evaluate_object(&mut object, key, &mut store, DataMask::VIEWPORT, &generator)
            .unwrap()
            .id();
        let second = evaluate_object(&mut object, key, &mut store, DataMask::VIEWPORT, &generator)
            .unwrap()
            .id();
        let narrower = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &generator)
            .unwrap()
            .id();

        assert_eq!(first, second);
        assert_eq!(first, narrower);
        assert_eq!(generator.calls.get(), 1);
    }

    #[test]
    fn test_broadened_mask_rebuilds_once_with_union() {
        let mut store = GeometryStore::new();
        let (key, mut object) = mesh_with_data(&mut store);
        let generator = CountingGenerator::new(false);

        let narrow = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &generator)
            .unwrap()
            .id();
        let broad = evaluate_object(&mut object, key, &mut store, DataMask::WEIGHTS, &generator).unwrap();
        assert_ne!(narrow, broad.id());
        assert_eq!(broad.mask(), DataMask::POSITIONS | DataMask::WEIGHTS);
        let broad = broad.id();

        let again = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &generator)
            .unwrap()
            .id();
        assert_eq!(again, broad);
        assert_eq!(generator.calls.get(), 2);
    }

    #[test]
    fn test_authored_or_modifier_change_rebuilds() {
        let mut store = GeometryStore::new();
        let (key, mut object) = mesh_with_data(&mut store);
        let generator = CountingGenerator::new(false);

        evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &generator).unwrap();

        let data = object.data().unwrap();
        store.modify(data, |g| g.positions.push(Vec3::zeros())).unwrap();
        let after_edit = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &generator).unwrap();
        assert_eq!(after_edit.data_revision(), 1);

        object.modifiers.push(ModifierEntry::new("Subdivision", "subsurf"));
        evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &generator).unwrap();

        assert_eq!(generator.calls.get(), 3);
    }

    #[test]
    fn test_passthrough_borrows_original() {
        let mut store = GeometryStore::new();
        let (key, mut object) = mesh_with_data(&mut store);
        let data = object.data().unwrap();

        let payload = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &PassthroughGenerator).unwrap();
        assert_eq!(payload.evaluated(), &EvaluatedData::Borrowed(data));
        assert_eq!(store.evaluated_count(), 0);

        release_evaluated(&mut object, &mut store);
        assert_eq!(store.released_count(), 0);
        assert!(store.get(data).is_some());
    }

    #[test]
    fn test_owned_data_released_exactly_once() {
        let mut store = GeometryStore::new();
        let (key, mut object) = mesh_with_data(&mut store);
        let generator = CountingGenerator::new(true);
        let data = object.data().unwrap();

        for _ in 0..3 {
            store.modify(data, |g| g.positions.push(Vec3::zeros())).unwrap();
            let payload = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &generator).unwrap();
            assert!(payload.evaluated().is_owned());
            assert_eq!(store.evaluated_count(), 1);
        }
        assert_eq!(store.released_count(), 2);

        release_evaluated(&mut object, &mut store);
        assert_eq!(store.evaluated_count(), 0);
        assert_eq!(store.released_count(), 3);
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_switching_from_owned_to_borrowed_releases_copy() {
        let mut store = GeometryStore::new();
        let (key, mut object) = mesh_with_data(&mut store);

        evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &CountingGenerator::new(true)).unwrap();
        object.modifiers.push(ModifierEntry::new("Noop", "noop"));
        evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &PassthroughGenerator).unwrap();

        assert_eq!(store.evaluated_count(), 0);
        assert_eq!(store.released_count(), 1);
    }

    #[test]
    fn test_failed_generation_keeps_previous_payload() {
        let mut store = GeometryStore::new();
        let (key, mut object) = mesh_with_data(&mut store);

        let good = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &CountingGenerator::new(true))
            .unwrap()
            .id();

        object.modifiers.push(ModifierEntry::new("Broken", "boolean"));
        let err = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &FailingGenerator).unwrap_err();
        assert!(matches!(err, ObjectError::GeometryGeneration(_)));

        let kept = object.runtime().payload().unwrap();
        assert_eq!(kept.id(), good);
        assert!(store.get(kept.evaluated().key()).is_some());
    }

    #[test]
    fn test_object_without_data_cannot_be_evaluated() {
        let mut store = GeometryStore::new();
        let key = SlotMap::<ObjectKey, ()>::with_key().insert(());
        let mut empty = Object::new("Empty", ObjectType::Empty);

        let err = evaluate_object(&mut empty, key, &mut store, DataMask::POSITIONS, &PassthroughGenerator).unwrap_err();
        assert_eq!(err, ObjectError::MissingData(key));
    }

    #[test]
    fn test_rebuild_refreshes_runtime_cache_and_dirties_bounds() {
        let mut store = GeometryStore::new();
        let (key, mut object) = mesh_with_data(&mut store);
        let with_cage = |request: &GenerationRequest<'_>| {
            Ok::<_, GenerationError>(
                GeneratedData::original()
                    .with_cage(request.original.translated(Vec3::new(0.0, 2.0, 0.0)))
                    .with_instances(vec![crate::foundation::math::Mat4::identity(); 2]),
            )
        };

        object.runtime.bounds.get_or_compute(|| crate::bounds::BoundingBox::cube(1.0));
        let payload = evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &with_cage).unwrap();
        assert_eq!(payload.geometry_set().instances.len(), 2);

        let runtime = object.runtime();
        assert!(runtime.bounds().is_dirty());
        let cage_bounds = runtime.cache().cage_bounds.unwrap();
        assert_eq!(cage_bounds.min(), Vec3::new(-1.0, 1.0, -1.0));

        object.modifiers.push(ModifierEntry::new("Plain", "noop"));
        evaluate_object(&mut object, key, &mut store, DataMask::POSITIONS, &PassthroughGenerator).unwrap();
        assert!(object.runtime().cache().is_empty());
    }
}
