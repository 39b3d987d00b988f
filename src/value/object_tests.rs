#[cfg(test)]
mod tests {
    use crate::{
        error::SlotError,
        types::{ClassRegistry, FieldKind},
        value::{FieldStorage, HeapStorage, ManagedVec, Object, ObjectRef, SlotValue},
    };
    use gc_arena::{Arena, Rootable};

    type TestRoot = Rootable![()];

    #[test]
    fn test_null_reference() {
        let null = ObjectRef::null();
        assert!(null.is_null());
        assert_eq!(null, ObjectRef::null());
    }

    #[test]
    fn test_reference_identity() {
        let arena = Arena::<TestRoot>::new(|_gc| ());
        arena.mutate(|gc, _root| {
            let registry = ClassRegistry::new();
            let a = ObjectRef::new(gc, HeapStorage::Obj(Object::new(&registry, ClassRegistry::ROOT)));
            let b = ObjectRef::new(gc, HeapStorage::Obj(Object::new(&registry, ClassRegistry::ROOT)));
            assert_eq!(a, a);
            assert_ne!(a, b);
            assert_ne!(a, ObjectRef::null());
        });
    }

    #[test]
    fn test_default_slots_follow_declared_kinds() {
        let mut registry = ClassRegistry::new();
        let inner = registry
            .define("Inner")
            .field("flag", FieldKind::Bool)
            .register()
            .unwrap();
        let outer = registry
            .define("Outer")
            .field("count", FieldKind::Int32)
            .field("handle", FieldKind::NativeInt)
            .field("child", FieldKind::Reference)
            .field("inline", FieldKind::Struct(inner))
            .register()
            .unwrap();

        let storage = FieldStorage::instance_fields(&registry, outer);
        assert_eq!(storage.read(&registry, "count").unwrap().as_int32().unwrap(), 0);
        assert_eq!(
            storage.read(&registry, "handle").unwrap().as_native_int().unwrap(),
            0
        );
        assert!(storage
            .read(&registry, "child")
            .unwrap()
            .as_object_ref()
            .unwrap()
            .is_null());
        let inline = storage.read(&registry, "inline").unwrap().as_struct().unwrap();
        assert_eq!(inline.class, inner);
        assert!(!inline.disposed);
    }

    #[test]
    fn test_write_checks_kind_and_readonly() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .define("Widget")
            .field("count", FieldKind::Int32)
            .readonly_field("token", FieldKind::NativeUInt)
            .register()
            .unwrap();

        let mut storage = FieldStorage::instance_fields(&registry, class);
        storage
            .write(&registry, "count", SlotValue::Int32(5))
            .unwrap();
        assert!(matches!(
            storage.write(&registry, "count", SlotValue::Int64(5)),
            Err(SlotError::KindMismatch { .. })
        ));
        assert!(matches!(
            storage.write(&registry, "token", SlotValue::NativeUInt(1)),
            Err(SlotError::ReadOnly { .. })
        ));
        assert!(matches!(
            storage.write(&registry, "missing", SlotValue::Int32(0)),
            Err(SlotError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_initial_write_reaches_readonly_slots() {
        let mut registry = ClassRegistry::new();
        let class = registry
            .define("Widget")
            .readonly_field("token", FieldKind::NativeUInt)
            .register()
            .unwrap();

        let mut storage = FieldStorage::instance_fields(&registry, class);
        storage
            .write_initial(&registry, "token", SlotValue::NativeUInt(42))
            .unwrap();
        assert_eq!(
            storage.read(&registry, "token").unwrap().as_native_uint().unwrap(),
            42
        );
    }

    #[test]
    fn test_shadowed_field_resolves_most_derived() {
        let mut registry = ClassRegistry::new();
        let base = registry
            .define("Base")
            .field("value", FieldKind::Int32)
            .register()
            .unwrap();
        let derived = registry
            .define("Derived")
            .extends(base)
            .field("value", FieldKind::Int64)
            .register()
            .unwrap();

        let mut storage = FieldStorage::instance_fields(&registry, derived);
        storage
            .write(&registry, "value", SlotValue::Int64(9))
            .unwrap();
        assert_eq!(storage.read(&registry, "value").unwrap().as_int64().unwrap(), 9);
        // The base level keeps its own slot untouched behind the shadow.
        assert_eq!(storage.levels()[1].slots[0], SlotValue::Int32(0));
    }

    #[test]
    fn test_vector_enforces_element_kind() {
        let registry = ClassRegistry::new();
        let mut vector = ManagedVec::new(&registry, FieldKind::Int32, 2);
        assert_eq!(vector.len(), 2);
        vector.set(0, SlotValue::Int32(3)).unwrap();
        assert!(matches!(
            vector.set(1, SlotValue::Bool(true)),
            Err(SlotError::KindMismatch { .. })
        ));
        assert!(ManagedVec::from_values(
            FieldKind::Int32,
            vec![SlotValue::Int32(1), SlotValue::Float64(2.0)],
        )
        .is_err());
    }

    #[test]
    fn test_slot_accessor_mismatch_reports_kinds() {
        let value = SlotValue::Int32(7);
        let err = value.as_native_int().unwrap_err();
        assert_eq!(
            err,
            SlotError::KindMismatch {
                expected: "nint".to_string(),
                actual: "int32".to_string(),
            }
        );
        assert!(SlotValue::Bool(true).as_bool().unwrap());
        assert_eq!(SlotValue::Float64(2.5).as_float64().unwrap(), 2.5);
        assert!(SlotValue::Bool(true).as_float64().is_err());
    }

    #[test]
    fn test_accessor_closures_reach_heap_storage() {
        let arena = Arena::<TestRoot>::new(|_gc| ());
        arena.mutate(|gc, _root| {
            let mut registry = ClassRegistry::new();
            let counter = registry
                .define("Counter")
                .field("count", FieldKind::Int32)
                .register()
                .unwrap();

            let obj = ObjectRef::new(gc, HeapStorage::Obj(Object::new(&registry, counter)));
            obj.as_object_mut(gc, |o| {
                o.storage
                    .write(&registry, "count", SlotValue::Int32(3))
                    .unwrap()
            });
            let count =
                obj.as_object(|o| o.storage.read(&registry, "count").unwrap().as_int32().unwrap());
            assert_eq!(count, 3);

            let vec = ObjectRef::new(
                gc,
                HeapStorage::Vec(ManagedVec::new(&registry, FieldKind::Bool, 2)),
            );
            vec.as_vector_mut(gc, |v| v.set(0, SlotValue::Bool(true)).unwrap());
            let set_count = vec.as_vector(|v| {
                v.iter()
                    .filter(|value| matches!(value, SlotValue::Bool(true)))
                    .count()
            });
            assert_eq!(set_count, 1);
        });
    }
}
