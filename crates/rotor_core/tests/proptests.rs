use proptest::prelude::*;
use rotor_core::{
    JsValue, ObjectId, PropertyAttributes, PropertyDescriptor, PropertyKey, Realm, RotorError,
    WeakMap,
};

const KEY_POOL: usize = 8;

fn key(i: usize) -> PropertyKey {
    PropertyKey::from(format!("k{i}"))
}

fn arb_value() -> impl Strategy<Value = JsValue> {
    prop_oneof![
        Just(JsValue::Undefined),
        Just(JsValue::Null),
        any::<bool>().prop_map(JsValue::Boolean),
        any::<i32>().prop_map(JsValue::Smi),
        "[a-z]{0,4}".prop_map(JsValue::String),
    ]
}

/// A parent property: key index, value, writable.
fn arb_parent_props() -> impl Strategy<Value = Vec<(usize, JsValue, bool)>> {
    prop::collection::vec((0..KEY_POOL, arb_value(), any::<bool>()), 0..KEY_POOL)
}

fn read_only(realm: &Realm, obj: ObjectId, k: &PropertyKey) -> bool {
    realm
        .get_own_property(obj, k)
        .unwrap()
        .is_some_and(|p| !p.is_accessor() && !p.is_writable())
}

proptest! {
    #[test]
    fn put_then_get_unless_shadowed_by_read_only(
        parent_props in arb_parent_props(),
        k in 0..KEY_POOL,
        v in arb_value(),
    ) {
        let mut realm = Realm::new();
        let parent = realm.new_object();
        for (i, value, writable) in &parent_props {
            realm.put_prop(parent, &key(*i), value.clone(), *writable, true, true).unwrap();
        }
        let child = realm.new_object_with_prototype(Some(parent));
        let k = key(k);
        let before = realm.get_value(child, &k).unwrap();
        let blocked = read_only(&realm, parent, &k);

        let stored = realm.put(child, &k, v.clone(), false).unwrap();
        prop_assert_eq!(stored, !blocked);
        let after = realm.get_value(child, &k).unwrap();
        if blocked {
            prop_assert_eq!(after, before);
            prop_assert!(!realm.has_own_property(child, &k).unwrap());
        } else {
            prop_assert_eq!(after, v);
        }
    }

    #[test]
    fn redefining_frozen_property(a in arb_value(), b in arb_value()) {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let k = key(0);
        let frozen = PropertyDescriptor::data(a.clone(), PropertyAttributes::empty());
        prop_assert!(realm.define_own_property(obj, &k, &frozen, true).unwrap());

        prop_assert!(realm.define_own_property(obj, &k, &frozen, true).unwrap());
        prop_assert!(realm.define_own_property(obj, &k, &frozen, false).unwrap());

        let changed = PropertyDescriptor::data(b.clone(), PropertyAttributes::empty());
        let same = a.same_value(&b);
        prop_assert_eq!(realm.define_own_property(obj, &k, &changed, false).unwrap(), same);
        if !same {
            let err = realm.define_own_property(obj, &k, &changed, true).unwrap_err();
            prop_assert!(matches!(err, RotorError::NonConfigurable(_)));
        }
        prop_assert_eq!(realm.get_value(obj, &k).unwrap(), a);
    }

    #[test]
    fn for_in_has_no_duplicates_and_own_first(
        own in prop::collection::vec(0..KEY_POOL, 0..12),
        inherited in prop::collection::vec(0..KEY_POOL, 0..12),
    ) {
        let mut realm = Realm::new();
        let parent = realm.new_object();
        for i in &inherited {
            realm.put(parent, &key(*i), JsValue::Null, true).unwrap();
        }
        let child = realm.new_object_with_prototype(Some(parent));
        for i in &own {
            realm.put(child, &key(*i), JsValue::Null, true).unwrap();
        }

        let mut expected: Vec<String> = Vec::new();
        for i in own.iter().chain(&inherited) {
            let name = format!("k{i}");
            if !expected.contains(&name) {
                expected.push(name);
            }
        }
        prop_assert_eq!(realm.for_in_names(child).unwrap(), expected);
    }

    #[test]
    fn closing_a_prototype_chain_is_rejected(len in 1usize..8) {
        let mut realm = Realm::new();
        let first = realm.new_object_with_prototype(None);
        let mut last = first;
        for _ in 1..len {
            let next = realm.new_object_with_prototype(None);
            realm.set_prototype_of(last, Some(next), true).unwrap();
            last = next;
        }
        let err = realm.set_prototype_of(last, Some(first), true).unwrap_err();
        prop_assert!(matches!(err, RotorError::CyclicPrototype));
        prop_assert!(!realm.set_prototype_of(last, Some(first), false).unwrap());
        prop_assert_eq!(realm.get_prototype_of(last).unwrap(), None);
    }

    #[test]
    fn weak_map_tracks_a_model(ops in prop::collection::vec((0u8..3, 0usize..4, any::<i32>()), 0..40)) {
        let mut realm = Realm::new();
        let map = WeakMap::new(&mut realm);
        let keys: Vec<ObjectId> = (0..4).map(|_| realm.new_object()).collect();
        let mut model: [Option<i32>; 4] = [None; 4];

        for (op, k, v) in ops {
            match op {
                0 => {
                    map.set(&mut realm, keys[k], JsValue::Smi(v)).unwrap();
                    model[k] = Some(v);
                }
                1 => {
                    let removed = map.delete(&mut realm, keys[k]).unwrap();
                    prop_assert_eq!(removed, model[k].is_some());
                    model[k] = None;
                }
                _ => {}
            }
            prop_assert_eq!(map.get(&realm, keys[k]).unwrap(), model[k].map(JsValue::Smi));
            prop_assert_eq!(map.has(&realm, keys[k]).unwrap(), model[k].is_some());
        }
        let live = model.iter().filter(|m| m.is_some()).count();
        prop_assert_eq!(map.len(&realm).unwrap(), live);
    }

    #[test]
    fn transient_keys_leave_no_storage(count in 0usize..64, kept in 0usize..8) {
        let mut realm = Realm::new();
        let map = WeakMap::new(&mut realm);
        let _map_root = realm.persist(map.id());
        let mut roots = Vec::new();
        for i in 0..count {
            let key = realm.new_object();
            map.set(&mut realm, key, JsValue::Smi(i as i32)).unwrap();
            if i < kept {
                roots.push((key, realm.persist(key)));
            }
        }
        realm.collect_garbage();

        prop_assert_eq!(map.len(&realm).unwrap(), roots.len());
        for (key, _) in &roots {
            prop_assert!(map.has(&realm, *key).unwrap());
        }
    }
}
