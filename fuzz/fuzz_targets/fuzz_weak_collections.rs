#![no_main]

use libfuzzer_sys::fuzz_target;
use rotor_core::{JsValue, ObjectId, Persistent, Realm, WeakMap, WeakSet};

// Fuzz interleavings of weak-collection updates, root drops and collections,
// and check the collections against a model of which keys are still alive.
//
// Each operation is one byte:
//   bits [2:0] – operation selector
//   bits [5:3] – key index 0–7
//   bit  6     – collection selector (map / set)
fuzz_target!(|data: &[u8]| {
    let mut realm = Realm::new();
    let map = WeakMap::new(&mut realm);
    let set = WeakSet::new(&mut realm);
    let _roots = [realm.persist(map.id()), realm.persist(set.id())];

    let mut keys: Vec<ObjectId> = Vec::new();
    let mut rooted: Vec<Option<Persistent>> = Vec::new();
    for _ in 0..8 {
        let k = realm.new_object();
        rooted.push(Some(realm.persist(k)));
        keys.push(k);
    }

    for &byte in data.iter().take(512) {
        let idx = ((byte >> 3) & 0x7) as usize;
        let use_map = byte & 0x40 == 0;
        let k = keys[idx];
        let live = realm.heap().contains(k);

        match byte & 0x7 {
            0 | 1 if live => {
                if use_map {
                    map.set(&mut realm, k, JsValue::Smi(idx as i32)).unwrap();
                } else {
                    set.add(&mut realm, k).unwrap();
                }
            }
            2 => {
                let _ = if use_map {
                    map.delete(&mut realm, k)
                } else {
                    set.delete(&mut realm, k)
                };
            }
            3 => {
                rooted[idx] = None;
            }
            4 => {
                realm.collect_garbage();
            }
            5 if !live => {
                // Replace a reclaimed key with a fresh one.
                let fresh = realm.new_object();
                rooted[idx] = Some(realm.persist(fresh));
                keys[idx] = fresh;
            }
            _ => {
                if let Some(v) = map.get(&realm, k).unwrap() {
                    assert_eq!(v, JsValue::Smi(idx as i32));
                }
                let _ = set.has(&realm, k);
            }
        }

        // Reclaimed keys are never observable.
        for &key in &keys {
            if !realm.heap().contains(key) {
                assert!(!map.has(&realm, key).unwrap());
                assert!(!set.has(&realm, key).unwrap());
            }
        }
    }

    realm.collect_garbage();
    let live_map_keys = keys
        .iter()
        .filter(|&&k| map.has(&realm, k).unwrap())
        .count();
    assert_eq!(map.len(&realm).unwrap(), live_map_keys);
});
