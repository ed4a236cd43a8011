#![no_main]

use libfuzzer_sys::fuzz_target;
use rotor_core::{JsValue, PropertyAttributes, PropertyDescriptor, PropertyKey, Realm};

// Fuzz random `put` / `get` / `delete` / `define` / prototype operations on a
// small family of objects and verify that the protocol never panics and that
// its observable post-conditions hold.
//
// Each operation is encoded in two bytes:
//   byte 0  bits [2:0] – operation selector
//           bits [7:3] – value payload (interpreted as Smi)
//   byte 1  bits [3:0] – property key index k0–k15
//           bits [5:4] – target object 0–3
//           bits [7:6] – second object 0–3 (prototype operations)
//
// Sixteen keys push objects past the inline property limit, so both the
// fast and the dictionary storage paths are exercised.
fuzz_target!(|data: &[u8]| {
    let mut realm = Realm::new();
    let objects: Vec<_> = (0..4).map(|_| realm.new_object()).collect();
    const MAX_OPS: usize = 256;

    for chunk in data.chunks_exact(2).take(MAX_OPS) {
        let op = chunk[0] & 0x7;
        let smi = (chunk[0] >> 3) as i32;
        let key = PropertyKey::from(format!("k{}", chunk[1] & 0xf));
        let target = objects[((chunk[1] >> 4) & 0x3) as usize];
        let other = objects[(chunk[1] >> 6) as usize];

        match op {
            0 => {
                let stored = realm.put(target, &key, JsValue::Smi(smi), false);
                // A successful write to a data property is observable, unless
                // the property is an accessor somewhere on the chain.
                if let Ok(true) = stored
                    && let Ok(Some(desc)) = realm.get_own_property_descriptor(target, &key)
                    && desc.is_data_descriptor()
                {
                    assert_eq!(realm.get(target, &key).ok().flatten(), Some(JsValue::Smi(smi)));
                }
            }
            1 => {
                let _ = realm.get(target, &key);
                let _ = realm.has_property(target, &key);
            }
            2 => {
                if let Ok(true) = realm.delete(target, &key, false) {
                    assert!(!realm.has_own_property(target, &key).unwrap_or(true));
                }
            }
            3 => {
                let attrs = PropertyAttributes::from_bits_truncate(smi as u8);
                let desc = PropertyDescriptor::data(JsValue::Smi(smi), attrs);
                let _ = realm.define_own_property(target, &key, &desc, false);
            }
            4 => {
                let _ = realm.set_prototype_of(target, Some(other), false);
            }
            5 => {
                let _ = realm.prevent_extensions(target);
            }
            6 => {
                let names = realm.for_in_names(target).unwrap_or_default();
                let mut unique = names.clone();
                unique.sort();
                unique.dedup();
                assert_eq!(unique.len(), names.len(), "enumeration reported a name twice");
            }
            _ => {
                let _ = realm.set_prototype_of(target, None, false);
            }
        }
    }

    // Post-condition: no prototype chain may contain a cycle.
    for &obj in &objects {
        let mut current = realm.get_prototype_of(obj).ok().flatten();
        let mut steps = 0;
        while let Some(id) = current {
            assert!(id != obj, "prototype cycle through {obj:?}");
            steps += 1;
            assert!(steps <= objects.len() + 1, "prototype chain does not terminate");
            current = realm.get_prototype_of(id).ok().flatten();
        }
    }
});
