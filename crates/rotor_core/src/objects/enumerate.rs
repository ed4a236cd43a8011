//! Lazy enumeration of string-keyed properties, own and inherited.
//!
//! [`Realm::enumerate`] snapshots the own key order of the starting object
//! and returns a [`PropertyIter`]. Each call starts a fresh traversal, so
//! keys added afterwards show up in the next traversal and not the current
//! one. Prototype key lists are snapshotted only when the walk reaches them.
//!
//! A name is recorded as seen as soon as it is reached, before the
//! enumerability filter, so a non-enumerable own property hides an
//! enumerable inherited property of the same name. A name deleted after its
//! object was snapshotted is skipped and not recorded.

use std::collections::HashSet;

use crate::error::RotorResult;
use crate::gc::heap::ObjectId;
use crate::objects::property::PropertyKey;
use crate::realm::Realm;

/// One enumerated property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropIterItem {
    /// The property name.
    pub name: String,
    /// Whether the property was enumerable when it was reached.
    pub enumerable: bool,
}

/// The object currently being walked.
struct Cursor {
    object: ObjectId,
    names: Vec<String>,
    idx: usize,
}

impl Cursor {
    fn new(realm: &Realm, object: ObjectId) -> RotorResult<Self> {
        Ok(Self {
            object,
            names: realm.own_property_names(object)?,
            idx: 0,
        })
    }
}

/// A single traversal started by [`Realm::enumerate`].
///
/// The iterator does not borrow the realm; each step takes it explicitly so
/// callers may mutate objects between steps.
pub struct PropertyIter {
    include_non_enumerable: bool,
    recursive: bool,
    seen: HashSet<String>,
    cursor: Option<Cursor>,
}

impl PropertyIter {
    /// Advances the traversal.
    ///
    /// # Errors
    /// [`RotorError::InvalidHandle`][crate::error::RotorError::InvalidHandle]
    /// if an object on the walk has been reclaimed.
    pub fn next(&mut self, realm: &Realm) -> RotorResult<Option<PropIterItem>> {
        while let Some(cursor) = &mut self.cursor {
            if let Some(name) = cursor.names.get(cursor.idx) {
                cursor.idx += 1;
                let key = PropertyKey::from(name.as_str());
                let Some(prop) = realm.object(cursor.object)?.get_own_property(&key) else {
                    continue;
                };
                if !self.seen.insert(name.clone()) {
                    continue;
                }
                let enumerable = prop.is_enumerable();
                if !enumerable && !self.include_non_enumerable {
                    continue;
                }
                return Ok(Some(PropIterItem {
                    name: name.clone(),
                    enumerable,
                }));
            }

            let object = cursor.object;
            let next = if self.recursive {
                realm.get_prototype_of(object)?
            } else {
                None
            };
            self.cursor = match next {
                Some(proto) => Some(Cursor::new(realm, proto)?),
                None => None,
            };
        }
        Ok(None)
    }

    /// Runs the traversal to completion and returns the names in order.
    pub fn collect_names(mut self, realm: &Realm) -> RotorResult<Vec<String>> {
        let mut names = Vec::new();
        while let Some(item) = self.next(realm)? {
            names.push(item.name);
        }
        Ok(names)
    }

    /// Binds the traversal to `realm` as a standard [`Iterator`].
    pub fn with_realm(self, realm: &Realm) -> BoundPropertyIter<'_> {
        BoundPropertyIter { iter: self, realm }
    }
}

/// A [`PropertyIter`] borrowing its realm for the rest of the traversal.
pub struct BoundPropertyIter<'r> {
    iter: PropertyIter,
    realm: &'r Realm,
}

impl Iterator for BoundPropertyIter<'_> {
    type Item = RotorResult<PropIterItem>;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next(self.realm).transpose()
    }
}

impl Realm {
    /// Starts a traversal of `obj`'s string-keyed properties.
    ///
    /// With `recursive`, the walk continues through the prototype chain
    /// once own keys are exhausted. Symbol keys are never produced; see
    /// [`Realm::own_symbols`].
    pub fn enumerate(
        &self,
        obj: ObjectId,
        include_non_enumerable: bool,
        recursive: bool,
    ) -> RotorResult<PropertyIter> {
        Ok(PropertyIter {
            include_non_enumerable,
            recursive,
            seen: HashSet::new(),
            cursor: Some(Cursor::new(self, obj)?),
        })
    }

    /// Enumerable string keys of `obj` and its prototype chain, shadowed
    /// names reported once (`for-in` order).
    pub fn for_in_names(&self, obj: ObjectId) -> RotorResult<Vec<String>> {
        self.enumerate(obj, false, true)?.collect_names(self)
    }
}
