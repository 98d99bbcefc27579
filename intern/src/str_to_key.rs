use hashbrown::hash_map::{HashMap, RawEntryMut};
use std::hash::BuildHasher;

use super::KeyToStr;

/// Internals used for keeping track of interned string ids.
/// Uses a HashMap with no value (w/ `()` as the value parameter) internally.
/// This acts as a mapping from string hash -> key, w/o double-storing the
/// actual contents of the string.
#[derive(Debug)]
pub struct StrToKey<H = crate::Hasher> {
    map: HashMap<usize, (), ()>,
    hasher: H,
}

impl<H: Default> StrToKey<H> {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(cap, ()),
            hasher: H::default(),
        }
    }
}

impl<H: BuildHasher> StrToKey<H> {
    /// Return the key for `s`, pushing it into `key_to_str` if it's new.
    pub fn intern(&mut self, s: &str, key_to_str: &mut KeyToStr) -> usize {
        let hash = self.hasher.hash_one(s);
        let entry = self
            .map
            .raw_entry_mut()
            .from_hash(hash, |colliding_key| key_to_str.get(*colliding_key) == s);

        match entry {
            RawEntryMut::Occupied(entry) => *entry.into_key(),
            RawEntryMut::Vacant(entry) => {
                let new_k = key_to_str.push(s);
                entry.insert_with_hasher(hash, new_k, (), |colliding_key| {
                    self.hasher.hash_one(key_to_str.get(*colliding_key))
                });
                new_k
            }
        }
    }

    /// Return the key for `s` if it was interned before.
    pub fn find(&self, s: &str, key_to_str: &KeyToStr) -> Option<usize> {
        let hash = self.hasher.hash_one(s);
        self.map
            .raw_entry()
            .from_hash(hash, |colliding_key| key_to_str.get(*colliding_key) == s)
            .map(|(k, _)| *k)
    }
}
