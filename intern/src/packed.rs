use std::hash::BuildHasher;

use super::{FindStr, GetStr, InternStr, KeyToStr, StrToKey};

/// Interner that checks for duplicates and will only intern a given string once.
/// Keys are dense `usize`s handed out in interning order.
#[derive(Debug)]
pub struct PackedInterner<H = crate::Hasher> {
    str_to_key: StrToKey<H>,
    key_to_str: KeyToStr,
}

impl Default for PackedInterner<crate::Hasher> {
    fn default() -> Self {
        Self::with_capacity_and_avg_len(32, 24)
    }
}

impl PackedInterner<crate::Hasher> {
    pub fn with_capacity_and_avg_len(cap: usize, avg_len: usize) -> Self {
        Self {
            str_to_key: StrToKey::with_capacity(cap),
            key_to_str: KeyToStr::with_capacity_and_avg_len(cap, avg_len),
        }
    }
}

// GetStr /////////////////////
impl<H: BuildHasher> GetStr<usize> for PackedInterner<H> {
    fn get(&self, k: usize) -> &str {
        self.key_to_str.get(k)
    }

    fn len(&self) -> usize {
        self.key_to_str.len()
    }

    fn str_len(&self) -> usize {
        self.key_to_str.str_len()
    }
}

// InternStr ///////////////////
impl<H: BuildHasher> InternStr<usize> for PackedInterner<H> {
    fn intern<T: AsRef<str>>(&mut self, s: T) -> usize {
        self.str_to_key.intern(s.as_ref(), &mut self.key_to_str)
    }
}

// FindStr /////////////////////
impl<H: BuildHasher> FindStr<usize> for PackedInterner<H> {
    fn find(&self, s: &str) -> Option<usize> {
        self.str_to_key.find(s, &self.key_to_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup() {
        let mut interner = PackedInterner::default();
        let basic = interner.intern("org.vistrails.basic");
        let vtk = interner.intern("org.vistrails.vtk");
        assert_ne!(basic, vtk);
        assert_eq!(interner.intern("org.vistrails.basic"), basic);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.get(vtk), "org.vistrails.vtk");
    }

    #[test]
    fn test_find_does_not_intern() {
        let mut interner = PackedInterner::default();
        assert_eq!(interner.find("missing"), None);
        assert!(interner.is_empty());
        let k = interner.intern("present");
        assert_eq!(interner.find("present"), Some(k));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_many_strings_survive_rehash() {
        let mut interner = PackedInterner::with_capacity_and_avg_len(2, 4);
        let keys: Vec<usize> = (0..200).map(|i| interner.intern(format!("pkg{i}"))).collect();
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(interner.get(*k), format!("pkg{i}"));
            assert_eq!(interner.find(&format!("pkg{i}")), Some(*k));
        }
    }
}
