use std::marker::PhantomData;

use super::{FindStr, GetStr, InternStr};

/// Wraps an interner keyed by `usize` so that callers deal in typed keys.
#[derive(Debug)]
pub struct TypedInterner<K, T> {
    interner: T,
    _phantom: PhantomData<K>,
}

impl<K, T: Default> Default for TypedInterner<K, T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<K, T> TypedInterner<K, T> {
    pub fn new(interner: T) -> Self {
        Self {
            interner,
            _phantom: PhantomData,
        }
    }
}

// GetStr ///////////////////
impl<K, T> GetStr<K> for TypedInterner<K, T>
where
    K: Into<usize>,
    T: GetStr<usize>,
{
    fn get(&self, k: K) -> &str {
        self.interner.get(k.into())
    }

    fn len(&self) -> usize {
        self.interner.len()
    }

    fn str_len(&self) -> usize {
        self.interner.str_len()
    }
}

// InternStr ///////////////
impl<K, T> InternStr<K> for TypedInterner<K, T>
where
    K: From<usize>,
    T: InternStr<usize>,
{
    fn intern<U: AsRef<str>>(&mut self, s: U) -> K {
        self.interner.intern(s).into()
    }
}

// FindStr /////////////////
impl<K, T> FindStr<K> for TypedInterner<K, T>
where
    K: From<usize>,
    T: FindStr<usize>,
{
    fn find(&self, s: &str) -> Option<K> {
        self.interner.find(s).map(K::from)
    }
}
