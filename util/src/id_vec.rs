use std::marker::PhantomData;

/// Vec wrapper that uses typed indexes.
///
/// Lookups with an id past the end return `None` rather than panicking,
/// so sparse collections (e.g. graph vertices that were deleted) can be
/// represented as `IdVec<K, Option<V>>`.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct IdVec<K, V> {
    vec: Vec<V>,
    _phantom: PhantomData<K>,
}

impl<K, V> Default for IdVec<K, V> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<K, V> IdVec<K, V> {
    fn new(vec: Vec<V>) -> Self {
        Self {
            vec,
            _phantom: PhantomData,
        }
    }

    /// Create a new `IdVec` with the given capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self::new(Vec::with_capacity(cap))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }

    /// Iterate through immutable references to values
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.vec.iter()
    }
}

impl<K: From<usize>, V> IdVec<K, V> {
    /// Iterate through `(id, value)` pairs in id order.
    pub fn iter_ids(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.vec.iter().enumerate().map(|(i, v)| (K::from(i), v))
    }
}

impl<K: Into<usize>, V> IdVec<K, V> {
    /// Get the value with id `k`, if it is in bounds.
    #[inline]
    pub fn get(&self, k: K) -> Option<&V> {
        self.vec.get(k.into())
    }

    /// Get a mutable reference to value with id `k`, if it is in bounds.
    #[inline]
    pub fn get_mut(&mut self, k: K) -> Option<&mut V> {
        self.vec.get_mut(k.into())
    }
}

impl<K: Into<usize>, V: Default> IdVec<K, V> {
    /// Insert value `v` at position `k`.
    /// The underlying vec will be extended if `k` is beyond its current length,
    /// and new entries will be filled with a default value.
    pub fn insert(&mut self, k: K, v: V) {
        let k = k.into();
        if k >= self.vec.len() {
            self.vec.resize_with(k + 1, V::default);
        }
        self.vec[k] = v;
    }
}
