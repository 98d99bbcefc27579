//! Ids for use in typed collections.

/// Define a `Copy` newtype id around an unsigned int,
/// convertible to and from `usize` so it can index an [`IdVec`](crate::IdVec).
#[macro_export]
macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $ty:ty) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name($ty);

        impl From<$name> for usize {
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(val: usize) -> $name {
                Self(val as $ty)
            }
        }

        impl From<$name> for $ty {
            fn from(id: $name) -> $ty {
                id.0
            }
        }

        impl From<$ty> for $name {
            fn from(val: $ty) -> $name {
                Self(val)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    typed_id!(TestId, u16);

    #[test]
    fn test_conversions() {
        let id = TestId::from(7usize);
        assert_eq!(usize::from(id), 7);
        assert_eq!(u16::from(id), 7);
        assert_eq!(id, TestId::from(7u16));
        assert_eq!(id.to_string(), "TestId#7");
    }
}
