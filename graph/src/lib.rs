//!
//! A small directed graph over typed vertex ids, used to track which packages
//! depend on which.
//!
//! An edge `u -> v` means "u depends on v". The graph keeps both the adjacency
//! list and its inverse up to date, so reverse dependencies can be queried
//! without a scan. Vertices are iterated in ascending id order, which makes
//! every traversal (and so every load order) deterministic.

/// [`Graph`] struct plus mutation and neighbor queries.
mod graph;
pub use graph::Graph;

/// depth-first topological sort and reachability
mod search;

/// Anything that can be used as a vertex id:
/// in practice, a newtype created with `util::typed_id!`.
pub trait Vertex: Copy + Eq + std::fmt::Debug + From<usize> + Into<usize> {}

impl<T: Copy + Eq + std::fmt::Debug + From<usize> + Into<usize>> Vertex for T {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error<V: std::fmt::Debug> {
    #[error("Vertex {0:?} is not in the graph")]
    MissingVertex(V),
    #[error("Graph contains a cycle through edge {from:?} -> {to:?}")]
    ContainsCycle { from: V, to: V },
}

#[inline]
fn idx<V: Into<usize>>(v: V) -> usize {
    v.into()
}
