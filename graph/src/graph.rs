use util::IdVec;

use super::{Error, Vertex};

/// Directed graph with adjacency and inverse adjacency lists.
/// A `None` slot means the vertex is not (or no longer) in the graph.
#[derive(Debug, Clone)]
pub struct Graph<V> {
    /// out-edges: `adjacency[u]` lists every `v` with an edge `u -> v`.
    pub(crate) adjacency: IdVec<V, Option<Vec<V>>>,
    /// in-edges: `inverse[v]` lists every `u` with an edge `u -> v`.
    pub(crate) inverse: IdVec<V, Option<Vec<V>>>,
    num_vertices: usize,
}

impl<V> Default for Graph<V> {
    fn default() -> Self {
        Self {
            adjacency: IdVec::default(),
            inverse: IdVec::default(),
            num_vertices: 0,
        }
    }
}

impl<V: Vertex> Graph<V> {
    /// Create an empty graph with room for `cap` vertices.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            adjacency: IdVec::with_capacity(cap),
            inverse: IdVec::with_capacity(cap),
            num_vertices: 0,
        }
    }

    /// Number of vertices currently in the graph.
    #[inline]
    pub fn len(&self) -> usize {
        self.num_vertices
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_vertices == 0
    }

    /// Total number of edges.
    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().flatten().map(Vec::len).sum()
    }

    pub fn has_vertex(&self, v: V) -> bool {
        matches!(self.adjacency.get(v), Some(Some(_)))
    }

    /// Add vertex `v`. Returns false if it was already present.
    pub fn add_vertex(&mut self, v: V) -> bool {
        if self.has_vertex(v) {
            return false;
        }
        log::trace!("adding vertex {v:?}");
        self.adjacency.insert(v, Some(Vec::with_capacity(4)));
        self.inverse.insert(v, Some(Vec::with_capacity(4)));
        self.num_vertices += 1;
        true
    }

    /// Add edge `from -> to`. Both vertices must exist.
    /// Returns false if the edge was already present.
    pub fn add_edge(&mut self, from: V, to: V) -> Result<bool, Error<V>> {
        if !self.has_vertex(to) {
            return Err(Error::MissingVertex(to));
        }
        let out = match self.adjacency.get_mut(from) {
            Some(Some(out)) => out,
            _ => return Err(Error::MissingVertex(from)),
        };
        if out.contains(&to) {
            return Ok(false);
        }
        log::trace!("adding edge {from:?} -> {to:?}");
        out.push(to);
        if let Some(Some(incoming)) = self.inverse.get_mut(to) {
            incoming.push(from);
        }
        Ok(true)
    }

    /// Remove edge `from -> to`. Returns false if there was no such edge.
    pub fn delete_edge(&mut self, from: V, to: V) -> bool {
        let removed = match self.adjacency.get_mut(from) {
            Some(Some(out)) => remove_item(out, to),
            _ => false,
        };
        if removed {
            if let Some(Some(incoming)) = self.inverse.get_mut(to) {
                remove_item(incoming, from);
            }
        }
        removed
    }

    /// Remove vertex `v` and every edge touching it.
    /// Returns false if it wasn't in the graph.
    pub fn delete_vertex(&mut self, v: V) -> bool {
        let outgoing = self.adjacency.get_mut(v).and_then(Option::take);
        let incoming = self.inverse.get_mut(v).and_then(Option::take);
        let (Some(outgoing), Some(incoming)) = (outgoing, incoming) else {
            return false;
        };
        log::trace!("deleting vertex {v:?}");
        for to in outgoing {
            if let Some(Some(list)) = self.inverse.get_mut(to) {
                remove_item(list, v);
            }
        }
        for from in incoming {
            if let Some(Some(list)) = self.adjacency.get_mut(from) {
                remove_item(list, v);
            }
        }
        self.num_vertices -= 1;
        true
    }

    /// Every `to` with an edge `v -> to`, in insertion order.
    pub fn edges_from(&self, v: V) -> &[V] {
        match self.adjacency.get(v) {
            Some(Some(out)) => out.as_slice(),
            _ => &[],
        }
    }

    /// Every `from` with an edge `from -> v`, in insertion order.
    pub fn edges_to(&self, v: V) -> &[V] {
        match self.inverse.get(v) {
            Some(Some(incoming)) => incoming.as_slice(),
            _ => &[],
        }
    }

    pub fn has_edge(&self, from: V, to: V) -> bool {
        self.edges_from(from).contains(&to)
    }

    pub fn out_degree(&self, v: V) -> usize {
        self.edges_from(v).len()
    }

    pub fn in_degree(&self, v: V) -> usize {
        self.edges_to(v).len()
    }

    /// Iterate through vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = V> + '_ {
        self.adjacency
            .iter_ids()
            .filter_map(|(v, out)| out.as_ref().map(|_| v))
    }

    /// A copy of this graph with every edge reversed.
    pub fn inverse(&self) -> Self {
        Self {
            adjacency: self.inverse.clone(),
            inverse: self.adjacency.clone(),
            num_vertices: self.num_vertices,
        }
    }
}

fn remove_item<V: PartialEq>(list: &mut Vec<V>, item: V) -> bool {
    match list.iter().position(|x| *x == item) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    util::typed_id!(Id, u8);

    fn id(i: u8) -> Id {
        Id::from(i)
    }

    fn graph_with(n: u8) -> Graph<Id> {
        let mut g = Graph::with_capacity(n as usize);
        for i in 0..n {
            assert!(g.add_vertex(id(i)));
        }
        g
    }

    #[test]
    fn test_add_vertex_twice() {
        let mut g = graph_with(1);
        assert!(!g.add_vertex(id(0)));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let mut g = graph_with(2);
        assert_eq!(g.add_edge(id(0), id(1)), Ok(true));
        assert_eq!(g.add_edge(id(0), id(1)), Ok(false));
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.edges_to(id(1)), &[id(0)]);
    }

    #[test]
    fn test_add_edge_missing_vertex() {
        let mut g = graph_with(1);
        assert_eq!(g.add_edge(id(0), id(5)), Err(Error::MissingVertex(id(5))));
        assert_eq!(g.add_edge(id(5), id(0)), Err(Error::MissingVertex(id(5))));
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn test_delete_vertex_removes_incident_edges() {
        // 0 -> 1 -> 2, 0 -> 2
        let mut g = graph_with(3);
        g.add_edge(id(0), id(1)).unwrap();
        g.add_edge(id(1), id(2)).unwrap();
        g.add_edge(id(0), id(2)).unwrap();

        assert!(g.delete_vertex(id(1)));
        assert!(!g.has_vertex(id(1)));
        assert_eq!(g.len(), 2);
        assert_eq!(g.edges_from(id(0)), &[id(2)]);
        assert_eq!(g.edges_to(id(2)), &[id(0)]);
        assert_eq!(g.num_edges(), 1);

        assert!(!g.delete_vertex(id(1)));
    }

    #[test]
    fn test_delete_vertex_with_self_loop() {
        let mut g = graph_with(2);
        g.add_edge(id(0), id(0)).unwrap();
        g.add_edge(id(1), id(0)).unwrap();
        assert!(g.delete_vertex(id(0)));
        assert_eq!(g.num_edges(), 0);
        assert_eq!(g.out_degree(id(1)), 0);
    }

    #[test]
    fn test_readd_deleted_vertex() {
        let mut g = graph_with(2);
        g.add_edge(id(0), id(1)).unwrap();
        g.delete_vertex(id(1));
        assert!(g.add_vertex(id(1)));
        assert_eq!(g.in_degree(id(1)), 0);
        assert_eq!(g.out_degree(id(0)), 0);
    }

    #[test]
    fn test_delete_edge() {
        let mut g = graph_with(2);
        g.add_edge(id(0), id(1)).unwrap();
        assert!(g.delete_edge(id(0), id(1)));
        assert!(!g.delete_edge(id(0), id(1)));
        assert_eq!(g.in_degree(id(1)), 0);
    }

    #[test]
    fn test_inverse() {
        let mut g = graph_with(3);
        g.add_edge(id(0), id(1)).unwrap();
        g.add_edge(id(0), id(2)).unwrap();
        let inv = g.inverse();
        assert_eq!(inv.edges_from(id(1)), &[id(0)]);
        assert_eq!(inv.edges_to(id(0)), &[id(1), id(2)]);
        assert_eq!(inv.len(), 3);
    }

    #[test]
    fn test_vertices_skip_deleted() {
        let mut g = graph_with(4);
        g.delete_vertex(id(2));
        let vs: Vec<Id> = g.vertices().collect();
        assert_eq!(vs, vec![id(0), id(1), id(3)]);
    }
}
