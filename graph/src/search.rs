use std::collections::VecDeque;

use super::{idx, Error, Graph, Vertex};

const QUEUE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// on the current dfs path
    Open,
    Done,
}

impl<V: Vertex> Graph<V> {
    /// Sort vertices so that for every edge `u -> v`, `u` comes before `v`.
    ///
    /// Uses an iterative depth-first search, starting roots in ascending id order.
    /// If the graph has a cycle, fails with the back edge that closed it.
    pub fn topological_sort(&self) -> Result<Vec<V>, Error<V>> {
        let mut marks = vec![Mark::Unvisited; self.adjacency.len()];
        let mut finished = Vec::with_capacity(self.len());
        // (vertex, index of next out-edge to follow):
        let mut stack: Vec<(V, usize)> = Vec::with_capacity(QUEUE_CAPACITY);

        for root in self.vertices() {
            if marks[idx(root)] != Mark::Unvisited {
                continue;
            }
            marks[idx(root)] = Mark::Open;
            stack.push((root, 0));

            while let Some((u, next)) = stack.pop() {
                match self.edges_from(u).get(next) {
                    Some(&v) => {
                        stack.push((u, next + 1));
                        match marks[idx(v)] {
                            Mark::Unvisited => {
                                marks[idx(v)] = Mark::Open;
                                stack.push((v, 0));
                            }
                            Mark::Open => {
                                log::debug!("found back edge {u:?} -> {v:?}");
                                return Err(Error::ContainsCycle { from: u, to: v });
                            }
                            Mark::Done => {}
                        }
                    }
                    None => {
                        marks[idx(u)] = Mark::Done;
                        finished.push(u);
                    }
                }
            }
        }

        finished.reverse();
        Ok(finished)
    }

    /// True if there is a path (of length zero or more) from `from` to `to`.
    pub fn reaches(&self, from: V, to: V) -> bool {
        if !self.has_vertex(from) || !self.has_vertex(to) {
            return false;
        }
        if from == to {
            return true;
        }
        let mut found = false;
        self.bfs(from, |g, v| g.edges_from(v), |v| {
            found |= v == to;
            !found
        });
        found
    }

    /// Every vertex with a path to `v`, nearest first, not including `v` itself.
    pub fn ancestors(&self, v: V) -> Vec<V> {
        let mut result = Vec::new();
        self.bfs(v, |g, u| g.edges_to(u), |u| {
            result.push(u);
            true
        });
        result
    }

    /// Every vertex reachable from `v`, nearest first, not including `v` itself.
    pub fn descendants(&self, v: V) -> Vec<V> {
        let mut result = Vec::new();
        self.bfs(v, |g, u| g.edges_from(u), |u| {
            result.push(u);
            true
        });
        result
    }

    /// Breadth-first search from `start` following `neighbors`;
    /// `visit` is called once per newly-reached vertex and stops the search by returning false.
    fn bfs<'a, N, F>(&'a self, start: V, neighbors: N, mut visit: F)
    where
        N: Fn(&'a Self, V) -> &'a [V],
        F: FnMut(V) -> bool,
    {
        if !self.has_vertex(start) {
            return;
        }
        let mut seen = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::with_capacity(QUEUE_CAPACITY);
        seen[idx(start)] = true;
        queue.push_back(start);

        while let Some(u) = queue.pop_front() {
            for &v in neighbors(self, u) {
                if seen[idx(v)] {
                    continue;
                }
                seen[idx(v)] = true;
                if !visit(v) {
                    return;
                }
                queue.push_back(v);
            }
        }
    }
}
