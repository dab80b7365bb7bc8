use std::fmt;
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};

use crate::graph::error::GraphError;

/// Directed graph stored as an adjacency list.
///
/// Vertices and each vertex's neighbour set keep their insertion order, so every
/// query and ordering below is deterministic for a given sequence of calls.
#[derive(Debug, Clone)]
pub struct DirectedGraph<T> {
    /// vertex -> outbound neighbours
    neighbors: IndexMap<T, IndexSet<T>>,
}

impl<T> Default for DirectedGraph<T> {
    fn default() -> Self {
        Self {
            neighbors: IndexMap::new(),
        }
    }
}

impl<T> DirectedGraph<T>
where
    T: Clone + Eq + Hash + fmt::Debug,
{
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. Adding an existing vertex leaves the graph unchanged.
    pub fn add_vertex(&mut self, vertex: T) {
        self.neighbors.entry(vertex).or_default();
    }

    /// Add the edge `from -> to`, inserting either vertex if it is missing.
    pub fn add_edge(&mut self, from: T, to: T) {
        self.neighbors.entry(from).or_default().insert(to.clone());
        self.add_vertex(to);
    }

    /// Remove the edge `from -> to`. Returns whether the edge existed.
    pub fn remove_edge(&mut self, from: &T, to: &T) -> bool {
        self.neighbors
            .get_mut(from)
            .map(|targets| targets.shift_remove(to))
            .unwrap_or(false)
    }

    /// Remove a vertex together with every edge that starts or ends at it.
    /// Returns whether the vertex existed.
    pub fn remove_vertex(&mut self, vertex: &T) -> bool {
        if self.neighbors.shift_remove(vertex).is_none() {
            return false;
        }
        for targets in self.neighbors.values_mut() {
            targets.shift_remove(vertex);
        }
        true
    }

    pub fn contains_vertex(&self, vertex: &T) -> bool {
        self.neighbors.contains_key(vertex)
    }

    /// Outbound neighbours of `vertex`, or `None` if the vertex is unknown.
    pub fn neighbors(&self, vertex: &T) -> Option<impl Iterator<Item = &T>> {
        self.neighbors.get(vertex).map(|targets| targets.iter())
    }

    /// All vertices in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = &T> {
        self.neighbors.keys()
    }

    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Number of edges ending at each vertex. Every vertex is present, isolated
    /// ones with a count of zero.
    pub fn in_degree(&self) -> IndexMap<T, usize> {
        let mut degree: IndexMap<T, usize> = self
            .neighbors
            .keys()
            .map(|vertex| (vertex.clone(), 0))
            .collect();
        for targets in self.neighbors.values() {
            for target in targets {
                if let Some(count) = degree.get_mut(target) {
                    *count += 1;
                }
            }
        }
        degree
    }

    /// Number of edges starting at each vertex.
    pub fn out_degree(&self) -> IndexMap<T, usize> {
        self.neighbors
            .iter()
            .map(|(vertex, targets)| (vertex.clone(), targets.len()))
            .collect()
    }

    /// Order the vertices so that for every edge `u -> v`, `u` comes first.
    ///
    /// Kahn's algorithm. Vertices with no incoming edges are pushed onto a stack
    /// in insertion order and the most recently pushed one is placed next; a
    /// neighbour whose in-degree drops to zero is pushed as soon as that happens.
    /// For the edges `A->B, B->C, B->F, D->E, F->G` this yields
    /// `[D, E, A, B, F, G, C]`.
    pub fn topological_sort(&self) -> Result<Vec<T>, GraphError<T>> {
        let mut degree = self.in_degree();
        let mut candidates: Vec<T> = degree
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(vertex, _)| vertex.clone())
            .collect();

        let mut sorted = Vec::with_capacity(self.neighbors.len());
        while let Some(vertex) = candidates.pop() {
            if let Some(targets) = self.neighbors.get(&vertex) {
                for target in targets {
                    if let Some(count) = degree.get_mut(target) {
                        *count -= 1;
                        if *count == 0 {
                            candidates.push(target.clone());
                        }
                    }
                }
            }
            sorted.push(vertex);
        }

        if sorted.len() == self.neighbors.len() {
            Ok(sorted)
        } else {
            let unresolved = degree
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .map(|(vertex, _)| vertex)
                .collect();
            Err(GraphError::Cycle { unresolved })
        }
    }

    /// Order the vertices so that for every edge `u -> v`, `v` comes first.
    ///
    /// This is the mirror image of [`topological_sort`](Self::topological_sort)
    /// under the same candidate convention, so both orders agree on how ties
    /// between independent vertices are broken.
    pub fn reverse_topological_sort(&self) -> Result<Vec<T>, GraphError<T>> {
        let mut sorted = self.topological_sort()?;
        sorted.reverse();
        Ok(sorted)
    }

    /// Whether the graph contains at least one cycle (self-loops included).
    pub fn has_cycle(&self) -> bool {
        self.topological_sort().is_err()
    }
}
