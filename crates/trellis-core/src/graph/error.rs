//! # Trellis Core Graph Errors
//!
//! Defines [`GraphError`], the error produced by graph ordering operations.
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError<T: fmt::Debug> {
    /// Ordering could not place every vertex. `unresolved` holds the vertices
    /// that still had incoming edges once no more candidates were left, i.e.
    /// the vertices on a cycle and everything reachable from one.
    #[error("Graph contains a cycle; unresolved vertices: {unresolved:?}")]
    Cycle { unresolved: Vec<T> },
}
