//! # Trellis Core Graph Engine
//!
//! A small directed graph over opaque, hashable vertex identities. The module
//! registry builds one of these from declared module dependencies and relies on
//! it for cycle detection and ordering.
//!
//! - **[`directed`]**: [`DirectedGraph`], the adjacency-list graph with
//!   topological ordering and degree queries.
//! - **[`error`]**: [`GraphError`], returned when no topological order exists.
pub mod directed;
pub mod error;

pub use directed::DirectedGraph;
pub use error::GraphError;
