// Cascade reconstruction: records in, immutable propagation graph out.

pub mod builder;
pub mod error;
pub mod graph;
pub mod models;

pub use builder::{build, build_with_unit};
pub use error::CascadeError;
pub use graph::CascadeGraph;
pub use models::{Edge, Node, PostRecord};
