//! Analysis modules.
//!
//! Aggregation of classified documents and parsing of page references.

pub mod aggregator;
pub mod references;

pub use aggregator::*;
pub use references::extract_ids_from_references;
