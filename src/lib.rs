//! Retrieval-augmented answers for IT-helpdesk issues.
//!
//! Issue/resolution pairs are embedded into a vector index; questions are
//! answered by retrieving the nearest stored cases and handing them to a
//! language model as the only permitted context.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
