//! Mirror layout module
//!
//! This module owns everything about the on-disk shape of a mirror:
//! - Deterministic URL to local-path mapping
//! - The shared store of captured resources
//! - Rewriting page markup to reference captured resources relatively

mod paths;
mod rewrite;
mod store;

pub use paths::{PathMapper, ResourceClass};
pub use rewrite::{relative_path, rewrite_page};
pub use store::{ResourceRecord, ResourceStore};
