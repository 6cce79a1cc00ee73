//! Configuration module for Espejo
//!
//! Configuration comes from an optional TOML file plus command-line
//! overrides; every field has a default matching the original mirroring
//! behavior, so `espejo <url>` works with no file at all.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::MirrorConfig;
pub use validation::validate;
