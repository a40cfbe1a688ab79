//! Common utilities for the broth crates.
//!
//! This crate provides shared infrastructure used by the tree and parser crates:
//! - **Warning System** - deduplicated warnings routed through `tracing`
//! - **URL Resolution** - resolving attribute values against a base URI

pub mod url;
pub mod warning;
