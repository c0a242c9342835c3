// src/specs/mod.rs
//! Per-site standings sources.
//!
//! Each source knows where a site publishes its standings and how to read
//! that page into the canonical `Standings`. Sources only extract and merge
//! their own pages; ranking, first-accepted detection and medals happen
//! afterwards in `standings::ranking`.
//!
//! Sources are testable offline through `core::net::StaticFetcher`.
pub mod html_table;

use crate::standings::source::SourceRegistry;

/// Registry with every built-in source.
pub fn registry() -> SourceRegistry {
    let mut reg = SourceRegistry::new();
    reg.register(html_table::RESOURCE, html_table::create);
    reg
}
