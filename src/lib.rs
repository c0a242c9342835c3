// src/lib.rs
//! Contest standings ingestion: per-site sources parse published results
//! tables into one canonical `Standings` shape, which is then ranked,
//! flagged and exported.

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod config;
pub mod core;
pub mod standings;
pub mod specs;

pub mod file;
pub mod progress;
pub mod scrape;

#[cfg(feature = "cli")]
pub mod cli;
