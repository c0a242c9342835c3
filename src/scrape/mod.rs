// src/scrape/mod.rs
mod scrape;

pub use scrape::{Ingestion, run};
