// src/standings/source.rs
//! The seam between the engine and per-site parsers.
//!
//! A source is built from a `Contest` and a fetch collaborator, then asked for
//! one `Standings`. Sources are looked up by resource name in a
//! `SourceRegistry`; adding a site means registering one more factory.

use std::collections::{BTreeMap, btree_map::Entry};

use serde::{Deserialize, Serialize};

use crate::core::net::Fetcher;
use crate::standings::{error::StandingsError, model::Standings};

/// Contest descriptor handed to a source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contest {
    pub key: String,
    pub title: String,
    pub url: String,
    pub standings_url: Option<String>,
    /// Suffix that keeps member keys of different editions apart.
    pub season: Option<String>,
    /// Free-form per-contest source settings.
    pub info: BTreeMap<String, String>,
}

impl Contest {
    pub fn info(&self, key: &str) -> Option<&str> {
        self.info.get(key).map(String::as_str).map(str::trim).filter(|v| !v.is_empty())
    }
}

pub trait StandingsSource {
    /// Fetch and parse the complete standings. With `users`, only those
    /// members are returned. Fails rather than returning a partial result.
    fn get_standings(&mut self, users: Option<&[String]>) -> Result<Standings, StandingsError>;
}

pub type SourceFactory =
    fn(Contest, Box<dyn Fetcher>) -> Result<Box<dyn StandingsSource>, StandingsError>;

#[derive(Default)]
pub struct SourceRegistry {
    factories: BTreeMap<String, SourceFactory>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `resource`. A second registration for the
    /// same resource is ignored and reported as `false`.
    pub fn register(&mut self, resource: &str, factory: SourceFactory) -> bool {
        match self.factories.entry(resource.to_string()) {
            Entry::Vacant(e) => {
                e.insert(factory);
                true
            }
            Entry::Occupied(_) => {
                logw!("Registry: {} already registered; keeping the first", resource);
                false
            }
        }
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.factories.contains_key(resource)
    }

    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(
        &self,
        resource: &str,
        contest: Contest,
        fetcher: Box<dyn Fetcher>,
    ) -> Result<Box<dyn StandingsSource>, StandingsError> {
        let factory = self
            .factories
            .get(resource)
            .ok_or_else(|| StandingsError::UnknownResource(resource.to_string()))?;
        logd!("Registry: creating {} source for {}", resource, contest.key);
        factory(contest, fetcher)
    }
}
