// src/scrape/scrape.rs
//! One ingestion cycle: build the source for a resource, get its standings,
//! post-process, check the contract.

use crate::{
    config::options::AppOptions,
    core::net::Fetcher,
    progress::Progress,
    standings::{
        ranking, Contest, SourceRegistry, Standings, StandingsError,
    },
};

/// Inputs of one cycle.
pub struct Ingestion<'a> {
    pub resource: &'a str,
    pub contest: Contest,
    /// Restrict the result to these members.
    pub users: Option<&'a [String]>,
}

const STAGES: usize = 3;

pub fn run(
    registry: &SourceRegistry,
    job: Ingestion<'_>,
    fetcher: Box<dyn Fetcher>,
    opts: &AppOptions,
    mut progress: Option<&mut (dyn Progress + '_)>,
) -> Result<Standings, StandingsError> {
    let key = job.contest.key.clone();
    if let Some(p) = progress.as_deref_mut() {
        p.begin(STAGES);
        p.log(&format!("Fetching {} standings for {}…", job.resource, key));
    }

    let result = ingest(registry, job, fetcher, opts, progress.as_deref_mut());

    if let Err(e) = &result {
        if e.is_retryable() {
            logw!("Scrape: {} failed, retry next cycle: {}", key, e);
        } else {
            loge!("Scrape: {} failed permanently: {}", key, e);
        }
    }
    if let Some(p) = progress.as_deref_mut() {
        p.finish();
    }
    result
}

fn ingest(
    registry: &SourceRegistry,
    job: Ingestion<'_>,
    fetcher: Box<dyn Fetcher>,
    opts: &AppOptions,
    mut progress: Option<&mut (dyn Progress + '_)>,
) -> Result<Standings, StandingsError> {
    let mut contest = job.contest;
    if contest.info("max_pages").is_none() {
        contest.info.insert(s!("max_pages"), opts.fetch.max_pages.to_string());
    }
    let mut source = registry.create(job.resource, contest, fetcher)?;
    let mut standings = source.get_standings(job.users)?;
    if let Some(p) = progress.as_deref_mut() {
        p.item_done(0);
        p.log(&format!("{} participants, {} problems", standings.result.len(), standings.problems.len()));
    }

    ranking::finalize(&mut standings, opts.medal_override(job.resource));
    if let Some(p) = progress.as_deref_mut() {
        p.item_done(1);
    }

    standings.validate()?;
    if let Some(p) = progress.as_deref_mut() {
        p.item_done(2);
    }
    Ok(standings)
}
