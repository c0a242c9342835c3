// src/standings/error.rs

use thiserror::Error;

use crate::core::{net::FetchError, table::TableError};

#[derive(Debug, Error)]
pub enum StandingsError {
    /// The source cannot start: no usable URL, bad configuration.
    #[error("cannot initialize source: {0}")]
    InitModule(String),
    /// Page fetched but not in the expected shape.
    #[error("cannot parse standings: {0}")]
    ParseStandings(String),
    /// Rows found but participant identities could not be resolved.
    #[error("cannot parse accounts: {0}")]
    ParseAccounts(String),
    /// Output breaks the standings contract.
    #[error("invalid standings: {0}")]
    Invalid(String),
    #[error("no source registered for resource {0:?}")]
    UnknownResource(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// What the scheduler should do after a failed cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Try again next cycle; the page may not be up yet.
    NextCycle,
    /// Needs a fix before retrying.
    Never,
}

impl StandingsError {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            StandingsError::Fetch(_)
            | StandingsError::ParseStandings(_)
            | StandingsError::ParseAccounts(_) => RetryPolicy::NextCycle,
            StandingsError::InitModule(_)
            | StandingsError::Invalid(_)
            | StandingsError::UnknownResource(_)
            | StandingsError::Table(_) => RetryPolicy::Never,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.retry_policy() == RetryPolicy::NextCycle
    }
}
