// src/standings/mod.rs
pub mod classify;
pub mod error;
pub mod model;
pub mod ranking;
pub mod source;

pub use error::{RetryPolicy, StandingsError};
pub use model::{
    Medal, MedalCounts, ParticipantRow, Place, ProblemInfo, ProblemResult, RankOrder, Standings,
    StandingsOptions, Verdict, member_key,
};
pub use source::{Contest, SourceFactory, SourceRegistry, StandingsSource};
