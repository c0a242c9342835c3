// src/standings/model.rs
//! Canonical standings schema every source produces.
//!
//! One `Standings` per ingestion cycle: rows keyed by member (unique), the
//! problem list every per-row `problems` map refers to, and a few options the
//! post-processing stage reads (medal split, rank ordering).

use std::{collections::{BTreeMap, BTreeSet}, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::consts::DEFAULT_MEDALS;
use crate::core::sanitize::{fmt_number, parse_number, parse_time_seconds};
use crate::standings::{classify, error::StandingsError};

/* ---------------- verdicts ---------------- */

/// The `result` marker of one problem cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Verdict {
    /// `+`, `+N` (N extra attempts)
    Solved { attempts: u32 },
    /// `-N`
    Rejected { attempts: u32 },
    /// `?`, `?N`: submissions during a freeze
    Hidden { attempts: u32 },
    /// Numeric score (partial-credit contests)
    Score(f64),
    /// Cell present, nothing submitted
    Pending,
    /// Unrecognized marker, kept verbatim
    Other(String),
}

impl Verdict {
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        let attempts = |rest: &str| rest.trim().parse::<u32>().unwrap_or(0);

        if t.is_empty() {
            Verdict::Pending
        } else if let Some(rest) = t.strip_prefix('+') {
            Verdict::Solved { attempts: attempts(rest) }
        } else if let Some(rest) = t.strip_prefix('-') {
            Verdict::Rejected { attempts: attempts(rest) }
        } else if let Some(rest) = t.strip_prefix('?') {
            Verdict::Hidden { attempts: attempts(rest) }
        } else if let Some(v) = parse_number(t) {
            Verdict::Score(v)
        } else {
            Verdict::Other(t.to_string())
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marked = |f: &mut fmt::Formatter<'_>, sign: char, n: u32| {
            if n == 0 { write!(f, "{sign}") } else { write!(f, "{sign}{n}") }
        };
        match self {
            Verdict::Solved { attempts } => marked(f, '+', *attempts),
            Verdict::Rejected { attempts } => marked(f, '-', *attempts),
            Verdict::Hidden { attempts } => marked(f, '?', *attempts),
            Verdict::Score(v) => f.write_str(&fmt_number(*v)),
            Verdict::Pending => Ok(()),
            Verdict::Other(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Verdict {
    fn from(s: &str) -> Self { Verdict::parse(s) }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Verdict::Score(v) => serializer.serialize_f64(*v),
            other => serializer.collect_str(other),
        }
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Num(f64),
            Text(String),
        }
        Ok(match Wire::deserialize(deserializer)? {
            Wire::Num(v) => Verdict::Score(v),
            Wire::Text(s) => Verdict::parse(&s),
        })
    }
}

/* ---------------- per-problem result ---------------- */

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Verdict>,
    /// Display form as the source printed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_ac: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_ac_of_all: Option<bool>,
    /// Tri-state override: partial credit regardless of the numeric result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<bool>,
    /// Tri-state override: accepted/rejected regardless of the numeric result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<bool>,
    /// Post-contest submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsolving: Option<Box<ProblemResult>>,
    /// Lower wins when the same problem is reported more than once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_time: Option<i64>,
}

impl ProblemResult {
    pub fn new(result: Verdict) -> Self {
        Self { result: Some(result), ..Default::default() }
    }

    /// Attach a display time; seconds are derived when the format is known.
    pub fn with_time(mut self, time: &str) -> Self {
        let time = time.trim().trim_start_matches('(').trim_end_matches(')').trim();
        if !time.is_empty() {
            self.time_in_seconds = parse_time_seconds(time);
            self.time = Some(time.to_string());
        }
        self
    }

    pub fn with_seconds(mut self, seconds: f64) -> Self {
        self.time_in_seconds = Some(seconds);
        self
    }

    /// Solve time in seconds: explicit value first, else parsed display time.
    pub fn solve_seconds(&self) -> Option<f64> {
        self.time_in_seconds
            .or_else(|| self.time.as_deref().and_then(parse_time_seconds))
    }
}

impl From<Verdict> for ProblemResult {
    fn from(v: Verdict) -> Self { Self::new(v) }
}

impl From<&str> for ProblemResult {
    fn from(s: &str) -> Self { Self::new(Verdict::parse(s)) }
}

impl From<f64> for ProblemResult {
    fn from(v: f64) -> Self { Self::new(Verdict::Score(v)) }
}

/* ---------------- problems ---------------- */

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemInfo {
    pub short: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Fastest accepted solve, seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_ac: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_score: Option<f64>,
}

impl ProblemInfo {
    pub fn new(short: impl Into<String>) -> Self {
        Self { short: short.into(), ..Default::default() }
    }
}

/* ---------------- participants ---------------- */

/// Rank as published: a number, or a label like `"1-3"` or `"DQ"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Place {
    Rank(u32),
    Label(String),
}

impl Place {
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim().trim_end_matches('.');
        if t.is_empty() {
            return None;
        }
        Some(match t.parse::<u32>() {
            Ok(n) => Place::Rank(n),
            Err(_) => Place::Label(t.to_string()),
        })
    }

    /// Numeric rank; a shared label like `"4-6"` ranks at its first value.
    pub fn rank(&self) -> Option<u32> {
        match self {
            Place::Rank(n) => Some(*n),
            Place::Label(s) => {
                let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn as_str(&self) -> &'static str {
        match self { Medal::Gold => "gold", Medal::Silver => "silver", Medal::Bronze => "bronze" }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedalCounts {
    pub gold: u32,
    pub silver: u32,
    pub bronze: u32,
}

impl Default for MedalCounts {
    fn default() -> Self {
        let (gold, silver, bronze) = DEFAULT_MEDALS;
        Self { gold, silver, bronze }
    }
}

impl MedalCounts {
    /// Medal for a 1-based rank, by cumulative thresholds.
    pub fn medal_for(&self, rank: u32) -> Option<Medal> {
        if rank == 0 {
            None
        } else if rank <= self.gold {
            Some(Medal::Gold)
        } else if rank <= self.gold + self.silver {
            Some(Medal::Silver)
        } else if rank <= self.gold + self.silver + self.bronze {
            Some(Medal::Bronze)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRow {
    member: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<Place>,
    #[serde(default)]
    pub solving: f64,
    #[serde(default)]
    pub penalty: f64,
    #[serde(default)]
    pub problems: BTreeMap<String, ProblemResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medal: Option<Medal>,
    /// Problems solved after the contest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsolving: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub info: BTreeMap<String, String>,
}

impl ParticipantRow {
    pub fn new(member: impl Into<String>) -> Self {
        Self { member: member.into(), ..Default::default() }
    }

    pub fn member(&self) -> &str { &self.member }
}

/// Member key from a source identity. A season suffix keeps editions of the
/// same team or handle apart.
pub fn member_key(identity: &str, season: Option<&str>) -> String {
    let identity = identity.trim();
    match season.map(str::trim).filter(|s| !s.is_empty()) {
        Some(season) => join!(identity, " ", season),
        None => s!(identity),
    }
}

/* ---------------- standings ---------------- */

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// solving desc, penalty asc
    #[default]
    SolvingPenalty,
    /// solving desc, penalty desc
    SolvingPenaltyDesc,
    SolvingOnly,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandingsOptions {
    /// Medal split supplied by the source; `None` lets the default kick in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medals: Option<MedalCounts>,
    pub rank_order: RankOrder,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Standings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub problems: Vec<ProblemInfo>,
    pub result: IndexMap<String, ParticipantRow>,
    pub options: StandingsOptions,
}

impl Standings {
    pub fn new(url: Option<String>) -> Self {
        Self { url, ..Default::default() }
    }

    pub fn is_empty(&self) -> bool { self.result.is_empty() }

    pub fn problem(&self, short: &str) -> Option<&ProblemInfo> {
        self.problems.iter().find(|p| p.short == short)
    }

    /// Add a problem unless its short is already listed. Missing name/url are
    /// filled in from later sightings.
    pub fn add_problem(&mut self, info: ProblemInfo) {
        match self.problems.iter_mut().find(|p| p.short == info.short) {
            Some(p) => {
                if p.name.is_none() { p.name = info.name; }
                if p.url.is_none() { p.url = info.url; }
                if p.full_score.is_none() { p.full_score = info.full_score; }
            }
            None => self.problems.push(info),
        }
    }

    /// Insert a row. A member seen before is merged: per-problem results keep
    /// the better of the two, scalar fields keep the first row's values.
    /// `solving` and `penalty` are not recomputed from the merged problems;
    /// a source that derives them from the cells recounts after merging.
    /// Returns `true` if the member is new.
    pub fn insert(&mut self, row: ParticipantRow) -> bool {
        match self.result.get_mut(&row.member) {
            Some(existing) => {
                merge_rows(existing, row);
                false
            }
            None => {
                self.result.insert(row.member.clone(), row);
                true
            }
        }
    }

    /// Keep only the listed members.
    pub fn retain_members(&mut self, members: &[String]) {
        let wanted: BTreeSet<&str> = members.iter().map(String::as_str).collect();
        self.result.retain(|k, _| wanted.contains(k.as_str()));
    }

    /// Any result still hidden (frozen) anywhere, upsolving included.
    pub fn has_hidden(&self) -> bool {
        self.result.values().flat_map(|r| r.problems.values()).any(|p| {
            classify::is_hidden(p, false) || classify::is_hidden(p.upsolving.as_deref(), false)
        })
    }

    /// Append a `ProblemInfo` for every short referenced by a row but not listed.
    pub fn align_problems(&mut self) {
        let missing: BTreeSet<String> = self
            .result
            .values()
            .flat_map(|r| r.problems.keys())
            .filter(|k| self.problem(k).is_none())
            .cloned()
            .collect();
        for short in missing {
            logd!("Standings: problem {} referenced but not listed; appending", short);
            self.problems.push(ProblemInfo::new(short));
        }
    }

    /// Contract checks: keys match members, shorts are listed once, every
    /// referenced short is listed.
    pub fn validate(&self) -> Result<(), StandingsError> {
        for (key, row) in &self.result {
            if key != &row.member {
                return Err(StandingsError::Invalid(format!("row keyed {key:?} has member {:?}", row.member)));
            }
        }
        let mut listed = BTreeSet::new();
        for p in &self.problems {
            if !listed.insert(p.short.as_str()) {
                return Err(StandingsError::Invalid(format!("problem {:?} listed twice", p.short)));
            }
        }
        for row in self.result.values() {
            if let Some(short) = row.problems.keys().find(|k| !listed.contains(k.as_str())) {
                return Err(StandingsError::Invalid(format!(
                    "member {:?} references unlisted problem {short:?}",
                    row.member
                )));
            }
        }
        Ok(())
    }
}

fn merge_rows(existing: &mut ParticipantRow, incoming: ParticipantRow) {
    for (short, candidate) in incoming.problems {
        match existing.problems.get_mut(&short) {
            Some(current) => {
                if classify::is_improved_solution(&candidate, current) {
                    *current = candidate;
                }
            }
            None => {
                existing.problems.insert(short, candidate);
            }
        }
    }
    if existing.place.is_none() { existing.place = incoming.place; }
    if existing.name.is_none() { existing.name = incoming.name; }
    if existing.country.is_none() { existing.country = incoming.country; }
    if existing.division.is_none() { existing.division = incoming.division; }
    for (k, v) in incoming.info {
        existing.info.entry(k).or_insert(v);
    }
}
