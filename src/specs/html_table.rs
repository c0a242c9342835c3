// src/specs/html_table.rs
//! Generic standings source for sites that publish a plain HTML results table.
//!
//! Column roles are recognized by header label:
//! - place: `#`, `rank`, `place`, `pos`
//! - member: `handle`, `user`, `login`, `participant`, `team`, `contestant`, `who`, `name`
//! - solving: `solved`, `score`, `=`, `points`, `pts`, `total`
//! - penalty: `penalty`, `time`, `pen`
//! - country: `country`, `flag`, `region`
//! - division: `division`, `div`
//!
//! Problem columns are the ones grouped under the problem header (`Problems`
//! unless configured) or, failing that, short labels of one to three letters
//! and digits. A problem cell reads `<verdict> [time]`, e.g. `+1 01:23`.
//!
//! Per-contest settings (`Contest::info`): `row_selector`, `next_selector`,
//! `problem_group`, `max_pages`.
//!
//! Pages are followed through the `next_selector` link until there is none,
//! a page repeats, or `max_pages` is exceeded (an error, never a partial
//! result).

use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::config::consts::{
    DEFAULT_NEXT_SELECTOR, DEFAULT_PROBLEM_GROUP, DEFAULT_ROW_SELECTOR, MAX_PAGES, STANDINGS_SUFFIX,
};
use crate::core::{
    html::{self, find_link},
    net::{self, Fetcher},
    sanitize::{parse_number, parse_time_seconds},
    table::{Cell, RawCell, TableOptions, TableParser, TableRow},
};
use crate::standings::{
    classify::is_solved,
    error::StandingsError,
    model::{ParticipantRow, Place, ProblemInfo, ProblemResult, Standings, Verdict, member_key},
    source::{Contest, StandingsSource},
};

pub const RESOURCE: &str = "html_table";

const PLACE: &[&str] = &["#", "rank", "place", "pos"];
const MEMBER: &[&str] = &["handle", "user", "login", "participant", "team", "contestant", "who", "name"];
const SOLVING: &[&str] = &["solved", "score", "=", "points", "pts", "total"];
const PENALTY: &[&str] = &["penalty", "time", "pen"];
const COUNTRY: &[&str] = &["country", "flag", "region"];
const DIVISION: &[&str] = &["division", "div"];

const SOLVED_CLASSES: &[&str] = &["accepted", "solved", "ok", "ac"];
const REJECTED_CLASSES: &[&str] = &["rejected", "failed", "wrong", "wa"];

pub fn create(contest: Contest, fetcher: Box<dyn Fetcher>) -> Result<Box<dyn StandingsSource>, StandingsError> {
    Ok(Box::new(HtmlTableSource::new(contest, fetcher)?))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Place,
    Member,
    Name,
    Solving,
    Penalty,
    Country,
    Division,
    Problem,
    Other,
}

pub struct HtmlTableSource {
    contest: Contest,
    fetcher: Box<dyn Fetcher>,
    candidates: Vec<String>,
    row_selector: String,
    next_selector: Selector,
    problem_group: String,
    max_pages: usize,
}

/// One parsed page.
struct Page {
    problems: Vec<ProblemInfo>,
    rows: Vec<ParticipantRow>,
    next: Option<String>,
    /// No solving column: `solving` was counted from the problem cells.
    counted: bool,
}

impl HtmlTableSource {
    pub fn new(contest: Contest, fetcher: Box<dyn Fetcher>) -> Result<Self, StandingsError> {
        let candidates = standings_urls(&contest);
        if candidates.is_empty() {
            return Err(StandingsError::InitModule(format!("contest {:?} has no standings url", contest.key)));
        }

        let row_selector = s!(contest.info("row_selector").unwrap_or(DEFAULT_ROW_SELECTOR));
        html::parse_selector(&row_selector).map_err(StandingsError::InitModule)?;
        let next_selector = html::parse_selector(contest.info("next_selector").unwrap_or(DEFAULT_NEXT_SELECTOR))
            .map_err(StandingsError::InitModule)?;
        let problem_group = s!(contest.info("problem_group").unwrap_or(DEFAULT_PROBLEM_GROUP));
        let max_pages = match contest.info("max_pages") {
            Some(v) => v
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| StandingsError::InitModule(format!("bad max_pages {v:?}")))?,
            None => MAX_PAGES,
        };

        Ok(Self { contest, fetcher, candidates, row_selector, next_selector, problem_group, max_pages })
    }

    fn parse_page(&self, body: &str) -> Result<Page, StandingsError> {
        let opts = TableOptions { as_list: true, ignore_display_none: true, strip_empty_columns: true, ..Default::default() };
        let parser = TableParser::new(body, &self.row_selector, opts)?;
        if parser.header().is_empty() {
            return Err(StandingsError::ParseStandings(format!("no table rows match {:?}", self.row_selector)));
        }

        let roles = self.column_roles(parser.header(), parser.header_cells());
        if !roles.contains(&Role::Member) {
            return Err(StandingsError::ParseAccounts(format!(
                "no participant column among {:?}",
                parser.header()
            )));
        }

        let problems: Vec<ProblemInfo> = parser
            .header()
            .iter()
            .zip(parser.header_cells())
            .zip(&roles)
            .filter(|(_, role)| **role == Role::Problem)
            .map(|((label, cell), _)| problem_info(label, cell))
            .collect();

        let mut rows = Vec::new();
        for row in parser {
            if let TableRow::Raw(raw) = &row {
                logd!("HtmlTable: skipping row of width {} ({:?})", raw.len(), raw.values());
                continue;
            }
            if let Some(r) = self.participant(&row, &roles) {
                rows.push(r);
            }
        }

        let counted = !roles.contains(&Role::Solving);
        let next = find_link(&Html::parse_document(body), &self.next_selector);
        Ok(Page { problems, rows, next, counted })
    }

    fn column_roles(&self, labels: &[String], cells: &[std::rc::Rc<RawCell>]) -> Vec<Role> {
        let mut roles: Vec<Role> = labels
            .iter()
            .zip(cells)
            .map(|(label, cell)| {
                let in_group = cell
                    .origin()
                    .is_some_and(|o| o.value().eq_ignore_ascii_case(&self.problem_group));
                if in_group { Role::Problem } else { role_of(label) }
            })
            .collect();

        // One member column: the highest-priority label wins, a later `name`
        // column becomes the display name.
        let lower: Vec<String> = labels.iter().map(|l| l.trim().to_ascii_lowercase()).collect();
        let member_at = MEMBER
            .iter()
            .find_map(|m| (0..lower.len()).find(|&i| lower[i] == *m && roles[i] == Role::Member));
        for (i, role) in roles.iter_mut().enumerate() {
            if *role == Role::Member && Some(i) != member_at {
                *role = if lower[i] == "name" { Role::Name } else { Role::Other };
            }
        }
        roles
    }

    fn participant(&self, row: &TableRow, roles: &[Role]) -> Option<ParticipantRow> {
        let pairs = row.pairs();
        let cell_for = |role: Role| {
            pairs.iter().zip(roles).find(|(_, r)| **r == role).map(|((_, c), _)| *c)
        };

        let member_cell = cell_for(Role::Member)?;
        let identity = member_cell.value();
        if identity.is_empty() {
            return None;
        }
        let mut out = ParticipantRow::new(member_key(identity, self.contest.season.as_deref()));
        if let Some(link) = member_cell.link() {
            out.info.insert(s!("profile_url"), s!(link));
        }

        out.place = cell_for(Role::Place).and_then(|c| Place::parse(c.value()));
        out.name = cell_for(Role::Name)
            .map(|c| s!(c.value()))
            .or_else(|| member_cell.title().map(str::to_string))
            .filter(|n| !n.is_empty() && n != identity);
        out.country = cell_for(Role::Country)
            .and_then(|c| if c.is_empty() { c.title().map(str::to_string) } else { Some(s!(c.value())) })
            .filter(|c| !c.is_empty());
        out.division = cell_for(Role::Division).map(|c| s!(c.value())).filter(|d| !d.is_empty());
        out.penalty = cell_for(Role::Penalty).and_then(|c| first_number(c.value())).unwrap_or(0.0);

        for ((label, cell), _) in pairs.iter().zip(roles).filter(|(_, r)| **r == Role::Problem) {
            if let Some(result) = problem_result(cell) {
                out.problems.insert(s!(*label), result);
            }
        }

        out.solving = match cell_for(Role::Solving).and_then(|c| first_number(c.value())) {
            Some(v) => v,
            None => out.problems.values().filter(|r| is_solved(*r, false)).count() as f64,
        };
        Some(out)
    }
}

impl StandingsSource for HtmlTableSource {
    fn get_standings(&mut self, users: Option<&[String]>) -> Result<Standings, StandingsError> {
        let (mut body, mut page_url) = net::get_first(self.fetcher.as_mut(), &self.candidates)?;
        logf!("HtmlTable: {} standings at {}", self.contest.key, page_url);

        let mut standings = Standings::new(Some(page_url.clone()));
        let mut visited = HashSet::from([page_url.clone()]);
        let mut pages = 0usize;
        let mut counted: HashSet<String> = HashSet::new();

        loop {
            pages += 1;
            let page = self.parse_page(&body)?;
            logd!("HtmlTable: page {} ({}): {} rows", pages, page_url, page.rows.len());

            for info in page.problems {
                standings.add_problem(info);
            }
            for row in page.rows {
                if page.counted {
                    counted.insert(s!(row.member()));
                }
                standings.insert(row);
            }

            let Some(href) = page.next else { break };
            let next_url = net::resolve_url(&page_url, &href)?;
            if !visited.insert(next_url.clone()) {
                logd!("HtmlTable: {} already visited; last page", next_url);
                break;
            }
            if pages >= self.max_pages {
                return Err(StandingsError::ParseStandings(format!(
                    "more than {} standings pages",
                    self.max_pages
                )));
            }

            body = self.fetcher.get(&next_url)?;
            page_url = s!(self.fetcher.last_url().unwrap_or(&next_url));
        }

        // merged rows may have gained solves on later pages
        for member in &counted {
            if let Some(row) = standings.result.get_mut(member) {
                row.solving = row.problems.values().filter(|r| is_solved(*r, false)).count() as f64;
            }
        }

        if standings.is_empty() {
            logw!("HtmlTable: {} has a standings table but no participants", self.contest.key);
        }
        if let Some(users) = users {
            standings.retain_members(users);
        }
        Ok(standings)
    }
}

/// Explicit standings URL first, then `<url>/standings`.
fn standings_urls(contest: &Contest) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(u) = contest.standings_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        out.push(s!(u));
    }
    let base = contest.url.trim().trim_end_matches('/');
    if !base.is_empty() {
        let derived = join!(base, STANDINGS_SUFFIX);
        if !out.contains(&derived) {
            out.push(derived);
        }
    }
    out
}

fn role_of(label: &str) -> Role {
    let l = label.trim().to_ascii_lowercase();
    let is = |set: &[&str]| set.contains(&l.as_str());
    if is(PLACE) {
        Role::Place
    } else if is(MEMBER) {
        Role::Member
    } else if is(SOLVING) {
        Role::Solving
    } else if is(PENALTY) {
        Role::Penalty
    } else if is(COUNTRY) {
        Role::Country
    } else if is(DIVISION) {
        Role::Division
    } else if (1..=3).contains(&l.chars().count()) && l.chars().all(|c| c.is_ascii_alphanumeric()) {
        Role::Problem
    } else {
        Role::Other
    }
}

fn problem_info(label: &str, header: &RawCell) -> ProblemInfo {
    let mut info = ProblemInfo::new(label);
    info.name = header.attr("title").map(str::trim).filter(|t| !t.is_empty()).map(str::to_string);
    info.url = header.links().first().cloned();
    info.full_score = header.attr("data-full-score").and_then(parse_number);
    info
}

/// First whitespace token as a number: `"7 (1234)"` → 7.
fn first_number(s: &str) -> Option<f64> {
    let tok = s.split_whitespace().next()?;
    parse_number(tok).or_else(|| parse_time_seconds(tok).filter(|_| tok.contains(':')))
}

/// `None` for an untouched cell.
fn problem_result(cell: &Cell) -> Option<ProblemResult> {
    let text = cell.value();
    let mut tokens = text.split_whitespace();
    let mut verdict = Verdict::parse(tokens.next()?);

    // Some sites print only the attempt count and mark the verdict by class.
    if let Verdict::Score(n) = verdict {
        let attempts = if n.fract() == 0.0 && n >= 0.0 { n as u32 } else { 0 };
        if SOLVED_CLASSES.iter().any(|c| cell.own_class(c)) {
            verdict = Verdict::Solved { attempts };
        } else if REJECTED_CLASSES.iter().any(|c| cell.own_class(c)) {
            verdict = Verdict::Rejected { attempts };
        }
    }

    let mut result = ProblemResult::new(verdict);
    if let Some(time) = tokens.next() {
        result = result.with_time(time);
    }
    if cell.is_first_solved() {
        result.first_ac = Some(true);
    }
    if cell.own_class("partial") {
        result.partial = Some(true);
    }
    Some(result)
}
