// src/standings/ranking.rs
//! Post-processing after a source returns: places, first-accepted flags and
//! the default medal split.

use std::{cmp::Ordering, collections::HashMap};

use crate::standings::{
    classify::{is_solved, is_upsolved},
    model::{MedalCounts, ParticipantRow, Place, RankOrder, Standings},
};

/// (solving, penalty) as the rank order sees it.
fn rank_key(order: RankOrder, row: &ParticipantRow) -> (f64, f64) {
    match order {
        RankOrder::SolvingOnly => (row.solving, 0.0),
        _ => (row.solving, row.penalty),
    }
}

fn compare(order: RankOrder, a: (f64, f64), b: (f64, f64)) -> Ordering {
    let by_solving = b.0.total_cmp(&a.0);
    match order {
        RankOrder::SolvingPenalty | RankOrder::SolvingOnly => by_solving.then(a.1.total_cmp(&b.1)),
        RankOrder::SolvingPenaltyDesc => by_solving.then(b.1.total_cmp(&a.1)),
    }
}

/// Sort rows by the standings' rank order and assign competition places
/// (1, 2, 2, 4). Input order breaks ties.
pub fn assign_places(st: &mut Standings) {
    let order = st.options.rank_order;
    st.result.sort_by(|_, a, _, b| compare(order, rank_key(order, a), rank_key(order, b)));

    let mut place = 0u32;
    let mut prev = None;
    for (i, row) in st.result.values_mut().enumerate() {
        let key = rank_key(order, row);
        if prev.is_none_or(|p| compare(order, p, key) != Ordering::Equal) {
            place = i as u32 + 1;
        }
        row.place = Some(Place::Rank(place));
        prev = Some(key);
    }
}

/// Recompute problem `first_ac` and the per-result flags.
///
/// A source's `first_ac` flag survives only on a solve at the problem's
/// final `first_ac` time. Exactly one result in the whole contest gets
/// `first_ac_of_all`: earliest time, then member, then problem short.
pub fn detect_first_ac(st: &mut Standings) {
    let mut best: HashMap<String, f64> = HashMap::new();
    for row in st.result.values() {
        for (short, r) in &row.problems {
            if !is_solved(r, false) {
                continue;
            }
            if let Some(t) = r.solve_seconds() {
                best.entry(short.clone()).and_modify(|m| *m = m.min(t)).or_insert(t);
            }
        }
    }

    for info in &mut st.problems {
        if let Some(&t) = best.get(&info.short) {
            info.first_ac = Some(info.first_ac.map_or(t, |prev| prev.min(t)));
        }
    }
    // flags are checked against the published minimum, which may be lower
    let best: HashMap<String, f64> =
        st.problems.iter().filter_map(|p| p.first_ac.map(|t| (p.short.clone(), t))).collect();

    let mut overall: Option<(f64, String, String)> = None;
    for row in st.result.values_mut() {
        let member = row.member().to_string();
        for (short, r) in row.problems.iter_mut() {
            r.first_ac_of_all = None;
            let at_min = is_solved(&*r, false)
                && r.solve_seconds().is_some_and(|t| best.get(short) == Some(&t));
            if !at_min {
                if r.first_ac.take().is_some() {
                    logd!("Ranking: dropping first_ac on {} {}: not the fastest solve", member, short);
                }
                continue;
            }
            if r.first_ac != Some(true) {
                continue;
            }
            let Some(t) = r.solve_seconds() else { continue };
            let candidate = (t, member.clone(), short.clone());
            let better = match &overall {
                None => true,
                Some(cur) => {
                    t.total_cmp(&cur.0).then_with(|| candidate.1.cmp(&cur.1)).then_with(|| candidate.2.cmp(&cur.2))
                        == Ordering::Less
                }
            };
            if better {
                overall = Some(candidate);
            }
        }
    }

    if let Some((_, member, short)) = overall {
        if let Some(r) = st.result.get_mut(&member).and_then(|row| row.problems.get_mut(&short)) {
            r.first_ac_of_all = Some(true);
        }
    }
}

/// Default medals: only when the source supplied no split and nothing is
/// hidden. Thresholds apply to numeric places of rows with a positive score.
/// Returns whether medals were assigned.
pub fn assign_default_medals(st: &mut Standings, counts: Option<MedalCounts>) -> bool {
    if st.options.medals.is_some() {
        logd!("Ranking: medal split supplied by the source");
        return false;
    }
    if st.has_hidden() {
        logd!("Ranking: hidden results present; no default medals");
        return false;
    }

    let counts = counts.unwrap_or_default();
    st.options.medals = Some(counts);
    for row in st.result.values_mut() {
        row.medal = match row.place.as_ref().and_then(Place::rank) {
            Some(rank) if row.solving > 0.0 => counts.medal_for(rank),
            _ => None,
        };
    }
    true
}

/// Fill `ParticipantRow::upsolving` from nested results for rows whose source
/// left it unset: problems solved only after the contest.
pub fn count_upsolving(st: &mut Standings) {
    for row in st.result.values_mut() {
        if row.upsolving.is_some() || row.problems.values().all(|p| p.upsolving.is_none()) {
            continue;
        }
        let n = row.problems.values().filter(|p| !is_solved(*p, false) && is_upsolved(*p)).count();
        row.upsolving = Some(n as f64);
    }
}

/// Full post-processing pass on a fresh `Standings`.
///
/// Published places are kept when every row has one (rows are re-sorted by
/// them); otherwise places are computed. Then problems are aligned, first
/// accepted flags recomputed and default medals applied.
pub fn finalize(st: &mut Standings, medal_override: Option<MedalCounts>) {
    let all_placed = !st.result.is_empty() && st.result.values().all(|r| r.place.is_some());
    if all_placed {
        st.result.sort_by_key(|_, r| r.place.as_ref().and_then(Place::rank).unwrap_or(u32::MAX));
    } else {
        assign_places(st);
    }
    st.align_problems();
    count_upsolving(st);
    detect_first_ac(st);
    let medals = assign_default_medals(st, medal_override);
    logf!(
        "Ranking: {} rows, {} problems{}",
        st.result.len(),
        st.problems.len(),
        if medals { ", default medals" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standings::model::{Medal, ProblemInfo, ProblemResult};

    fn row(member: &str, solving: f64, penalty: f64) -> ParticipantRow {
        let mut r = ParticipantRow::new(member);
        r.solving = solving;
        r.penalty = penalty;
        r
    }

    fn places(st: &Standings) -> Vec<(&str, u32)> {
        st.result
            .values()
            .map(|r| (r.member(), r.place.as_ref().and_then(Place::rank).unwrap_or(0)))
            .collect()
    }

    #[test]
    fn competition_ranking_with_ties() {
        let mut st = Standings::default();
        st.insert(row("c", 2.0, 50.0));
        st.insert(row("a", 3.0, 100.0));
        st.insert(row("b", 2.0, 50.0));
        st.insert(row("d", 1.0, 10.0));
        assign_places(&mut st);
        assert_eq!(places(&st), vec![("a", 1), ("c", 2), ("b", 2), ("d", 4)]);
    }

    #[test]
    fn equal_pairs_share_a_place() {
        let mut st = Standings::default();
        st.insert(row("p", 5.0, 10.0));
        st.insert(row("q", 5.0, 10.0));
        st.insert(row("r", 3.0, 20.0));
        assign_places(&mut st);
        assert_eq!(places(&st), vec![("p", 1), ("q", 1), ("r", 3)]);
    }

    #[test]
    fn fastest_of_three_is_first_ac() {
        let mut st = Standings::default();
        for (m, secs) in [("x", 10.0), ("y", 20.0), ("z", 5.0)] {
            let mut r = row(m, 1.0, 0.0);
            r.problems.insert(
                s!("A"),
                ProblemResult { first_ac: Some(true), ..ProblemResult::from("+").with_seconds(secs) },
            );
            st.insert(r);
        }
        st.align_problems();
        detect_first_ac(&mut st);
        assert_eq!(st.problems[0].first_ac, Some(5.0));
        let eligible: Vec<_> = st.result.values().filter(|r| r.problems["A"].first_ac == Some(true)).map(|r| r.member()).collect();
        assert_eq!(eligible, ["z"]);
    }

    #[test]
    fn solving_only_ignores_penalty() {
        let mut st = Standings::default();
        st.options.rank_order = RankOrder::SolvingOnly;
        st.insert(row("x", 2.0, 900.0));
        st.insert(row("y", 2.0, 10.0));
        assign_places(&mut st);
        assert_eq!(places(&st), vec![("x", 1), ("y", 1)]);
    }

    #[test]
    fn first_ac_flags_are_checked_against_the_minimum() {
        let mut st = Standings::default();
        st.add_problem(ProblemInfo::new("A"));

        let mut fast = row("fast", 1.0, 0.0);
        fast.problems.insert(s!("A"), ProblemResult::from("+").with_time("0:10"));
        let mut liar = row("liar", 1.0, 0.0);
        liar.problems.insert(s!("A"), ProblemResult { first_ac: Some(true), ..ProblemResult::from("+").with_time("0:30") });
        st.insert(fast);
        st.insert(liar);

        detect_first_ac(&mut st);
        assert_eq!(st.problems[0].first_ac, Some(10.0));
        assert_eq!(st.result["liar"].problems["A"].first_ac, None);
        // the fast solve was never flagged by the source
        assert_eq!(st.result["fast"].problems["A"].first_ac_of_all, None);
    }

    #[test]
    fn flags_agree_with_a_published_first_ac() {
        let mut st = Standings::default();
        st.add_problem(ProblemInfo { first_ac: Some(3.0), ..ProblemInfo::new("A") });

        let mut late = row("late", 1.0, 0.0);
        late.problems.insert(s!("A"), ProblemResult { first_ac: Some(true), ..ProblemResult::from("+").with_seconds(5.0) });
        st.insert(late);

        detect_first_ac(&mut st);
        assert_eq!(st.problems[0].first_ac, Some(3.0));
        assert_eq!(st.result["late"].problems["A"].first_ac, None);
        assert_eq!(st.result["late"].problems["A"].first_ac_of_all, None);
    }

    #[test]
    fn exactly_one_first_ac_of_all() {
        let mut st = Standings::default();
        for (m, short, t) in [("b", "A", "0:20"), ("a", "B", "0:20"), ("c", "C", "0:40")] {
            let mut r = row(m, 1.0, 0.0);
            r.problems.insert(s!(short), ProblemResult { first_ac: Some(true), ..ProblemResult::from("+").with_time(t) });
            st.insert(r);
        }
        st.align_problems();
        detect_first_ac(&mut st);

        let flagged: Vec<_> = st
            .result
            .values()
            .flat_map(|r| r.problems.iter().map(move |(k, p)| (r.member(), k.as_str(), p.first_ac_of_all)))
            .filter(|(_, _, f)| *f == Some(true))
            .collect();
        assert_eq!(flagged, vec![("a", "B", Some(true))]);
    }

    #[test]
    fn default_medals_need_a_score_and_no_hidden_results() {
        let mut st = Standings::default();
        for i in 0..14 {
            st.insert(row(&format!("t{i:02}"), (20 - i) as f64, 0.0));
        }
        st.insert(row("zero", 0.0, 0.0));
        assign_places(&mut st);
        assert!(assign_default_medals(&mut st, None));
        assert_eq!(st.result["t00"].medal, Some(Medal::Gold));
        assert_eq!(st.result["t04"].medal, Some(Medal::Silver));
        assert_eq!(st.result["t11"].medal, Some(Medal::Bronze));
        assert_eq!(st.result["t12"].medal, None);
        assert_eq!(st.result["zero"].medal, None);

        let mut frozen = Standings::default();
        let mut r = row("f", 1.0, 0.0);
        r.problems.insert(s!("A"), ProblemResult::from("?1"));
        frozen.insert(r);
        assign_places(&mut frozen);
        assert!(!assign_default_medals(&mut frozen, None));
        assert_eq!(frozen.options.medals, None);
    }

    #[test]
    fn supplied_medals_are_left_alone() {
        let mut st = Standings::default();
        st.options.medals = Some(MedalCounts { gold: 1, silver: 0, bronze: 0 });
        st.insert(row("a", 1.0, 0.0));
        assign_places(&mut st);
        assert!(!assign_default_medals(&mut st, Some(MedalCounts { gold: 9, silver: 9, bronze: 9 })));
        assert_eq!(st.result["a"].medal, None);
    }

    #[test]
    fn upsolving_counts_only_late_solves() {
        let mut st = Standings::default();
        let mut r = row("u", 1.0, 0.0);
        r.problems.insert(s!("A"), ProblemResult { upsolving: Some(Box::new(ProblemResult::from("+"))), ..ProblemResult::from("-2") });
        r.problems.insert(s!("B"), ProblemResult { upsolving: Some(Box::new(ProblemResult::from("+"))), ..ProblemResult::from("+") });
        st.insert(r);
        st.insert(row("plain", 0.0, 0.0));
        count_upsolving(&mut st);
        assert_eq!(st.result["u"].upsolving, Some(1.0));
        assert_eq!(st.result["plain"].upsolving, None);
    }

    #[test]
    fn finalize_keeps_published_places() {
        let mut st = Standings::default();
        let mut b = row("b", 1.0, 0.0);
        b.place = Some(Place::Rank(2));
        let mut a = row("a", 1.0, 0.0);
        a.place = Some(Place::Rank(1));
        a.problems.insert(s!("Z"), ProblemResult::from("+").with_time("5"));
        st.insert(b);
        st.insert(a);

        finalize(&mut st, Some(MedalCounts { gold: 1, silver: 1, bronze: 0 }));
        assert_eq!(places(&st), vec![("a", 1), ("b", 2)]);
        assert_eq!(st.problems[0].short, "Z");
        assert_eq!(st.problems[0].first_ac, Some(300.0));
        assert_eq!(st.result["a"].medal, Some(Medal::Gold));
        assert_eq!(st.result["b"].medal, Some(Medal::Silver));
        assert!(st.validate().is_ok());
    }
}
