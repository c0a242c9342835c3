// src/standings/classify.rs
//! Verdict classification over `ProblemResult`s. Pure functions; an absent
//! result is "nothing", never an error.
//!
//! Every classifier takes `impl Into<Option<&ProblemResult>>` so both a
//! result reference and an optional nested `upsolving` can be passed in.

use crate::standings::model::{ProblemResult, Verdict};

/// Accepted. Order: upsolving (when asked), then `partial`, then `binary`,
/// then the result marker.
pub fn is_solved<'a>(value: impl Into<Option<&'a ProblemResult>>, with_upsolving: bool) -> bool {
    let Some(v) = value.into() else { return false };
    if with_upsolving && is_solved(v.upsolving.as_deref(), false) {
        return true;
    }
    if v.partial == Some(true) {
        return false;
    }
    if let Some(b) = v.binary {
        return b;
    }
    match &v.result {
        Some(Verdict::Solved { .. }) => true,
        Some(Verdict::Score(x)) => *x > 0.0,
        _ => false,
    }
}

/// Definitely rejected. An explicit `binary` decides outright, ahead of
/// `partial`, so a result is never both solved and rejected.
pub fn is_reject<'a>(value: impl Into<Option<&'a ProblemResult>>, with_upsolving: bool) -> bool {
    let Some(v) = value.into() else { return false };
    if with_upsolving && is_solved(v.upsolving.as_deref(), false) {
        return false;
    }
    if let Some(b) = v.binary {
        return !b;
    }
    if v.partial == Some(true) {
        return false;
    }
    match &v.result {
        Some(Verdict::Rejected { .. }) => true,
        Some(Verdict::Score(x)) => *x <= 0.0,
        _ => false,
    }
}

/// Submitted during a freeze, outcome unknown.
pub fn is_hidden<'a>(value: impl Into<Option<&'a ProblemResult>>, with_upsolving: bool) -> bool {
    let Some(v) = value.into() else { return false };
    if with_upsolving && is_upsolved(v) {
        return false;
    }
    matches!(v.result, Some(Verdict::Hidden { .. }))
}

/// Partial credit, not a full solve.
pub fn is_partial<'a>(value: impl Into<Option<&'a ProblemResult>>, with_upsolving: bool) -> bool {
    let Some(v) = value.into() else { return false };
    if is_solved(v, with_upsolving) {
        return false;
    }
    v.partial == Some(true) || (with_upsolving && is_partial(v.upsolving.as_deref(), false))
}

/// The nested upsolving result is accepted.
pub fn is_upsolved<'a>(value: impl Into<Option<&'a ProblemResult>>) -> bool {
    value.into().is_some_and(|v| is_solved(v.upsolving.as_deref(), false))
}

/// Result marker reduced to what the comparison cares about.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Marker {
    Num(f64),
    Sign,
    Nothing,
}

fn marker(v: &ProblemResult) -> Marker {
    match &v.result {
        Some(Verdict::Score(x)) => Marker::Num(*x),
        Some(Verdict::Solved { .. } | Verdict::Rejected { .. }) => Marker::Sign,
        _ => Marker::Nothing,
    }
}

/// Whether `curr` should replace `prev` for the same (member, problem).
///
/// 1. solved beats unsolved
/// 2. among unsolved, upsolved beats not upsolved
/// 3. lower `priority` wins, when both carry one
/// 4. higher numeric result wins; a number beats no result
/// 5. larger `id`, then larger `submission_time`, when both carry one
///
/// Equal on everything returns `false`: the incumbent stays.
pub fn is_improved_solution(curr: &ProblemResult, prev: &ProblemResult) -> bool {
    let (cs, ps) = (is_solved(curr, false), is_solved(prev, false));
    if cs != ps {
        return cs;
    }
    if !cs {
        let (cu, pu) = (is_upsolved(curr), is_upsolved(prev));
        if cu != pu {
            return cu;
        }
    }

    if let (Some(c), Some(p)) = (curr.priority, prev.priority) {
        if c != p {
            return c < p;
        }
    }

    match (marker(curr), marker(prev)) {
        (Marker::Num(c), Marker::Num(p)) if c != p => return c > p,
        (Marker::Num(_), Marker::Nothing) => return true,
        (Marker::Nothing, Marker::Num(_)) => return false,
        _ => {}
    }

    if let (Some(c), Some(p)) = (curr.id, prev.id) {
        return c > p;
    }
    if let (Some(c), Some(p)) = (curr.submission_time, prev.submission_time) {
        return c > p;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(s: &str) -> ProblemResult { ProblemResult::from(s) }

    #[test]
    fn solved_markers() {
        assert!(is_solved(&r("+"), false));
        assert!(is_solved(&r("+2"), false));
        assert!(is_solved(&ProblemResult::from(0.5), false));
        assert!(!is_solved(&ProblemResult::from(0.0), false));
        assert!(!is_solved(&r("-3"), false));
        assert!(!is_solved(&r("?"), false));
        assert!(!is_solved(None::<&ProblemResult>, false));

        let bare_reject = ProblemResult { binary: Some(false), ..Default::default() };
        assert!(!is_solved(&bare_reject, false));
        assert!(is_reject(&bare_reject, false));
    }

    #[test]
    fn partial_flag_vetoes_positive_score() {
        let v = ProblemResult { partial: Some(true), ..ProblemResult::from(40.0) };
        assert!(!is_solved(&v, false));
        assert!(is_partial(&v, false));
        assert!(!is_reject(&v, false));
    }

    #[test]
    fn binary_overrides() {
        let acc = ProblemResult { binary: Some(true), ..ProblemResult::from(0.0) };
        assert!(is_solved(&acc, false));
        assert!(!is_reject(&acc, false));

        let accepted_over_minus = ProblemResult { binary: Some(true), ..r("-1") };
        assert!(is_solved(&accepted_over_minus, false));
        assert!(!is_reject(&accepted_over_minus, false));

        let refused_plus = ProblemResult { binary: Some(false), ..r("+") };
        assert!(!is_solved(&refused_plus, false));
        assert!(is_reject(&refused_plus, false));

        let rej = ProblemResult { binary: Some(false), partial: Some(true), ..ProblemResult::from(40.0) };
        assert!(is_reject(&rej, false));
    }

    #[test]
    fn reject_markers() {
        assert!(is_reject(&r("-"), false));
        assert!(is_reject(&ProblemResult::from(0.0), false));
        assert!(!is_reject(&r("+"), false));
        assert!(!is_reject(&r("?1"), false));
        assert!(!is_reject(&r(""), false));
    }

    #[test]
    fn upsolving_is_consulted_only_on_request() {
        let v = ProblemResult { upsolving: Some(Box::new(r("+"))), ..r("-1") };
        assert!(!is_solved(&v, false));
        assert!(is_solved(&v, true));
        assert!(is_upsolved(&v));
        assert!(is_reject(&v, false));
        assert!(!is_reject(&v, true));

        let frozen = ProblemResult { upsolving: Some(Box::new(r("+1"))), ..r("?2") };
        assert!(is_hidden(&frozen, false));
        assert!(!is_hidden(&frozen, true));

        let half = ProblemResult {
            upsolving: Some(Box::new(ProblemResult { partial: Some(true), ..ProblemResult::from(30.0) })),
            ..r("-")
        };
        assert!(!is_partial(&half, false));
        assert!(is_partial(&half, true));
    }

    #[test]
    fn improvement_prefers_solved_then_upsolved() {
        assert!(is_improved_solution(&r("+"), &r("-5")));
        assert!(!is_improved_solution(&r("-5"), &r("+")));

        let up = ProblemResult { upsolving: Some(Box::new(r("+"))), ..r("-1") };
        assert!(is_improved_solution(&up, &r("-1")));
        assert!(!is_improved_solution(&r("-1"), &up));
    }

    #[test]
    fn improvement_priority_then_score() {
        let low = ProblemResult { priority: Some(1), ..ProblemResult::from(10.0) };
        let high = ProblemResult { priority: Some(2), ..ProblemResult::from(90.0) };
        assert!(is_improved_solution(&low, &high));
        assert!(!is_improved_solution(&high, &low));

        // one-sided priority falls through to the score
        let only = ProblemResult { priority: Some(1), ..ProblemResult::from(10.0) };
        assert!(is_improved_solution(&ProblemResult::from(90.0), &only));

        assert!(is_improved_solution(&ProblemResult::from(0.0), &r("")));
        assert!(!is_improved_solution(&r("?"), &ProblemResult::from(0.0)));
    }

    #[test]
    fn improvement_tiebreaks_and_incumbent() {
        let a = ProblemResult { id: Some(10), ..r("+") };
        let b = ProblemResult { id: Some(11), ..r("+") };
        assert!(is_improved_solution(&b, &a));
        assert!(!is_improved_solution(&a, &b));

        let early = ProblemResult { submission_time: Some(100), ..r("-1") };
        let late = ProblemResult { submission_time: Some(200), ..r("-1") };
        assert!(is_improved_solution(&late, &early));

        assert!(!is_improved_solution(&r("+"), &r("+")));
    }
}
