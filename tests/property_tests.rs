// tests/property_tests.rs
// Property tests for classification and ranking.
// PROPTEST_CASES overrides the case count.

use proptest::prelude::*;

use standings_scrape::core::table::{TableOptions, TableParser, TableRow};
use standings_scrape::standings::classify::{
    is_hidden, is_improved_solution, is_partial, is_reject, is_solved, is_upsolved,
};
use standings_scrape::standings::ranking::{assign_places, detect_first_ac};
use standings_scrape::standings::{ParticipantRow, Place, ProblemResult, Standings, Verdict};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES").ok().and_then(|s| s.parse().ok()).unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

/* ---------------- generators ---------------- */

fn verdict() -> impl Strategy<Value = Verdict> {
    prop_oneof![
        (0u32..5).prop_map(|attempts| Verdict::Solved { attempts }),
        (0u32..5).prop_map(|attempts| Verdict::Rejected { attempts }),
        (0u32..3).prop_map(|attempts| Verdict::Hidden { attempts }),
        (-10i32..100).prop_map(|v| Verdict::Score(v as f64)),
        Just(Verdict::Pending),
    ]
}

fn result() -> impl Strategy<Value = ProblemResult> {
    (
        verdict(),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        proptest::option::of(0i64..3),
        proptest::option::of(0i64..1000),
        proptest::option::of(0u32..300),
    )
        .prop_map(|(v, partial, binary, priority, id, minutes)| {
            let mut r = ProblemResult::new(v);
            r.partial = partial;
            r.binary = binary;
            r.priority = priority;
            r.id = id;
            r.time_in_seconds = minutes.map(|m| m as f64 * 60.0);
            r
        })
}

fn standings() -> impl Strategy<Value = Standings> {
    proptest::collection::vec(
        (0u32..6, 0u32..500, proptest::collection::vec(proptest::option::of(result()), 3)),
        1..20,
    )
    .prop_map(|rows| {
        let mut st = Standings::default();
        for (i, (solving, penalty, problems)) in rows.into_iter().enumerate() {
            let mut row = ParticipantRow::new(format!("m{i:02}"));
            row.solving = solving as f64;
            row.penalty = penalty as f64;
            for (short, r) in ["A", "B", "C"].iter().zip(problems) {
                if let Some(mut r) = r {
                    r.first_ac = Some(true);
                    row.problems.insert(short.to_string(), r);
                }
            }
            st.insert(row);
        }
        st.align_problems();
        st
    })
}

/* ---------------- properties ---------------- */

proptest! {
    #![proptest_config(config())]

    #[test]
    fn well_formed_tables_keep_shape(n in 1usize..8, m in 0usize..20) {
        let mut html = String::from("<table><tr>");
        for c in 0..n {
            html.push_str(&format!("<th>h{c}</th>"));
        }
        html.push_str("</tr>");
        for r in 0..m {
            html.push_str("<tr>");
            for c in 0..n {
                html.push_str(&format!("<td>{r}.{c}</td>"));
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");

        let rows: Vec<TableRow> = TableParser::new(&html, "table tr", TableOptions::default()).unwrap().collect();
        prop_assert_eq!(rows.len(), m);
        for (r, row) in rows.iter().enumerate() {
            let pairs = row.pairs();
            prop_assert_eq!(pairs.len(), n);
            for (c, (label, cell)) in pairs.iter().enumerate() {
                prop_assert_eq!(*label, format!("h{c}"));
                prop_assert_eq!(cell.value(), format!("{r}.{c}"));
            }
        }
    }

    #[test]
    fn classification_is_repeatable(r in result(), up in any::<bool>()) {
        prop_assert_eq!(is_solved(&r, up), is_solved(&r, up));
        prop_assert_eq!(is_reject(&r, up), is_reject(&r, up));
        prop_assert_eq!(is_hidden(&r, up), is_hidden(&r, up));
        prop_assert_eq!(is_partial(&r, up), is_partial(&r, up));
        prop_assert_eq!(is_upsolved(&r), is_upsolved(&r));
    }

    #[test]
    fn solved_and_rejected_are_exclusive(r in result(), up in any::<bool>()) {
        prop_assert!(!(is_solved(&r, up) && is_reject(&r, up)));
    }

    #[test]
    fn improvement_is_irreflexive_and_asymmetric(a in result(), b in result()) {
        prop_assert!(!is_improved_solution(&a, &a));
        prop_assert!(!(is_improved_solution(&a, &b) && is_improved_solution(&b, &a)));
    }

    #[test]
    fn solved_always_beats_unsolved(a in result(), b in result()) {
        if is_solved(&a, false) && !is_solved(&b, false) {
            prop_assert!(is_improved_solution(&a, &b));
            prop_assert!(!is_improved_solution(&b, &a));
        }
    }

    #[test]
    fn places_are_competition_ranks(mut st in standings()) {
        assign_places(&mut st);
        let rows: Vec<_> = st.result.values().collect();
        for (i, row) in rows.iter().enumerate() {
            let place = match row.place { Some(Place::Rank(n)) => n as usize, _ => 0 };
            prop_assert!(place >= 1 && place <= i + 1);
            if i > 0 {
                let prev = rows[i - 1];
                prop_assert!(prev.solving >= row.solving);
                let tied = prev.solving == row.solving && prev.penalty == row.penalty;
                let prev_place = match prev.place { Some(Place::Rank(n)) => n as usize, _ => 0 };
                if tied {
                    prop_assert_eq!(place, prev_place);
                } else {
                    prop_assert_eq!(place, i + 1);
                }
            }
        }
    }

    #[test]
    fn at_most_one_first_ac_of_all(mut st in standings()) {
        detect_first_ac(&mut st);
        let flagged = st
            .result
            .values()
            .flat_map(|r| r.problems.values())
            .filter(|p| p.first_ac_of_all == Some(true))
            .count();
        prop_assert!(flagged <= 1);

        for info in &st.problems {
            for row in st.result.values() {
                if let Some(p) = row.problems.get(&info.short) {
                    if p.first_ac == Some(true) {
                        prop_assert!(is_solved(p, false));
                        prop_assert_eq!(p.solve_seconds(), info.first_ac);
                    }
                }
            }
        }
    }
}
