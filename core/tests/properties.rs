/// Property tests for decay and navigation
extern crate storyview_core;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use proptest::prelude::*;
use storyview_core::decay::freshness;
use storyview_core::navigation::{Cursor, Navigator, Transition};

proptest! {
    #[test]
    fn freshness_bounded_and_monotonic(a in -200_000i64..200_000, b in -200_000i64..200_000) {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap();
        // ages in minutes, negative means created in the future
        let (young, old) = if a <= b { (a, b) } else { (b, a) };
        let f_young = freshness(now - ChronoDuration::minutes(young), now);
        let f_old = freshness(now - ChronoDuration::minutes(old), now);

        prop_assert!((0.0..=1.0).contains(&f_young));
        prop_assert!((0.0..=1.0).contains(&f_old));
        prop_assert!(f_young <= f_old);
    }

    #[test]
    fn next_visits_every_item_once_then_closes(lengths in prop::collection::vec(0usize..5, 0..8)) {
        let mut nav = Navigator::open(lengths.clone(), 0);
        let expected: Vec<Cursor> = lengths
            .iter()
            .enumerate()
            .flat_map(|(g, &n)| (0..n).map(move |i| Cursor::new(g, i)))
            .collect();

        let mut visited = Vec::new();
        while let Some(cursor) = nav.cursor() {
            visited.push(cursor);
            prop_assert!(visited.len() <= expected.len());
            nav.next();
        }
        prop_assert_eq!(visited, expected);
        prop_assert_eq!(nav.next(), Transition::Unchanged);
    }

    #[test]
    fn previous_never_leaves_bounds(lengths in prop::collection::vec(1usize..5, 1..6), start in 0usize..10, steps in 0usize..30) {
        let mut nav = Navigator::open(lengths.clone(), start);
        for _ in 0..steps {
            nav.previous();
            let cursor = nav.cursor().unwrap();
            prop_assert!(cursor.group < lengths.len());
            prop_assert!(cursor.item < lengths[cursor.group]);
        }
    }
}
