//! Match curation: exact matches and near misses.
//!
//! The matching service returns every recipe it ranked for the owned
//! ingredients. Curation narrows that list for display:
//!
//! 1. Optionally keep only favorites
//! 2. Partition into exact matches (`missing_count == 0`) and near misses
//!    (`missing_count == 1`); anything missing more is dropped
//! 3. Sort both partitions by strength, stable for ties
//!
//! Curation never mutates its input and is deterministic.

use std::collections::HashSet;

use serde::Serialize;

use crate::{MatchResult, SortDirection};

/// View toggles applied on top of the raw match list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CurationOptions {
    pub favorites_only: bool,
    pub sort: SortDirection,
}

/// The derived, display-ready partitions of a match list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurationView {
    pub exact_matches: Vec<MatchResult>,
    pub near_misses: Vec<MatchResult>,
}

impl CurationView {
    pub fn is_empty(&self) -> bool {
        self.exact_matches.is_empty() && self.near_misses.is_empty()
    }
}

/// Curate a raw match list into exact matches and near misses.
pub fn curate(
    matches: &[MatchResult],
    options: CurationOptions,
    favorites: &HashSet<String>,
) -> CurationView {
    let visible = |m: &&MatchResult| !options.favorites_only || favorites.contains(&m.id);

    let mut exact_matches: Vec<MatchResult> = matches
        .iter()
        .filter(visible)
        .filter(|m| m.missing_count == 0)
        .cloned()
        .collect();
    let mut near_misses: Vec<MatchResult> = matches
        .iter()
        .filter(visible)
        .filter(|m| m.missing_count == 1)
        .cloned()
        .collect();

    sort_by_strength(&mut exact_matches, options.sort);
    sort_by_strength(&mut near_misses, options.sort);

    CurationView {
        exact_matches,
        near_misses,
    }
}

/// Sort by strength in the given direction.
///
/// `sort_by` is stable, so equal strengths keep their input order in both
/// directions.
pub fn sort_by_strength(results: &mut [MatchResult], direction: SortDirection) {
    match direction {
        SortDirection::Desc => results.sort_by(|a, b| b.strength.cmp(&a.strength)),
        SortDirection::Asc => results.sort_by(|a, b| a.strength.cmp(&b.strength)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::match_result;

    fn ids(results: &[MatchResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<MatchResult> {
        vec![
            match_result("a", 2, &[]),
            match_result("b", 4, &["lime"]),
            match_result("c", 4, &[]),
            match_result("d", 1, &["mint", "soda"]),
            match_result("e", 2, &[]),
            match_result("f", 5, &["lime"]),
        ]
    }

    #[test]
    fn test_partition_exhaustive_and_disjoint() {
        let matches = sample();
        let view = curate(&matches, CurationOptions::default(), &HashSet::new());

        for m in &matches {
            let in_exact = view.exact_matches.iter().any(|r| r.id == m.id);
            let in_near = view.near_misses.iter().any(|r| r.id == m.id);
            match m.missing_count {
                0 => assert!(in_exact && !in_near, "{} should be exact", m.id),
                1 => assert!(in_near && !in_exact, "{} should be a near miss", m.id),
                _ => assert!(!in_exact && !in_near, "{} should be dropped", m.id),
            }
        }
    }

    #[test]
    fn test_sort_desc_is_stable() {
        let view = curate(&sample(), CurationOptions::default(), &HashSet::new());
        // a and e share strength 2 and keep their input order
        assert_eq!(ids(&view.exact_matches), vec!["c", "a", "e"]);
        assert_eq!(ids(&view.near_misses), vec!["f", "b"]);
        for pair in view.exact_matches.windows(2) {
            assert!(pair[0].strength >= pair[1].strength);
        }
    }

    #[test]
    fn test_sort_asc_is_stable() {
        let options = CurationOptions {
            favorites_only: false,
            sort: SortDirection::Asc,
        };
        let view = curate(&sample(), options, &HashSet::new());
        assert_eq!(ids(&view.exact_matches), vec!["a", "e", "c"]);
        assert_eq!(ids(&view.near_misses), vec!["b", "f"]);
    }

    #[test]
    fn test_favorites_only() {
        let favorites: HashSet<String> = ["c".to_string(), "f".to_string()].into();
        let options = CurationOptions {
            favorites_only: true,
            sort: SortDirection::Desc,
        };
        let view = curate(&sample(), options, &favorites);
        assert_eq!(ids(&view.exact_matches), vec!["c"]);
        assert_eq!(ids(&view.near_misses), vec!["f"]);
    }

    #[test]
    fn test_favorites_ignored_when_toggle_off() {
        let favorites: HashSet<String> = ["c".to_string()].into();
        let view = curate(&sample(), CurationOptions::default(), &favorites);
        assert_eq!(view.exact_matches.len(), 3);
    }

    #[test]
    fn test_input_untouched_and_deterministic() {
        let matches = sample();
        let before = matches.clone();
        let first = curate(&matches, CurationOptions::default(), &HashSet::new());
        let second = curate(&matches, CurationOptions::default(), &HashSet::new());
        assert_eq!(matches, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let view = curate(&[], CurationOptions::default(), &HashSet::new());
        assert!(view.is_empty());
    }
}
