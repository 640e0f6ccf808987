//! "Feeling lucky": pick a random recipe from the current view.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{CurationView, MatchResult};

/// Outcome of a feeling-lucky pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuckyPick<'a> {
    /// A recipe that can be made right now
    Exact(&'a MatchResult),
    /// No exact match exists; a recipe one ingredient away
    NearMiss(&'a MatchResult),
    /// Both lists are empty
    NoCandidates,
}

impl<'a> LuckyPick<'a> {
    pub fn recipe(&self) -> Option<&'a MatchResult> {
        match self {
            LuckyPick::Exact(r) | LuckyPick::NearMiss(r) => Some(r),
            LuckyPick::NoCandidates => None,
        }
    }
}

/// Pick uniformly from the exact matches, falling back to the near misses.
pub fn feeling_lucky<'a, R: Rng + ?Sized>(view: &'a CurationView, rng: &mut R) -> LuckyPick<'a> {
    if let Some(recipe) = view.exact_matches.choose(rng) {
        return LuckyPick::Exact(recipe);
    }
    if let Some(recipe) = view.near_misses.choose(rng) {
        return LuckyPick::NearMiss(recipe);
    }
    LuckyPick::NoCandidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::match_result;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_no_candidates() {
        let view = CurationView::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(feeling_lucky(&view, &mut rng), LuckyPick::NoCandidates);
        assert!(feeling_lucky(&view, &mut rng).recipe().is_none());
    }

    #[test]
    fn test_prefers_exact_matches() {
        let view = CurationView {
            exact_matches: vec![match_result("a", 3, &[]), match_result("b", 2, &[])],
            near_misses: vec![match_result("c", 1, &["lime"])],
        };
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            match feeling_lucky(&view, &mut rng) {
                LuckyPick::Exact(r) => assert!(r.id == "a" || r.id == "b"),
                other => panic!("expected exact pick, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_falls_back_to_near_misses() {
        let view = CurationView {
            exact_matches: Vec::new(),
            near_misses: vec![match_result("c", 1, &["lime"])],
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            feeling_lucky(&view, &mut rng),
            LuckyPick::NearMiss(r) if r.id == "c"
        ));
    }

    #[test]
    fn test_every_candidate_reachable() {
        let view = CurationView {
            exact_matches: (0..4)
                .map(|i| match_result(&format!("r{}", i), 3, &[]))
                .collect(),
            near_misses: Vec::new(),
        };
        let mut rng = StdRng::seed_from_u64(99);
        let seen: HashSet<String> = (0..200)
            .filter_map(|_| feeling_lucky(&view, &mut rng).recipe().map(|r| r.id.clone()))
            .collect();
        assert_eq!(seen.len(), 4);
    }
}
