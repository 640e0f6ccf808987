//! Ingredient recommendations.
//!
//! Every near miss is one ingredient away from being makeable. Counting how
//! often each missing ingredient appears across the near misses tells the
//! user which single purchase unlocks the most new recipes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{InvariantViolation, MatchResult};

/// Missing-ingredient counts derived from a list of near misses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recommendations {
    /// Ingredient id -> number of near misses it would complete.
    /// Ingredients with no near misses are absent.
    pub counts: BTreeMap<String, usize>,
    /// Near misses that listed more than one missing ingredient.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<InvariantViolation>,
}

impl Recommendations {
    pub fn count(&self, ingredient_id: &str) -> usize {
        self.counts.get(ingredient_id).copied().unwrap_or(0)
    }

    /// Counts ordered for badges: most unlocks first, then by id.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(id, count)| (id.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Count the single missing ingredient of each near miss.
///
/// A near miss listing several missing ingredients is counted under its first
/// id and reported in [`Recommendations::violations`].
pub fn recommend(near_misses: &[MatchResult]) -> Recommendations {
    let mut recommendations = Recommendations::default();

    for result in near_misses {
        let Some(missing) = result.missing_ingredients.as_deref() else {
            continue;
        };
        let Some(first) = missing.first() else {
            continue;
        };

        if missing.len() > 1 {
            tracing::warn!(
                "Near miss {} lists {} missing ingredients; counting {}",
                result.id,
                missing.len(),
                first
            );
            recommendations
                .violations
                .push(InvariantViolation::MissingList {
                    id: result.id.clone(),
                    missing: result.missing_count,
                    listed: missing.len(),
                });
        }

        *recommendations.counts.entry(first.clone()).or_insert(0) += 1;
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::match_result;

    #[test]
    fn test_counts_missing_ingredients() {
        let near = vec![
            match_result("a", 1, &["x"]),
            match_result("b", 2, &["x"]),
            match_result("c", 3, &["y"]),
        ];
        let recs = recommend(&near);
        let expected: BTreeMap<String, usize> =
            [("x".to_string(), 2), ("y".to_string(), 1)].into();
        assert_eq!(recs.counts, expected);
        assert!(recs.violations.is_empty());
    }

    #[test]
    fn test_absent_ingredients_not_present() {
        let recs = recommend(&[match_result("a", 1, &["x"])]);
        assert!(!recs.counts.contains_key("y"));
        assert_eq!(recs.count("y"), 0);
    }

    #[test]
    fn test_empty_or_missing_lists_contribute_nothing() {
        let mut no_list = match_result("a", 1, &["x"]);
        no_list.missing_ingredients = None;
        let mut empty_list = match_result("b", 1, &["x"]);
        empty_list.missing_ingredients = Some(Vec::new());

        let recs = recommend(&[no_list, empty_list]);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_multiple_missing_reported_and_first_counted() {
        let mut odd = match_result("a", 1, &["x"]);
        odd.missing_ingredients = Some(vec!["x".into(), "z".into()]);

        let recs = recommend(&[odd]);
        assert_eq!(recs.count("x"), 1);
        assert_eq!(recs.count("z"), 0);
        assert_eq!(recs.violations.len(), 1);
    }

    #[test]
    fn test_ranked_orders_by_count_then_id() {
        let near = vec![
            match_result("a", 1, &["y"]),
            match_result("b", 1, &["x"]),
            match_result("c", 1, &["z"]),
            match_result("d", 1, &["z"]),
        ];
        let recs = recommend(&near);
        assert_eq!(recs.ranked(), vec![("z", 2), ("x", 1), ("y", 1)]);
    }

    #[test]
    fn test_deterministic() {
        let near = vec![match_result("a", 1, &["x"]), match_result("b", 1, &["y"])];
        assert_eq!(recommend(&near), recommend(&near));
    }
}
