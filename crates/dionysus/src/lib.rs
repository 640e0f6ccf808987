//! dionysus: cocktail discovery from the ingredients you already own
//!
//! This crate provides the client-side half of the recipe finder:
//! - A debounced match query over a remote recipe-matching API
//! - Curation of match results into exact matches and near misses
//! - Ingredient recommendations derived from near misses
//! - Durable user state (favorites and a shopping list)
//!
//! Ranking is computed by the recipe API; everything here works on the
//! ranked list it returns.

use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod config;
pub mod curate;
pub mod lucky;
pub mod query;
pub mod recommend;
pub mod service;
pub mod session;
pub mod storage;
pub mod user_store;

// Re-export main types
pub use catalog::Catalog;
pub use curate::{curate, CurationView};
pub use lucky::{feeling_lucky, LuckyPick};
pub use query::{MatchFilter, MatchQuery, MatchTicket, RefreshOutcome};
pub use recommend::{recommend, Recommendations};
pub use service::{HttpRecipeService, MatchRequest, RecipeService};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use user_store::{UserState, UserStore};

/// An ingredient from the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Display grouping, e.g. "Spirit", "Mixer"
    pub category: String,
}

/// A recipe tag. Tags are both a filter facet and a display grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    /// Open set of facets such as "Palate" or "Equipment"
    #[serde(rename = "type")]
    pub kind: String,
}

/// One recipe as ranked by the matching service against the owned ingredients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub total_ingredients: u32,
    pub owned_count: u32,
    pub missing_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub sweetness: u32,
    #[serde(default)]
    pub sourness: u32,
    #[serde(default)]
    pub strength: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub glassware: String,
    #[serde(default)]
    pub method: String,
}

/// A broken consistency rule on a [`MatchResult`] received from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    #[error("{id}: missing_count {missing} != total_ingredients {total} - owned_count {owned}")]
    MissingCount {
        id: String,
        total: u32,
        owned: u32,
        missing: u32,
    },

    #[error("{id}: missing_count {missing} but {listed} missing ingredient(s) listed")]
    MissingList {
        id: String,
        missing: u32,
        listed: usize,
    },
}

impl MatchResult {
    /// Check the counting invariants the service promises.
    ///
    /// `missing_count == total_ingredients - owned_count`, and when
    /// `missing_ingredients` is present its length equals `missing_count`.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if self.owned_count > self.total_ingredients
            || self.total_ingredients - self.owned_count != self.missing_count
        {
            violations.push(InvariantViolation::MissingCount {
                id: self.id.clone(),
                total: self.total_ingredients,
                owned: self.owned_count,
                missing: self.missing_count,
            });
        }

        if let Some(listed) = &self.missing_ingredients {
            if listed.len() != self.missing_count as usize {
                violations.push(InvariantViolation::MissingList {
                    id: self.id.clone(),
                    missing: self.missing_count,
                    listed: listed.len(),
                });
            }
        }

        violations
    }

    /// The ingredient that would complete this recipe, if exactly one is missing.
    pub fn single_missing(&self) -> Option<&str> {
        if self.missing_count != 1 {
            return None;
        }
        self.missing_ingredients
            .as_ref()
            .and_then(|ids| ids.first())
            .map(String::as_str)
    }
}

/// Direction for strength sorting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// The opposite direction.
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ingredient line of a full recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub unit: String,
}

/// A full recipe as served by the gallery and detail endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub glassware: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub steps: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub sweetness: u32,
    #[serde(default)]
    pub sourness: u32,
    #[serde(default)]
    pub strength: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<RecipeIngredient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default)]
    pub created_at: String,
}

/// One page of the recipe gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipePage {
    #[serde(default)]
    pub items: Vec<Recipe>,
    #[serde(default)]
    pub total: u64,
}

impl RecipePage {
    /// Whether another page should be requested after this one.
    ///
    /// `loaded` is the number of recipes shown so far including this page.
    pub fn has_more(&self, limit: u32, loaded: u64) -> bool {
        self.items.len() >= limit as usize && loaded < self.total
    }
}

/// Errors that can occur talking to collaborators
#[derive(Debug, thiserror::Error)]
pub enum DionysusError {
    #[error("Request to recipe API failed: {0}")]
    Transport(String),

    #[error("Recipe API returned {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Failed to decode recipe API response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ureq::Error> for DionysusError {
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(code, response) => {
                // The API reports failures as {"error": "..."} when it can
                let body = response.into_string().unwrap_or_default();
                let message = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                    .unwrap_or(body);
                DionysusError::Status { code, message }
            }
            ureq::Error::Transport(transport) => DionysusError::Transport(transport.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DionysusError>;

#[cfg(test)]
pub(crate) mod test_support {
    use super::MatchResult;

    /// A match result with consistent counts for the given missing ids.
    pub fn match_result(id: &str, strength: u32, missing: &[&str]) -> MatchResult {
        let total = 3 + missing.len() as u32;
        MatchResult {
            id: id.to_string(),
            title: format!("Recipe {}", id),
            description: String::new(),
            image_url: String::new(),
            total_ingredients: total,
            owned_count: total - missing.len() as u32,
            missing_count: missing.len() as u32,
            missing_ingredients: Some(missing.iter().map(|s| s.to_string()).collect()),
            sweetness: 2,
            sourness: 2,
            strength,
            tags: None,
            glassware: "Coupe".to_string(),
            method: "Shaken".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::match_result;

    #[test]
    fn test_consistent_result_has_no_violations() {
        let r = match_result("negroni", 4, &["campari"]);
        assert!(r.check_invariants().is_empty());
        assert_eq!(r.missing_count, r.total_ingredients - r.owned_count);
    }

    #[test]
    fn test_missing_count_mismatch_detected() {
        let mut r = match_result("negroni", 4, &[]);
        r.owned_count = 1;
        let violations = r.check_invariants();
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], InvariantViolation::MissingCount { .. }));
    }

    #[test]
    fn test_owned_above_total_is_a_violation() {
        let mut r = match_result("negroni", 4, &[]);
        r.owned_count = r.total_ingredients + 1;
        assert!(!r.check_invariants().is_empty());
    }

    #[test]
    fn test_missing_list_mismatch_detected() {
        let mut r = match_result("daiquiri", 3, &["lime"]);
        r.missing_ingredients = Some(vec!["lime".into(), "rum".into()]);
        let violations = r.check_invariants();
        assert!(violations
            .iter()
            .any(|v| matches!(v, InvariantViolation::MissingList { listed: 2, .. })));
    }

    #[test]
    fn test_absent_missing_list_is_allowed() {
        let mut r = match_result("daiquiri", 3, &["lime"]);
        r.missing_ingredients = None;
        assert!(r.check_invariants().is_empty());
        assert_eq!(r.single_missing(), None);
    }

    #[test]
    fn test_single_missing() {
        let r = match_result("daiquiri", 3, &["lime"]);
        assert_eq!(r.single_missing(), Some("lime"));
        let exact = match_result("gimlet", 3, &[]);
        assert_eq!(exact.single_missing(), None);
    }

    #[test]
    fn test_match_result_deserialize_minimal() {
        let json = r#"{
            "id": "r1", "title": "Gin Tonic",
            "total_ingredients": 2, "owned_count": 2, "missing_count": 0,
            "strength": 3
        }"#;
        let r: MatchResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.id, "r1");
        assert_eq!(r.strength, 3);
        assert!(r.missing_ingredients.is_none());
        assert!(r.tags.is_none());
    }

    #[test]
    fn test_tag_type_field() {
        let json = r#"{"id": "t1", "name": "Sweet", "type": "Palate"}"#;
        let tag: Tag = serde_json::from_str(json).unwrap();
        assert_eq!(tag.kind, "Palate");
        let back = serde_json::to_value(&tag).unwrap();
        assert_eq!(back["type"], "Palate");
    }

    #[test]
    fn test_sort_direction() {
        assert_eq!(SortDirection::default(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled(), SortDirection::Asc);
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(format!("{}", SortDirection::Asc), "asc");
        assert_eq!(serde_json::to_string(&SortDirection::Desc).unwrap(), "\"desc\"");
    }

    #[test]
    fn test_recipe_page_has_more() {
        let recipe = Recipe {
            id: "r".into(),
            title: "R".into(),
            description: String::new(),
            glassware: String::new(),
            method: String::new(),
            steps: String::new(),
            image_url: String::new(),
            sweetness: 0,
            sourness: 0,
            strength: 0,
            ingredients: None,
            tags: None,
            created_at: String::new(),
        };
        let full = RecipePage {
            items: vec![recipe.clone(); 2],
            total: 5,
        };
        assert!(full.has_more(2, 2));
        assert!(!full.has_more(2, 5));

        let short = RecipePage {
            items: vec![recipe],
            total: 5,
        };
        assert!(!short.has_more(2, 3));
    }
}
