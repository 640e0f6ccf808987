//! Client for the recipe API.
//!
//! [`RecipeService`] is the seam between the curation pipeline and the
//! remote service that ranks recipes; [`HttpRecipeService`] talks to the real
//! API over blocking HTTP with JSON bodies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    DionysusError, Ingredient, MatchResult, Recipe, RecipePage, Result, SortDirection, Tag,
};

/// Body of a match request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub owned_ingredient_ids: Vec<String>,
    pub min_strength: u8,
    pub tag_ids: Vec<String>,
}

/// Operations the recipe API offers.
pub trait RecipeService: Send + Sync {
    /// Rank recipes against the owned ingredients and filters.
    fn match_cocktails(&self, request: &MatchRequest) -> Result<Vec<MatchResult>>;

    /// The ingredient catalog.
    fn ingredients(&self) -> Result<Vec<Ingredient>>;

    /// All tags.
    fn tags(&self) -> Result<Vec<Tag>>;

    /// One page of the recipe gallery (1-indexed).
    fn recipes(&self, page: u32, limit: u32, sort: SortDirection) -> Result<RecipePage>;

    /// A single recipe with its ingredients and tags.
    fn recipe(&self, id: &str) -> Result<Recipe>;
}

/// [`RecipeService`] backed by the HTTP API.
pub struct HttpRecipeService {
    agent: ureq::Agent,
    base: String,
}

impl HttpRecipeService {
    pub fn new(api_base: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("dionysus/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, request: ureq::Request) -> Result<T> {
        let response = request.call()?;
        decode(response)
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: ureq::Response) -> Result<T> {
    response
        .into_json()
        .map_err(|e| DionysusError::Decode(e.to_string()))
}

impl RecipeService for HttpRecipeService {
    fn match_cocktails(&self, request: &MatchRequest) -> Result<Vec<MatchResult>> {
        tracing::debug!(
            "POST match-cocktails: {} owned, min strength {}, {} tags",
            request.owned_ingredient_ids.len(),
            request.min_strength,
            request.tag_ids.len()
        );
        let response = self
            .agent
            .post(&self.url("match-cocktails"))
            .send_json(request)?;
        // The API answers `null` when nothing matches
        let results: Option<Vec<MatchResult>> = decode(response)?;
        Ok(results.unwrap_or_default())
    }

    fn ingredients(&self) -> Result<Vec<Ingredient>> {
        self.get_json(self.agent.get(&self.url("ingredients")))
    }

    fn tags(&self) -> Result<Vec<Tag>> {
        self.get_json(self.agent.get(&self.url("tags")))
    }

    fn recipes(&self, page: u32, limit: u32, sort: SortDirection) -> Result<RecipePage> {
        let request = self
            .agent
            .get(&self.url("recipes"))
            .query("page", &page.max(1).to_string())
            .query("limit", &limit.to_string())
            .query("sort", sort.as_str());
        self.get_json(request)
    }

    fn recipe(&self, id: &str) -> Result<Recipe> {
        // Ids are opaque; keep `/`, `?` and `#` inside the one path segment
        let path = format!("recipes/{}", urlencoding::encode(id));
        let request = self.agent.get(&self.url(&path));
        match self.get_json(request) {
            Err(DionysusError::Status { code: 404, .. }) => {
                Err(DionysusError::NotFound(format!("recipe {}", id)))
            }
            other => other,
        }
    }
}
