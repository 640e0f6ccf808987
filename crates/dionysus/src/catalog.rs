//! Reference data: ingredients and tags.
//!
//! Fetched once per session and used to group the ingredient picker, split
//! tags into facets, and turn ids back into display names.

use std::collections::HashMap;

use serde::Serialize;

use crate::service::RecipeService;
use crate::{Ingredient, Result, Tag};

/// Name shown for an ingredient id the catalog does not know.
pub const UNKNOWN_INGREDIENT: &str = "Unknown Ingredient";

/// Tag facet used for flavor filters.
pub const PALATE: &str = "Palate";

/// Tag facet used for bar equipment filters.
pub const EQUIPMENT: &str = "Equipment";

/// Ingredients sharing a category, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientGroup<'a> {
    pub category: &'a str,
    pub ingredients: Vec<&'a Ingredient>,
}

/// Cached ingredient and tag reference data.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    ingredients: Vec<Ingredient>,
    tags: Vec<Tag>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(ingredients: Vec<Ingredient>, tags: Vec<Tag>) -> Self {
        let by_id = ingredients
            .iter()
            .enumerate()
            .map(|(i, ing)| (ing.id.clone(), i))
            .collect();
        Self {
            ingredients,
            tags,
            by_id,
        }
    }

    /// Fetch both reference lists from the recipe API.
    pub fn fetch(service: &dyn RecipeService) -> Result<Self> {
        let ingredients = service.ingredients()?;
        let tags = service.tags()?;
        tracing::debug!(
            "Loaded catalog: {} ingredients, {} tags",
            ingredients.len(),
            tags.len()
        );
        Ok(Self::new(ingredients, tags))
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.ingredients
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.by_id.get(id).map(|&i| &self.ingredients[i])
    }

    /// Display name for an ingredient id.
    pub fn ingredient_name(&self, id: &str) -> &str {
        self.ingredient(id)
            .map(|i| i.name.as_str())
            .unwrap_or(UNKNOWN_INGREDIENT)
    }

    /// Display name of the ingredient a near miss is waiting on.
    pub fn missing_name(&self, missing_ids: Option<&[String]>) -> &str {
        match missing_ids.and_then(|ids| ids.first()) {
            None => "Unknown",
            Some(id) => self
                .ingredient(id)
                .map(|i| i.name.as_str())
                .unwrap_or("Ingredient"),
        }
    }

    /// Ingredients grouped by category, groups in order of first appearance.
    pub fn grouped_by_category(&self) -> Vec<IngredientGroup<'_>> {
        let mut groups: Vec<IngredientGroup<'_>> = Vec::new();
        for ingredient in &self.ingredients {
            match groups
                .iter_mut()
                .find(|g| g.category == ingredient.category)
            {
                Some(group) => group.ingredients.push(ingredient),
                None => groups.push(IngredientGroup {
                    category: &ingredient.category,
                    ingredients: vec![ingredient],
                }),
            }
        }
        groups
    }

    /// Tags of one facet, e.g. [`PALATE`].
    pub fn tags_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.tags.iter().filter(move |t| t.kind == kind)
    }

    /// Resolve a user-typed ingredient by id or name, ignoring case.
    pub fn resolve_ingredient(&self, token: &str) -> Option<&Ingredient> {
        let token = token.trim();
        self.ingredient(token).or_else(|| {
            self.ingredients
                .iter()
                .find(|i| i.id.eq_ignore_ascii_case(token) || i.name.eq_ignore_ascii_case(token))
        })
    }

    /// Resolve a user-typed tag by id or name, ignoring case.
    pub fn resolve_tag(&self, token: &str) -> Option<&Tag> {
        let token = token.trim();
        self.tags
            .iter()
            .find(|t| t.id == token)
            .or_else(|| {
                self.tags
                    .iter()
                    .find(|t| t.id.eq_ignore_ascii_case(token) || t.name.eq_ignore_ascii_case(token))
            })
    }
}

/// Icon for an ingredient category.
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "Spirit" => "🥃",
        "Liqueur" => "🧪",
        "Mixer" => "🍋",
        "Syrup" => "🍯",
        "Bitters" => "💧",
        "Garnish" => "🌿",
        _ => "🔹",
    }
}
