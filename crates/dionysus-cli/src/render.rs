//! Plain-text rendering for `--format text`.

use std::collections::HashSet;
use std::fmt::Write;

use dionysus::catalog::{category_icon, Catalog};
use dionysus::{CurationView, MatchResult, Recipe, RecipePage, Recommendations};
use serde::Serialize;

/// Highest value on the flavor scales
const SCALE_MAX: u32 = 5;

/// A recommended purchase with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub ingredient_id: String,
    pub name: String,
    pub unlocks: usize,
}

/// Recommendations ranked for display, most unlocks first.
pub fn suggestions(recommendations: &Recommendations, catalog: &Catalog) -> Vec<Suggestion> {
    recommendations
        .ranked()
        .into_iter()
        .map(|(id, unlocks)| Suggestion {
            ingredient_id: id.to_string(),
            name: catalog.ingredient_name(id).to_string(),
            unlocks,
        })
        .collect()
}

/// `●●●○○` for a 0-5 scale value.
pub fn scale(value: u32) -> String {
    let filled = value.min(SCALE_MAX) as usize;
    let mut out = "●".repeat(filled);
    out.push_str(&"○".repeat(SCALE_MAX as usize - filled));
    out
}

fn star(favorite: bool) -> &'static str {
    if favorite {
        "★"
    } else {
        " "
    }
}

fn match_line(result: &MatchResult, favorite: bool) -> String {
    let mut line = format!(
        "{} {} [{}]  strength {}",
        star(favorite),
        result.title,
        result.id,
        scale(result.strength)
    );
    let serving: Vec<&str> = [result.glassware.as_str(), result.method.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if !serving.is_empty() {
        let _ = write!(line, "  {}", serving.join(" · "));
    }
    line
}

/// Exact matches, near misses and purchase suggestions.
pub fn curation(
    view: &CurationView,
    recommendations: &Recommendations,
    catalog: &Catalog,
    favorites: &HashSet<String>,
) -> String {
    if view.is_empty() {
        return "No recipes match. Add more ingredients or loosen the filters.\n".to_string();
    }

    let mut out = String::new();
    if !view.exact_matches.is_empty() {
        let _ = writeln!(out, "Ready to mix ({})", view.exact_matches.len());
        for result in &view.exact_matches {
            let _ = writeln!(out, "  {}", match_line(result, favorites.contains(&result.id)));
        }
    }

    if !view.near_misses.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "One ingredient away ({})", view.near_misses.len());
        for result in &view.near_misses {
            let _ = writeln!(
                out,
                "  {}  needs {}",
                match_line(result, favorites.contains(&result.id)),
                catalog.missing_name(result.missing_ingredients.as_deref())
            );
        }
    }

    let suggestions = suggestions(recommendations, catalog);
    if !suggestions.is_empty() {
        let _ = writeln!(out, "\nBuy next");
        for s in &suggestions {
            let plural = if s.unlocks == 1 { "recipe" } else { "recipes" };
            let _ = writeln!(out, "  {} [{}]  unlocks {} {}", s.name, s.ingredient_id, s.unlocks, plural);
        }
    }
    out
}

/// The ingredient picker: groups by category with icons.
pub fn ingredients(catalog: &Catalog) -> String {
    let mut out = String::new();
    for group in catalog.grouped_by_category() {
        let _ = writeln!(out, "{} {}", category_icon(group.category), group.category);
        for ingredient in group.ingredients {
            let _ = writeln!(out, "    {:<24} {}", ingredient.id, ingredient.name);
        }
    }
    out
}

/// Tags grouped by facet.
pub fn tags(catalog: &Catalog, kind: Option<&str>) -> String {
    let mut kinds: Vec<&str> = Vec::new();
    for tag in catalog.tags() {
        if kind.map_or(true, |k| k.eq_ignore_ascii_case(&tag.kind)) && !kinds.contains(&tag.kind.as_str()) {
            kinds.push(&tag.kind);
        }
    }

    let mut out = String::new();
    for kind in kinds {
        let _ = writeln!(out, "{}", kind);
        for tag in catalog.tags_of_kind(kind) {
            let _ = writeln!(out, "    {:<24} {}", tag.id, tag.name);
        }
    }
    out
}

/// One page of the gallery.
pub fn gallery(page: &RecipePage, page_number: u32, has_more: bool) -> String {
    let mut out = String::new();
    for recipe in &page.items {
        let _ = writeln!(
            out,
            "{} [{}]  strength {}",
            recipe.title,
            recipe.id,
            scale(recipe.strength)
        );
    }
    let _ = writeln!(
        out,
        "\nPage {} · {} recipes in total{}",
        page_number,
        page.total,
        if has_more { " · more available" } else { "" }
    );
    out
}

/// Full recipe card.
pub fn recipe(recipe: &Recipe, favorite: bool) -> String {
    let mut out = format!("{} {}\n", star(favorite), recipe.title);
    if !recipe.description.is_empty() {
        let _ = writeln!(out, "{}", recipe.description);
    }
    let _ = writeln!(
        out,
        "\nSweet {}  Sour {}  Strength {}",
        scale(recipe.sweetness),
        scale(recipe.sourness),
        scale(recipe.strength)
    );
    if !recipe.glassware.is_empty() || !recipe.method.is_empty() {
        let _ = writeln!(out, "Glass: {}  Method: {}", recipe.glassware, recipe.method);
    }

    if let Some(ingredients) = &recipe.ingredients {
        let _ = writeln!(out, "\nIngredients");
        for line in ingredients {
            let name = line.name.as_deref().unwrap_or(&line.ingredient_id);
            let amount = format!("{} {}", line.amount, line.unit);
            let _ = writeln!(out, "  {:>10}  {}", amount.trim(), name);
        }
    }
    if !recipe.steps.is_empty() {
        let _ = writeln!(out, "\nSteps\n{}", recipe.steps);
    }
    if let Some(tags) = &recipe.tags {
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        if !names.is_empty() {
            let _ = writeln!(out, "\nTags: {}", names.join(", "));
        }
    }
    out
}
