//! dionysus: find cocktails you can make with what is already in the cabinet.
//!
//! This CLI provides access to dionysus functionality for:
//! - Curating matches for the ingredients you own, with purchase suggestions
//! - Picking something at random ("feeling lucky")
//! - An interactive shaker that refreshes as you edit your cabinet
//! - Browsing the recipe gallery and reference data
//! - Managing favorites and the shopping list

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dionysus::catalog::Catalog;
use dionysus::config::Config;
use dionysus::curate::CurationOptions;
use dionysus::query::RefreshOutcome;
use dionysus::{
    curate, feeling_lucky, recommend, CurationView, DionysusError, FileKeyValueStore,
    HttpRecipeService, LuckyPick, MatchQuery, RecipeService, Recommendations, SortDirection,
    UserStore,
};
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Exit codes for the CLI
///
/// - 0: Success
/// - 1: Not found (valid query, no results)
/// - 2: Error (unreachable API, invalid input, etc.)
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const NOT_FOUND: u8 = 1;
    pub const ERROR: u8 = 2;
}

mod render;
mod shake;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortDirection {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Asc => SortDirection::Asc,
            SortArg::Desc => SortDirection::Desc,
        }
    }
}

/// Find cocktails you can make with what is already in the cabinet
#[derive(Parser)]
#[command(name = "dionysus")]
#[command(author, version = env!("DIONYSUS_VERSION"), about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Base URL of the recipe API (overrides config)
    #[arg(long, global = true)]
    api: Option<String>,

    /// Path to config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Ingredient you own, by id or name (repeat or comma-separate)
    #[arg(long = "have", value_delimiter = ',')]
    have: Vec<String>,

    /// Only recipes with this tag, by id or name (repeat or comma-separate)
    #[arg(long = "tag", value_delimiter = ',')]
    tags: Vec<String>,

    /// Minimum strength, 0-5
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=5))]
    min_strength: u8,

    /// Strength sort direction
    #[arg(long, value_enum, default_value_t = SortArg::Desc)]
    sort: SortArg,

    /// Only show favorites
    #[arg(long)]
    favorites: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Curate recipes for the ingredients you own
    Match {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Pick a random recipe you can make (or nearly make)
    Lucky {
        #[command(flatten)]
        filter: FilterArgs,

        /// Seed for a repeatable pick
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Interactive shaker: edit your cabinet and watch matches update
    Shake,

    /// List ingredients grouped by category
    Ingredients,

    /// List tags grouped by facet
    Tags {
        /// Only this facet, e.g. Palate or Equipment
        #[arg(long)]
        kind: Option<String>,
    },

    /// Browse the recipe gallery
    Recipes {
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Strength sort direction
        #[arg(long, value_enum, default_value_t = SortArg::Desc)]
        sort: SortArg,

        /// Recipes per page (defaults to page_size from config)
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show one recipe
    Recipe {
        /// Recipe id
        id: String,
    },

    /// Toggle a recipe as favorite
    Favorite {
        /// Recipe id
        id: String,
    },

    /// List favorite recipes
    Favorites,

    /// Manage the shopping list
    Shopping {
        #[command(subcommand)]
        action: ShoppingAction,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum ShoppingAction {
    /// Show the shopping list
    List,

    /// Add an ingredient
    Add {
        /// Ingredient id
        id: String,
    },

    /// Remove an ingredient
    Remove {
        /// Ingredient id
        id: String,
    },

    /// Empty the shopping list
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Print ingredient names, one per line, for pasting elsewhere
    Export,
}

/// Everything commands share: effective config and output format.
struct App {
    config: Config,
    format: OutputFormat,
}

impl App {
    fn service(&self) -> HttpRecipeService {
        HttpRecipeService::new(&self.config.api_base, self.config.timeout())
    }

    fn store(&self) -> UserStore {
        UserStore::open_lazy(FileKeyValueStore::new(self.config.data_dir()))
    }

    fn catalog(&self, service: &dyn RecipeService) -> Result<Catalog> {
        Catalog::fetch(service).with_context(|| {
            format!(
                "Failed to load ingredients and tags from {}",
                self.config.api_base
            )
        })
    }

    fn is_json(&self) -> bool {
        self.format != OutputFormat::Text
    }

    fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let out = if self.format == OutputFormat::Pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{}", out);
        Ok(())
    }
}

/// `RUST_LOG` when set, otherwise WARN (DEBUG with `--verbose`).
fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_log_filter(verbose))
}

fn default_log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    EnvFilter::default().add_directive(level.into())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(cli.verbose))
        .init();

    let format = cli.format;
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            if format != OutputFormat::Text {
                let error_json = serde_json::json!({
                    "error": "CommandFailed",
                    "message": format!("{:#}", e),
                });
                eprintln!("{}", error_json);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    };
    if let Some(api) = cli.api {
        config.api_base = api;
    }
    let app = App {
        config,
        format: cli.format,
    };

    match cli.command {
        Commands::Match { filter } => cmd_match(&app, &filter),
        Commands::Lucky { filter, seed } => cmd_lucky(&app, &filter, seed),
        Commands::Shake => cmd_shake(&app),
        Commands::Ingredients => cmd_ingredients(&app),
        Commands::Tags { kind } => cmd_tags(&app, kind.as_deref()),
        Commands::Recipes { page, sort, limit } => cmd_recipes(&app, page, sort.into(), limit),
        Commands::Recipe { id } => cmd_recipe(&app, &id),
        Commands::Favorite { id } => cmd_favorite(&app, &id),
        Commands::Favorites => cmd_favorites(&app),
        Commands::Shopping { action } => cmd_shopping(&app, action),
        Commands::Config => cmd_config(&app),
    }
}

/// Result of one curated pass.
struct Pass {
    catalog: Catalog,
    favorites: HashSet<String>,
    view: CurationView,
    recommendations: Recommendations,
}

/// Resolve the filter, run one match request and curate the result.
fn curated_pass(app: &App, filter: &FilterArgs) -> Result<Pass> {
    let service = app.service();
    let catalog = app.catalog(&service)?;

    let mut owned = Vec::new();
    for token in &filter.have {
        let ingredient = catalog
            .resolve_ingredient(token)
            .with_context(|| format!("Unknown ingredient: {}", token))?;
        owned.push(ingredient.id.clone());
    }
    let mut tag_ids = Vec::new();
    for token in &filter.tags {
        let tag = catalog
            .resolve_tag(token)
            .with_context(|| format!("Unknown tag: {}", token))?;
        tag_ids.push(tag.id.clone());
    }

    // A single pass needs no quiet period
    let now = Instant::now();
    let mut query = MatchQuery::new(Duration::ZERO);
    query.set_owned(owned, now);
    for tag_id in &tag_ids {
        if !query.filter().has_tag(tag_id) {
            query.toggle_tag(tag_id, now);
        }
    }
    query.set_min_strength(filter.min_strength, now);

    if let Some(ticket) = query.poll(now) {
        let spinner = if app.is_json() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        spinner.set_message("Shaking...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        let outcome = service.match_cocktails(&ticket.request);
        spinner.finish_and_clear();

        if let RefreshOutcome::Failed(e) = query.apply(ticket.seq, outcome) {
            return Err(e).context("Match request failed");
        }
    }

    let store = app.store();
    let favorites = store.favorite_set();
    let options = CurationOptions {
        favorites_only: filter.favorites,
        sort: filter.sort.into(),
    };
    let view = curate(query.matches(), options, &favorites);
    let recommendations = recommend(&view.near_misses);

    Ok(Pass {
        catalog,
        favorites,
        view,
        recommendations,
    })
}

fn cmd_match(app: &App, filter: &FilterArgs) -> Result<u8> {
    let pass = curated_pass(app, filter)?;

    if app.is_json() {
        let output = serde_json::json!({
            "exact_matches": pass.view.exact_matches,
            "near_misses": pass.view.near_misses,
            "recommendations": render::suggestions(&pass.recommendations, &pass.catalog),
            "violations": pass.recommendations.violations,
        });
        app.print_json(&output)?;
    } else {
        print!(
            "{}",
            render::curation(&pass.view, &pass.recommendations, &pass.catalog, &pass.favorites)
        );
    }

    if pass.view.is_empty() {
        Ok(exit_codes::NOT_FOUND)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

fn cmd_lucky(app: &App, filter: &FilterArgs, seed: Option<u64>) -> Result<u8> {
    let pass = curated_pass(app, filter)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let pick = feeling_lucky(&pass.view, &mut rng);
    if app.is_json() {
        let output = match pick {
            LuckyPick::Exact(recipe) => serde_json::json!({"pick": "exact", "recipe": recipe}),
            LuckyPick::NearMiss(recipe) => serde_json::json!({
                "pick": "near_miss",
                "recipe": recipe,
                "missing": recipe.missing_ingredients.as_ref().and_then(|ids| ids.first()),
            }),
            LuckyPick::NoCandidates => serde_json::json!({"pick": "none"}),
        };
        app.print_json(&output)?;
    } else {
        match pick {
            LuckyPick::Exact(recipe) => {
                println!("🎲 Make a {} [{}]", recipe.title, recipe.id);
            }
            LuckyPick::NearMiss(recipe) => {
                println!(
                    "🎲 Nothing is ready yet. Buy {} and make a {} [{}]",
                    pass.catalog.missing_name(recipe.missing_ingredients.as_deref()),
                    recipe.title,
                    recipe.id
                );
            }
            LuckyPick::NoCandidates => {
                println!("Nothing to pick from yet. Add more ingredients.");
            }
        }
    }

    match pick {
        LuckyPick::NoCandidates => Ok(exit_codes::NOT_FOUND),
        _ => Ok(exit_codes::SUCCESS),
    }
}

fn cmd_shake(app: &App) -> Result<u8> {
    let service = Arc::new(app.service());
    let catalog = app.catalog(service.as_ref())?;
    let mut store = app.store();
    shake::run(
        service,
        catalog,
        &mut store,
        app.config.debounce(),
        app.format,
    )?;
    Ok(exit_codes::SUCCESS)
}

fn cmd_ingredients(app: &App) -> Result<u8> {
    let service = app.service();
    let catalog = app.catalog(&service)?;

    if app.is_json() {
        app.print_json(&catalog.grouped_by_category())?;
    } else {
        print!("{}", render::ingredients(&catalog));
    }

    if catalog.ingredients().is_empty() {
        Ok(exit_codes::NOT_FOUND)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

fn cmd_tags(app: &App, kind: Option<&str>) -> Result<u8> {
    let service = app.service();
    let catalog = app.catalog(&service)?;
    let matching: Vec<_> = catalog
        .tags()
        .iter()
        .filter(|t| kind.map_or(true, |k| k.eq_ignore_ascii_case(&t.kind)))
        .collect();

    if app.is_json() {
        app.print_json(&matching)?;
    } else {
        print!("{}", render::tags(&catalog, kind));
    }

    if matching.is_empty() {
        Ok(exit_codes::NOT_FOUND)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

fn cmd_recipes(app: &App, page: u32, sort: SortDirection, limit: Option<u32>) -> Result<u8> {
    let page = page.max(1);
    let limit = limit.unwrap_or(app.config.page_size).max(1);
    let recipes = app
        .service()
        .recipes(page, limit, sort)
        .context("Failed to load recipes")?;

    let loaded = u64::from(page - 1) * u64::from(limit) + recipes.items.len() as u64;
    let has_more = recipes.has_more(limit, loaded);

    if app.is_json() {
        let output = serde_json::json!({
            "page": page,
            "limit": limit,
            "sort": sort,
            "total": recipes.total,
            "has_more": has_more,
            "items": recipes.items,
        });
        app.print_json(&output)?;
    } else {
        print!("{}", render::gallery(&recipes, page, has_more));
    }

    if recipes.items.is_empty() {
        Ok(exit_codes::NOT_FOUND)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

fn cmd_recipe(app: &App, id: &str) -> Result<u8> {
    let recipe = match app.service().recipe(id) {
        Ok(recipe) => recipe,
        Err(DionysusError::NotFound(_)) => {
            if app.is_json() {
                app.print_json(&serde_json::json!({
                    "error": "Recipe not found",
                    "id": id,
                }))?;
            } else {
                eprintln!("Recipe not found: {}", id);
            }
            return Ok(exit_codes::NOT_FOUND);
        }
        Err(e) => return Err(e).context("Failed to load recipe"),
    };

    let favorite = app.store().is_favorite(&recipe.id);
    if app.is_json() {
        let mut output = serde_json::to_value(&recipe)?;
        output["favorite"] = serde_json::Value::Bool(favorite);
        app.print_json(&output)?;
    } else {
        print!("{}", render::recipe(&recipe, favorite));
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_favorite(app: &App, id: &str) -> Result<u8> {
    let mut store = app.store();
    let favorite = store.toggle_favorite(id);

    if app.is_json() {
        app.print_json(&serde_json::json!({"id": id, "favorite": favorite}))?;
    } else if favorite {
        println!("★ Saved {} to favorites", id);
    } else {
        println!("Removed {} from favorites", id);
    }
    Ok(exit_codes::SUCCESS)
}

fn cmd_favorites(app: &App) -> Result<u8> {
    let store = app.store();
    let favorites = store.favorites();

    if app.is_json() {
        app.print_json(&favorites)?;
    } else if favorites.is_empty() {
        println!("No favorites yet. Use `dionysus favorite <recipe>` to save one.");
    } else {
        for id in favorites {
            println!("★ {}", id);
        }
    }

    if favorites.is_empty() {
        Ok(exit_codes::NOT_FOUND)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

fn cmd_shopping(app: &App, action: ShoppingAction) -> Result<u8> {
    let mut store = app.store();

    match action {
        ShoppingAction::List => {
            let items = store.shopping_list();
            if app.is_json() {
                app.print_json(&items)?;
            } else if items.is_empty() {
                println!("Your shopping list is empty.");
            } else {
                for id in items {
                    println!("• {}", id);
                }
            }
            if items.is_empty() {
                return Ok(exit_codes::NOT_FOUND);
            }
        }
        ShoppingAction::Add { id } => {
            let added = store.add_to_shopping_list(&id);
            if app.is_json() {
                app.print_json(&serde_json::json!({"id": id, "added": added}))?;
            } else if added {
                println!("Added {} to the shopping list", id);
            } else {
                println!("{} is already on the shopping list", id);
            }
        }
        ShoppingAction::Remove { id } => {
            let removed = store.remove_from_shopping_list(&id);
            if app.is_json() {
                app.print_json(&serde_json::json!({"id": id, "removed": removed}))?;
            } else if removed {
                println!("Removed {} from the shopping list", id);
            } else {
                println!("{} is not on the shopping list", id);
            }
            if !removed {
                return Ok(exit_codes::NOT_FOUND);
            }
        }
        ShoppingAction::Clear { yes } => {
            if !yes && !confirm_clear(store.shopping_list().len())? {
                if app.is_json() {
                    let kept = store.shopping_list().len();
                    app.print_json(&serde_json::json!({"cleared": 0, "kept": kept}))?;
                } else {
                    println!("Kept the shopping list.");
                }
                return Ok(exit_codes::SUCCESS);
            }
            let removed = store.clear_shopping_list();
            if app.is_json() {
                app.print_json(&serde_json::json!({"cleared": removed}))?;
            } else {
                println!("Cleared {} item(s) from the shopping list", removed);
            }
        }
        ShoppingAction::Export => {
            let service = app.service();
            let catalog = app.catalog(&service)?;
            if store.shopping_list().is_empty() {
                if app.is_json() {
                    app.print_json(&Vec::<&str>::new())?;
                } else {
                    println!("Your shopping list is empty.");
                }
                return Ok(exit_codes::NOT_FOUND);
            }
            if app.is_json() {
                let names: Vec<&str> = store
                    .shopping_list()
                    .iter()
                    .map(|id| catalog.ingredient_name(id))
                    .collect();
                app.print_json(&names)?;
            } else {
                println!("{}", store.shopping_list_text(&catalog));
            }
        }
    }
    Ok(exit_codes::SUCCESS)
}

fn confirm_clear(count: usize) -> Result<bool> {
    if count == 0 {
        return Ok(true);
    }
    if !dialoguer::console::Term::stderr().is_term() {
        anyhow::bail!("Refusing to clear the shopping list without --yes");
    }
    let answer = dialoguer::Confirm::new()
        .with_prompt(format!("Remove all {} item(s) from the shopping list?", count))
        .default(false)
        .interact_opt()?;
    Ok(answer == Some(true))
}

fn cmd_config(app: &App) -> Result<u8> {
    if app.is_json() {
        app.print_json(&app.config)?;
    } else {
        let mut effective = app.config.clone();
        effective.data_dir = Some(app.config.data_dir());
        print!(
            "{}",
            toml::to_string_pretty(&effective).context("Failed to render configuration")?
        );
    }
    Ok(exit_codes::SUCCESS)
}
