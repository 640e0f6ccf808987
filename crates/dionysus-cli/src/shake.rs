//! `dionysus shake`: the interactive shaker on stdin.

use std::io::BufRead;
use std::sync::Arc;

use anyhow::Result;
use dionysus::session::{CommandSender, Notice, SessionCommand, SessionUpdate, ShakerSession};
use dionysus::{Catalog, RecipeService, UserStore};

use crate::render;
use crate::OutputFormat;

pub const HELP: &str = "\
Commands:
  + <ingredient>     add an ingredient you own
  - <ingredient>     remove an ingredient
  tag <tag>          toggle a tag filter
  strength <0-5>     minimum strength
  sort               flip strength sort direction
  favs               show only favorites
  fav <recipe>       toggle a favorite
  buy <ingredient>   add to the shopping list
  lucky              pick something to make
  help               show this help
  quit               leave";

/// Parse one input line. `Ok(None)` means the line needs no session command.
pub fn parse_command(line: &str, catalog: &Catalog) -> std::result::Result<Option<SessionCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, arg) = if let Some(rest) = line.strip_prefix('+') {
        ("+", rest.trim())
    } else if let Some(rest) = line.strip_prefix('-') {
        ("-", rest.trim())
    } else {
        match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        }
    };

    let ingredient = |arg: &str| -> std::result::Result<String, String> {
        catalog
            .resolve_ingredient(arg)
            .map(|i| i.id.clone())
            .ok_or_else(|| format!("Unknown ingredient: {}", arg))
    };
    let require = |arg: &str, what: &str| -> std::result::Result<(), String> {
        if arg.is_empty() {
            Err(format!("Missing {}", what))
        } else {
            Ok(())
        }
    };

    let command = match verb {
        "+" | "add" => {
            require(arg, "ingredient")?;
            SessionCommand::AddIngredient(ingredient(arg)?)
        }
        "-" | "remove" | "rm" => {
            require(arg, "ingredient")?;
            SessionCommand::RemoveIngredient(ingredient(arg)?)
        }
        "tag" => {
            require(arg, "tag")?;
            let tag = catalog
                .resolve_tag(arg)
                .ok_or_else(|| format!("Unknown tag: {}", arg))?;
            SessionCommand::ToggleTag(tag.id.clone())
        }
        "strength" => {
            let strength: u8 = arg
                .parse()
                .map_err(|_| format!("Strength must be 0-5, got {:?}", arg))?;
            SessionCommand::SetMinStrength(strength)
        }
        "sort" => SessionCommand::ToggleSort,
        "favs" => SessionCommand::ToggleFavoritesOnly,
        "fav" => {
            require(arg, "recipe id")?;
            SessionCommand::ToggleFavorite(arg.to_string())
        }
        "buy" => {
            require(arg, "ingredient")?;
            SessionCommand::AddToShoppingList(ingredient(arg)?)
        }
        "lucky" => SessionCommand::Lucky,
        "quit" | "q" | "exit" => SessionCommand::Quit,
        other => return Err(format!("Unknown command: {} (try 'help')", other)),
    };
    Ok(Some(command))
}

fn read_commands(commands: CommandSender, catalog: Arc<Catalog>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim() == "help" {
            eprintln!("{}", HELP);
            continue;
        }
        match parse_command(&line, &catalog) {
            Ok(Some(command)) => {
                let quit = command == SessionCommand::Quit;
                if !commands.send(command) || quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(message) => eprintln!("{}", message),
        }
    }
    // End of input: let any pending refresh land, then stop
    commands.send(SessionCommand::Drain);
}

pub fn run(
    service: Arc<dyn RecipeService>,
    catalog: Catalog,
    store: &mut UserStore,
    debounce: std::time::Duration,
    format: OutputFormat,
) -> Result<()> {
    let catalog = Arc::new(catalog);
    let session = ShakerSession::new(service, store, debounce);
    let commands = session.commands();

    let reader_catalog = Arc::clone(&catalog);
    std::thread::spawn(move || read_commands(commands, reader_catalog));

    if format == OutputFormat::Text {
        eprintln!("{}", HELP);
    }

    let mut failure: Option<anyhow::Error> = None;
    session.run(|update| {
        if failure.is_some() {
            return;
        }
        if let Err(e) = print_update(update, &catalog, format) {
            failure = Some(e);
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn print_update(update: &SessionUpdate, catalog: &Catalog, format: OutputFormat) -> Result<()> {
    if format != OutputFormat::Text {
        // One JSON object per line
        println!("{}", serde_json::to_string(update)?);
        return Ok(());
    }

    if let Some(notice) = &update.notice {
        println!("{}", notice_text(notice, catalog));
    }

    let owned: Vec<&str> = update
        .filter
        .owned_ingredient_ids
        .iter()
        .map(|id| catalog.ingredient_name(id))
        .collect();
    println!(
        "\nHave: {}  |  min strength {}  |  sort {}{}{}",
        if owned.is_empty() { "nothing yet".to_string() } else { owned.join(", ") },
        update.filter.min_strength,
        update.sort,
        if update.favorites_only { "  |  favorites only" } else { "" },
        if update.loading { "  |  shaking..." } else { "" },
    );

    if !update.loading && !owned.is_empty() {
        let favorites = update.favorites.iter().cloned().collect();
        print!(
            "{}",
            render::curation(&update.view, &update.recommendations, catalog, &favorites)
        );
    }
    Ok(())
}

fn notice_text(notice: &Notice, catalog: &Catalog) -> String {
    match notice {
        Notice::Lucky { recipe, exact: true } => format!("🎲 Make a {} [{}]", recipe.title, recipe.id),
        Notice::Lucky { recipe, exact: false } => format!(
            "🎲 Nothing is ready yet. Buy {} and make a {} [{}]",
            catalog.missing_name(recipe.missing_ingredients.as_deref()),
            recipe.title,
            recipe.id
        ),
        Notice::NoCandidates => "Nothing to pick from yet. Add more ingredients.".to_string(),
        Notice::Favorite { recipe_id, favorite } => {
            if *favorite {
                format!("★ Saved {} to favorites", recipe_id)
            } else {
                format!("Removed {} from favorites", recipe_id)
            }
        }
        Notice::ShoppingList { ingredient_id, added } => {
            let name = catalog.ingredient_name(ingredient_id);
            if *added {
                format!("Added {} to the shopping list", name)
            } else {
                format!("{} is already on the shopping list", name)
            }
        }
        Notice::RequestFailed { message } => format!("Could not reach the recipe service: {}", message),
    }
}
