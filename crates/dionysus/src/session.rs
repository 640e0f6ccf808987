//! Interactive shaker session.
//!
//! A [`ShakerSession`] drives a [`MatchQuery`] in real time. One loop thread
//! owns all state: it receives commands and fetch results over a single
//! channel, waits no longer than the next debounce deadline, and sends due
//! tickets to short-lived worker threads. Results may come back in any order;
//! the query's sequence guard decides which ones count.
//!
//! # Example
//! ```ignore
//! let session = ShakerSession::new(service, &mut store, config.debounce());
//! let commands = session.commands();
//! std::thread::spawn(move || read_stdin_into(commands));
//! session.run(|update| render(update));
//! ```

use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::curate::CurationOptions;
use crate::query::{MatchFilter, MatchTicket, RefreshOutcome};
use crate::service::RecipeService;
use crate::{
    curate, feeling_lucky, recommend, CurationView, LuckyPick, MatchQuery, MatchResult,
    Recommendations, Result, SortDirection, UserStore,
};

/// Something the user asked the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    AddIngredient(String),
    RemoveIngredient(String),
    ToggleIngredient(String),
    ToggleTag(String),
    SetMinStrength(u8),
    ToggleSort,
    ToggleFavoritesOnly,
    ToggleFavorite(String),
    Lucky,
    AddToShoppingList(String),
    /// Finish any pending refresh, then stop.
    Drain,
    Quit,
}

/// One-off feedback attached to an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    Lucky { recipe: MatchResult, exact: bool },
    NoCandidates,
    Favorite { recipe_id: String, favorite: bool },
    ShoppingList { ingredient_id: String, added: bool },
    RequestFailed { message: String },
}

/// Everything a front end needs to redraw after a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUpdate {
    pub filter: MatchFilter,
    pub sort: SortDirection,
    pub favorites_only: bool,
    pub loading: bool,
    pub view: CurationView,
    pub recommendations: Recommendations,
    pub favorites: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

enum Event {
    Command(SessionCommand),
    Fetched {
        seq: u64,
        outcome: Result<Vec<MatchResult>>,
    },
}

/// Sends commands into a running session.
#[derive(Clone)]
pub struct CommandSender(Sender<Event>);

impl CommandSender {
    /// Returns false once the session has stopped.
    pub fn send(&self, command: SessionCommand) -> bool {
        self.0.send(Event::Command(command)).is_ok()
    }
}

pub struct ShakerSession<'a> {
    service: Arc<dyn RecipeService>,
    store: &'a mut UserStore,
    query: MatchQuery,
    options: CurationOptions,
    rng: StdRng,
    sender: Sender<Event>,
    inbox: Receiver<Event>,
}

impl<'a> ShakerSession<'a> {
    pub fn new(service: Arc<dyn RecipeService>, store: &'a mut UserStore, debounce: Duration) -> Self {
        let (sender, inbox) = channel();
        Self {
            service,
            store,
            query: MatchQuery::new(debounce),
            options: CurationOptions::default(),
            rng: StdRng::from_entropy(),
            sender,
            inbox,
        }
    }

    /// Use a fixed seed for feeling-lucky picks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn commands(&self) -> CommandSender {
        CommandSender(self.sender.clone())
    }

    /// Run until [`SessionCommand::Quit`], or until the query settles after
    /// [`SessionCommand::Drain`], calling `on_update` after every handled
    /// command and every applied fetch result.
    pub fn run<F>(mut self, mut on_update: F)
    where
        F: FnMut(&SessionUpdate),
    {
        let mut draining = false;
        loop {
            if let Some(ticket) = self.query.poll(Instant::now()) {
                self.dispatch(ticket);
            }
            if draining && self.query.next_deadline().is_none() && !self.query.is_loading() {
                break;
            }

            let received = match self.query.next_deadline() {
                Some(deadline) => self
                    .inbox
                    .recv_timeout(deadline.saturating_duration_since(Instant::now())),
                None => self.inbox.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            let notice = match received {
                Ok(Event::Command(SessionCommand::Quit)) => break,
                Ok(Event::Command(SessionCommand::Drain)) => {
                    draining = true;
                    continue;
                }
                Ok(Event::Command(command)) => self.handle(command, Instant::now()),
                Ok(Event::Fetched { seq, outcome }) => match self.receive(seq, outcome) {
                    Some(notice) => Some(notice),
                    None if self.query.is_loading() => continue,
                    None => None,
                },
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            };

            on_update(&self.update(notice));
        }
        tracing::debug!("Shaker session finished");
    }

    fn dispatch(&self, ticket: MatchTicket) {
        let service = Arc::clone(&self.service);
        let sender = self.sender.clone();
        std::thread::spawn(move || {
            let outcome = service.match_cocktails(&ticket.request);
            // The session may already be gone
            let _ = sender.send(Event::Fetched {
                seq: ticket.seq,
                outcome,
            });
        });
    }

    /// Apply one command. Filter changes only schedule a refresh.
    fn handle(&mut self, command: SessionCommand, now: Instant) -> Option<Notice> {
        match command {
            SessionCommand::AddIngredient(id) => {
                if !self.query.filter().owns(&id) {
                    self.query.toggle_owned(&id, now);
                }
                None
            }
            SessionCommand::RemoveIngredient(id) => {
                if self.query.filter().owns(&id) {
                    self.query.toggle_owned(&id, now);
                }
                None
            }
            SessionCommand::ToggleIngredient(id) => {
                self.query.toggle_owned(&id, now);
                None
            }
            SessionCommand::ToggleTag(id) => {
                self.query.toggle_tag(&id, now);
                None
            }
            SessionCommand::SetMinStrength(strength) => {
                self.query.set_min_strength(strength, now);
                None
            }
            SessionCommand::ToggleSort => {
                self.options.sort = self.options.sort.toggled();
                None
            }
            SessionCommand::ToggleFavoritesOnly => {
                self.options.favorites_only = !self.options.favorites_only;
                None
            }
            SessionCommand::ToggleFavorite(recipe_id) => {
                let favorite = self.store.toggle_favorite(&recipe_id);
                Some(Notice::Favorite {
                    recipe_id,
                    favorite,
                })
            }
            SessionCommand::AddToShoppingList(ingredient_id) => {
                let added = self.store.add_to_shopping_list(&ingredient_id);
                Some(Notice::ShoppingList {
                    ingredient_id,
                    added,
                })
            }
            SessionCommand::Lucky => {
                let view = self.view();
                Some(match feeling_lucky(&view, &mut self.rng) {
                    LuckyPick::Exact(recipe) => Notice::Lucky {
                        recipe: recipe.clone(),
                        exact: true,
                    },
                    LuckyPick::NearMiss(recipe) => Notice::Lucky {
                        recipe: recipe.clone(),
                        exact: false,
                    },
                    LuckyPick::NoCandidates => Notice::NoCandidates,
                })
            }
            SessionCommand::Drain | SessionCommand::Quit => None,
        }
    }

    /// Feed a fetch result to the query. Stale results produce no notice and
    /// leave the view untouched.
    fn receive(&mut self, seq: u64, outcome: Result<Vec<MatchResult>>) -> Option<Notice> {
        match self.query.apply(seq, outcome) {
            RefreshOutcome::Failed(e) => Some(Notice::RequestFailed {
                message: e.to_string(),
            }),
            RefreshOutcome::Updated { .. } | RefreshOutcome::Stale => None,
        }
    }

    fn view(&self) -> CurationView {
        let favorites: HashSet<String> = self.store.favorite_set();
        curate(self.query.matches(), self.options, &favorites)
    }

    fn update(&self, notice: Option<Notice>) -> SessionUpdate {
        let view = self.view();
        let recommendations = recommend(&view.near_misses);
        SessionUpdate {
            filter: self.query.filter().clone(),
            sort: self.options.sort,
            favorites_only: self.options.favorites_only,
            loading: self.query.is_loading(),
            view,
            recommendations,
            favorites: self.store.favorites().to_vec(),
            notice,
        }
    }
}
