//! Durable user state: favorite recipes and the shopping list.
//!
//! The state is loaded from the key-value store on first access and the full
//! snapshot is written back after every change. A missing or unreadable record
//! starts the user with empty lists.

use std::cell::OnceCell;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::storage::KeyValueStore;

/// Key the snapshot is stored under.
pub const STORAGE_KEY: &str = "dionysus_user_store_v1";

/// Persisted user state. Both lists behave as sets and keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    #[serde(default)]
    pub favorites: Vec<String>,
    #[serde(default, rename = "shoppingList")]
    pub shopping_list: Vec<String>,
}

impl UserState {
    /// Drop duplicate ids, keeping the first occurrence.
    fn normalized(mut self) -> Self {
        dedup_in_order(&mut self.favorites);
        dedup_in_order(&mut self.shopping_list);
        self
    }
}

fn dedup_in_order(ids: &mut Vec<String>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
}

/// The user's favorites and shopping list, mirrored to durable storage.
pub struct UserStore {
    storage: Box<dyn KeyValueStore>,
    state: OnceCell<UserState>,
}

impl UserStore {
    /// Create a store that reads the persisted record on first access.
    pub fn open_lazy(storage: impl KeyValueStore + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            state: OnceCell::new(),
        }
    }

    /// Create a store and read the persisted record immediately.
    pub fn load(storage: impl KeyValueStore + 'static) -> Self {
        let store = Self::open_lazy(storage);
        store.state();
        store
    }

    /// Whether the persisted record has been read yet.
    pub fn is_loaded(&self) -> bool {
        self.state.get().is_some()
    }

    pub fn state(&self) -> &UserState {
        self.state.get_or_init(|| read_state(self.storage.as_ref()))
    }

    pub fn favorites(&self) -> &[String] {
        &self.state().favorites
    }

    pub fn shopping_list(&self) -> &[String] {
        &self.state().shopping_list
    }

    /// Favorites as a set, for curation lookups.
    pub fn favorite_set(&self) -> HashSet<String> {
        self.favorites().iter().cloned().collect()
    }

    pub fn is_favorite(&self, recipe_id: &str) -> bool {
        self.favorites().iter().any(|id| id == recipe_id)
    }

    pub fn is_in_shopping_list(&self, ingredient_id: &str) -> bool {
        self.shopping_list().iter().any(|id| id == ingredient_id)
    }

    /// Flip a recipe's favorite flag. Returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, recipe_id: &str) -> bool {
        self.update(|state| {
            if let Some(pos) = state.favorites.iter().position(|id| id == recipe_id) {
                state.favorites.remove(pos);
            } else {
                state.favorites.push(recipe_id.to_string());
            }
            true
        });
        self.is_favorite(recipe_id)
    }

    /// Add an ingredient to the shopping list. Returns false if it was already there.
    pub fn add_to_shopping_list(&mut self, ingredient_id: &str) -> bool {
        self.update(|state| {
            if state.shopping_list.iter().any(|id| id == ingredient_id) {
                return false;
            }
            state.shopping_list.push(ingredient_id.to_string());
            true
        })
    }

    /// Remove an ingredient from the shopping list. Returns false if it was absent.
    pub fn remove_from_shopping_list(&mut self, ingredient_id: &str) -> bool {
        self.update(|state| {
            let before = state.shopping_list.len();
            state.shopping_list.retain(|id| id != ingredient_id);
            state.shopping_list.len() != before
        })
    }

    /// Empty the shopping list. Returns the number of items removed.
    pub fn clear_shopping_list(&mut self) -> usize {
        let count = self.shopping_list().len();
        self.update(|state| {
            state.shopping_list.clear();
            count > 0
        });
        count
    }

    /// Shopping list as newline-separated ingredient names, in insertion order.
    pub fn shopping_list_text(&self, catalog: &Catalog) -> String {
        self.shopping_list()
            .iter()
            .map(|id| catalog.ingredient_name(id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Apply a change in memory, then persist the snapshot if anything changed.
    fn update<F>(&mut self, change: F) -> bool
    where
        F: FnOnce(&mut UserState) -> bool,
    {
        let mut state = match self.state.take() {
            Some(state) => state,
            None => read_state(self.storage.as_ref()),
        };

        let changed = change(&mut state);
        if changed {
            write_state(self.storage.as_ref(), &state);
        }

        self.state = OnceCell::from(state);
        changed
    }
}

fn read_state(storage: &dyn KeyValueStore) -> UserState {
    let raw = match storage.get(STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!("No saved user state; starting empty");
            return UserState::default();
        }
        Err(e) => {
            tracing::warn!("Failed to read user state: {}", e);
            return UserState::default();
        }
    };

    match serde_json::from_str::<UserState>(&raw) {
        Ok(state) => {
            let state = state.normalized();
            tracing::info!(
                "Loaded user state: {} favorites, {} shopping list items",
                state.favorites.len(),
                state.shopping_list.len()
            );
            state
        }
        Err(e) => {
            tracing::warn!("Failed to parse user state, starting empty: {}", e);
            UserState::default()
        }
    }
}

fn write_state(storage: &dyn KeyValueStore, state: &UserState) {
    let json = match serde_json::to_string(state) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize user state: {}", e);
            return;
        }
    };
    if let Err(e) = storage.set(STORAGE_KEY, &json) {
        tracing::error!("Failed to save user state: {}", e);
    }
}
