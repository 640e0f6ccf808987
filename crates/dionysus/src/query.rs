//! Debounced match query.
//!
//! [`MatchQuery`] holds the filter the user is editing (owned ingredients,
//! minimum strength, selected tags) and the last match list received for it.
//! It performs no I/O and reads no clock: callers pass the current instant
//! in, take [`MatchTicket`]s out when a refresh is due, run them against a
//! [`RecipeService`](crate::RecipeService), and hand the outcome back.
//!
//! # Ordering
//!
//! - Every mutation restarts the quiet period; a ticket is issued only once
//!   the filter has been left alone for the whole debounce window.
//! - Tickets carry a monotonically increasing sequence number. A result is
//!   applied only if its ticket is the latest one issued and no mutation has
//!   happened since. Anything else is stale and dropped, whatever order the
//!   responses arrive in.
//! - An empty owned set clears the results immediately without a request.
//!
//! # Example
//! ```ignore
//! let mut query = MatchQuery::new(Duration::from_millis(300));
//! query.toggle_owned("gin", Instant::now());
//!
//! if let Some(ticket) = query.poll(Instant::now()) {
//!     let outcome = service.match_cocktails(&ticket.request);
//!     query.apply(ticket.seq, outcome);
//! }
//! ```

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::service::MatchRequest;
use crate::{DionysusError, MatchResult, Result};

/// Default quiet period before a changed filter is sent
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Highest minimum-strength filter the API understands
pub const MAX_STRENGTH: u8 = 5;

/// Trailing-edge debounce timer driven by caller-supplied instants.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record activity at `now`, pushing the deadline out by a full window.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the pending deadline if it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// The filter the user is editing. Id lists behave as sets and keep
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchFilter {
    pub owned_ingredient_ids: Vec<String>,
    pub selected_tag_ids: Vec<String>,
    pub min_strength: u8,
}

impl MatchFilter {
    pub fn to_request(&self) -> MatchRequest {
        MatchRequest {
            owned_ingredient_ids: self.owned_ingredient_ids.clone(),
            min_strength: self.min_strength,
            tag_ids: self.selected_tag_ids.clone(),
        }
    }

    pub fn owns(&self, ingredient_id: &str) -> bool {
        self.owned_ingredient_ids.iter().any(|id| id == ingredient_id)
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.selected_tag_ids.iter().any(|id| id == tag_id)
    }
}

/// A match request that is due to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTicket {
    pub seq: u64,
    pub request: MatchRequest,
}

/// What [`MatchQuery::apply`] did with a result.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The match list was replaced
    Updated { count: usize },
    /// The request failed; the match list was cleared
    Failed(DionysusError),
    /// A newer ticket or mutation superseded this one; nothing changed
    Stale,
}

/// Filter state plus the debounced match list for it.
#[derive(Debug)]
pub struct MatchQuery {
    filter: MatchFilter,
    matches: Vec<MatchResult>,
    loading: bool,
    debouncer: Debouncer,
    /// Sequence number of the last issued ticket
    issued: u64,
    /// Tickets below this sequence number are stale
    accept_from: u64,
}

impl Default for MatchQuery {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl MatchQuery {
    pub fn new(window: Duration) -> Self {
        Self {
            filter: MatchFilter::default(),
            matches: Vec::new(),
            loading: false,
            debouncer: Debouncer::new(window),
            issued: 0,
            accept_from: 1,
        }
    }

    pub fn filter(&self) -> &MatchFilter {
        &self.filter
    }

    /// The last applied match list.
    pub fn matches(&self) -> &[MatchResult] {
        &self.matches
    }

    /// True from a scheduling mutation until its request resolves.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// When the pending refresh becomes due, if one is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Replace the owned ingredient set.
    pub fn set_owned<I, S>(&mut self, ids: I, now: Instant)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.owned_ingredient_ids.clear();
        for id in ids {
            let id = id.into();
            if !self.filter.owns(&id) {
                self.filter.owned_ingredient_ids.push(id);
            }
        }
        self.schedule(now);
    }

    /// Add or remove one owned ingredient. Returns whether it is now owned.
    pub fn toggle_owned(&mut self, ingredient_id: &str, now: Instant) -> bool {
        let owned = toggle(&mut self.filter.owned_ingredient_ids, ingredient_id);
        self.schedule(now);
        owned
    }

    /// Set the minimum strength, clamped to `0..=MAX_STRENGTH`.
    pub fn set_min_strength(&mut self, strength: u8, now: Instant) {
        self.filter.min_strength = strength.min(MAX_STRENGTH);
        self.schedule(now);
    }

    /// Select or deselect one tag. Returns whether it is now selected.
    pub fn toggle_tag(&mut self, tag_id: &str, now: Instant) -> bool {
        let selected = toggle(&mut self.filter.selected_tag_ids, tag_id);
        self.schedule(now);
        selected
    }

    fn schedule(&mut self, now: Instant) {
        // Whatever is already in flight now answers an outdated filter
        self.accept_from = self.issued + 1;

        if self.filter.owned_ingredient_ids.is_empty() {
            self.debouncer.cancel();
            self.matches.clear();
            self.loading = false;
            tracing::debug!("No owned ingredients; cleared matches without a request");
            return;
        }

        self.debouncer.touch(now);
        self.loading = true;
    }

    /// Issue a ticket if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<MatchTicket> {
        if !self.debouncer.fire(now) {
            return None;
        }

        self.issued += 1;
        tracing::debug!(
            "Issuing match request #{} for {} ingredients",
            self.issued,
            self.filter.owned_ingredient_ids.len()
        );
        Some(MatchTicket {
            seq: self.issued,
            request: self.filter.to_request(),
        })
    }

    /// Apply the outcome of ticket `seq`.
    pub fn apply(&mut self, seq: u64, outcome: Result<Vec<MatchResult>>) -> RefreshOutcome {
        if seq < self.accept_from || seq != self.issued {
            tracing::debug!(
                "Discarding stale match response #{} (latest #{})",
                seq,
                self.issued
            );
            return RefreshOutcome::Stale;
        }

        // A ticket resolves once
        self.accept_from = seq + 1;
        self.loading = false;

        match outcome {
            Ok(results) => {
                for result in &results {
                    for violation in result.check_invariants() {
                        tracing::warn!("Inconsistent match result: {}", violation);
                    }
                }
                let count = results.len();
                self.matches = results;
                RefreshOutcome::Updated { count }
            }
            Err(e) => {
                tracing::warn!("Match request #{} failed: {}", seq, e);
                self.matches.clear();
                RefreshOutcome::Failed(e)
            }
        }
    }
}

/// Insert `id` if absent, remove it if present. Returns whether it is now present.
fn toggle(ids: &mut Vec<String>, id: &str) -> bool {
    if let Some(pos) = ids.iter().position(|existing| existing == id) {
        ids.remove(pos);
        false
    } else {
        ids.push(id.to_string());
        true
    }
}
