//! Per-query page storage.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorInfo, QueryError};
use crate::page::{Page, PageToken};

/// Fetch status of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// No fetch has been issued yet.
    Idle,
    /// The first page is being fetched.
    Fetching,
    /// A subsequent page is being fetched.
    FetchingNext,
    /// The last fetch succeeded.
    Success,
    /// The last fetch failed; already-loaded pages are preserved.
    Error,
}

impl QueryStatus {
    /// Whether a fetch is currently in flight.
    pub fn is_fetching(&self) -> bool {
        matches!(self, Self::Fetching | Self::FetchingNext)
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Fetching => write!(f, "fetching"),
            Self::FetchingNext => write!(f, "fetching-next"),
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Cached state of one paginated query.
///
/// `pages` is append-only while the status moves through the fetching
/// states; a reset replaces the whole state and bumps the generation so
/// that late completions of superseded fetches are discarded.
#[derive(Debug, Clone)]
pub struct QueryState<T> {
    /// Fetched pages, in fetch order (equals display order).
    pub pages: Vec<Page<T>>,
    /// Current fetch status.
    pub status: QueryStatus,
    /// Failure details when `status` is `Error`.
    pub error: Option<ErrorInfo>,
    /// Server-reported total item count across all pages.
    pub total_count: Option<u64>,
    /// Epoch milliseconds of the last successful page delivery.
    pub last_updated: u64,
    generation: u64,
    scoped: bool,
}

impl<T> QueryState<T> {
    fn new(generation: u64) -> Self {
        Self {
            pages: Vec::new(),
            status: QueryStatus::Idle,
            error: None,
            total_count: None,
            last_updated: now_millis(),
            generation,
            scoped: false,
        }
    }

    /// A detached idle state, returned for keys the cache has never seen.
    pub(crate) fn idle() -> Self {
        Self::new(0)
    }

    /// A state seeded from a previously captured first page.
    pub(crate) fn seeded(
        pages: Vec<Page<T>>,
        status: QueryStatus,
        error: Option<ErrorInfo>,
        total_count: Option<u64>,
        last_updated: u64,
    ) -> Self {
        Self {
            pages,
            status,
            error,
            total_count,
            last_updated,
            generation: 0,
            scoped: false,
        }
    }

    /// Cursor for the next page, taken from the most recent page.
    pub fn next_token(&self) -> Option<&PageToken> {
        self.pages.last().and_then(|p| p.next_token.as_ref())
    }

    /// Whether more pages can be fetched.
    pub fn has_next_page(&self) -> bool {
        self.next_token().is_some()
    }

    /// Whether the entry is older than the given staleness window.
    pub fn is_stale(&self, window: Duration) -> bool {
        now_millis().saturating_sub(self.last_updated) > window.as_millis() as u64
    }

    /// The last fetch failure as a typed [`QueryError::Fetch`], when
    /// `status` is `Error`.
    pub fn failure(&self) -> Option<QueryError> {
        self.error.clone().map(QueryError::Fetch)
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T: Clone> QueryState<T> {
    /// Concatenate all pages' items in fetch order. Pure projection.
    pub fn flatten(&self) -> Vec<T> {
        self.pages.iter().flat_map(|p| p.items.iter().cloned()).collect()
    }
}

/// Keyed storage for [`QueryState`] entries with LRU access order.
///
/// Append is the only mutation of `pages`; it is rejected when the
/// page's own cursor does not match the currently expected one, so a
/// stale delivery can never corrupt page order.
pub(crate) struct PageStore<T> {
    entries: HashMap<String, QueryState<T>>,
    order: Vec<String>,
    next_generation: u64,
}

impl<T> PageStore<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            next_generation: 1,
        }
    }

    fn fresh_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    pub fn get(&self, id: &str) -> Option<&QueryState<T>> {
        self.entries.get(id)
    }

    pub fn generation_of(&self, id: &str) -> Option<u64> {
        self.entries.get(id).map(QueryState::generation)
    }

    /// Move `id` to the most-recently-used position.
    pub fn touch(&mut self, id: &str) {
        if let Some(pos) = self.order.iter().position(|o| o == id) {
            let id = self.order.remove(pos);
            self.order.push(id);
        }
    }

    /// Mark a fetch as started, creating the entry if needed.
    ///
    /// Returns the generation the completion must present to be applied.
    pub fn begin_fetch(&mut self, id: &str, phase: QueryStatus) -> u64 {
        let generation = match self.entries.get_mut(id) {
            Some(state) => {
                state.status = phase;
                state.error = None;
                state.generation
            }
            None => {
                let generation = self.fresh_generation();
                let mut state = QueryState::new(generation);
                state.status = phase;
                self.entries.insert(id.to_string(), state);
                self.order.push(id.to_string());
                generation
            }
        };
        self.touch(id);
        generation
    }

    /// Install a freshly fetched first page, replacing any previous
    /// pages (the revalidation path for stale entries).
    pub fn replace_first(&mut self, id: &str, page: Page<T>) {
        if let Some(state) = self.entries.get_mut(id) {
            state.total_count = page.total_count.or(state.total_count);
            state.pages = vec![page];
            state.status = QueryStatus::Success;
            state.error = None;
            state.last_updated = now_millis();
        }
    }

    /// Append a subsequent page.
    ///
    /// Rejected with [`QueryError::OutOfOrderAppend`] when the page's
    /// `self_token` does not match the state's current `next_token`.
    pub fn append(&mut self, id: &str, page: Page<T>) -> Result<(), QueryError> {
        let Some(state) = self.entries.get_mut(id) else {
            return Err(QueryError::OutOfOrderAppend {
                expected: None,
                got: page.self_token.as_ref().map(ToString::to_string),
            });
        };
        let expected = state.next_token().cloned();
        if page.self_token != expected {
            return Err(QueryError::OutOfOrderAppend {
                expected: expected.as_ref().map(ToString::to_string),
                got: page.self_token.as_ref().map(ToString::to_string),
            });
        }
        state.total_count = page.total_count.or(state.total_count);
        state.pages.push(page);
        state.status = QueryStatus::Success;
        state.error = None;
        state.last_updated = now_millis();
        Ok(())
    }

    /// Record a failed fetch. Pages are left untouched so a retry can
    /// re-enter the transition that failed.
    pub fn settle_error(&mut self, id: &str, error: ErrorInfo) {
        if let Some(state) = self.entries.get_mut(id) {
            state.status = QueryStatus::Error;
            state.error = Some(error);
        }
    }

    /// Return a fetching entry to its last settled status after a
    /// discarded delivery.
    pub fn rollback(&mut self, id: &str) {
        if let Some(state) = self.entries.get_mut(id) {
            state.status = if state.pages.is_empty() {
                QueryStatus::Idle
            } else {
                QueryStatus::Success
            };
            state.error = None;
        }
    }

    /// Replace the entry with a fresh idle state under a new generation.
    pub fn reset(&mut self, id: &str) {
        let generation = self.fresh_generation();
        if let Some(state) = self.entries.get_mut(id) {
            *state = QueryState::new(generation);
        }
    }

    /// Install a seeded entry if the key has never been written.
    ///
    /// Returns `false` without touching anything when an entry already
    /// exists (first writer wins).
    pub fn insert_seeded(&mut self, id: &str, mut state: QueryState<T>) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        state.generation = self.fresh_generation();
        self.entries.insert(id.to_string(), state);
        self.order.push(id.to_string());
        true
    }

    /// Tie the entry to the transient navigation scope.
    pub fn mark_scoped(&mut self, id: &str) {
        if let Some(state) = self.entries.get_mut(id) {
            state.scoped = true;
        }
    }

    /// Evict every scope-tied entry, returning the evicted ids.
    pub fn evict_scoped(&mut self) -> Vec<String> {
        let evicted: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, s)| s.scoped)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &evicted {
            self.entries.remove(id);
            self.order.retain(|o| o != id);
        }
        evicted
    }

    /// Evict least-recently-used entries beyond `max`, skipping any
    /// with a fetch in flight.
    pub fn evict_over(&mut self, max: usize) {
        while self.entries.len() > max {
            let victim = self
                .order
                .iter()
                .find(|id| {
                    self.entries
                        .get(*id)
                        .map(|s| !s.status.is_fetching())
                        .unwrap_or(true)
                })
                .cloned();
            let Some(id) = victim else { break };
            self.entries.remove(&id);
            self.order.retain(|o| o != &id);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
