//! Dehydrate a prefetching cache, rehydrate a client-side one.

use reel_query::{Page, QueryClient, QueryKey, QueryStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::state::{DehydratedQuery, DehydratedState};

/// Options for [`dehydrate_with`].
///
/// Errored queries are excluded by default so the client retries them
/// with a loading state instead of rendering a server-side failure;
/// opt in when an error page with a correct status code is wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DehydrateOptions {
    include_errors: bool,
}

impl DehydrateOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also capture queries that settled in an error state.
    pub fn include_errors(mut self, include: bool) -> Self {
        self.include_errors = include;
        self
    }
}

/// Capture the given keys from a prefetching cache.
///
/// Only the first page is captured: subsequent pages are never
/// prefetched server-side. Keys with no entry or a non-`Success`
/// status are skipped.
pub fn dehydrate<T>(client: &QueryClient<T>, keys: &[QueryKey]) -> DehydratedState
where
    T: Serialize + Clone + 'static,
{
    dehydrate_with(client, keys, DehydrateOptions::default())
}

/// [`dehydrate`] with explicit options.
pub fn dehydrate_with<T>(
    client: &QueryClient<T>,
    keys: &[QueryKey],
    options: DehydrateOptions,
) -> DehydratedState
where
    T: Serialize + Clone + 'static,
{
    let mut queries = Vec::new();
    for key in keys {
        let Some(state) = client.state(key) else {
            continue;
        };
        match state.status {
            QueryStatus::Success => {}
            QueryStatus::Error if options.include_errors => {
                if let Some(error) = state.error.clone() {
                    queries.push(DehydratedQuery {
                        key: key.serialized(),
                        items: Vec::new(),
                        self_token: None,
                        next_token: None,
                        total_count: None,
                        last_updated: state.last_updated,
                        error: Some(error),
                    });
                }
                continue;
            }
            _ => continue,
        }
        let Some(first) = state.pages.first() else {
            continue;
        };

        let mut items = Vec::with_capacity(first.items.len());
        let mut erased_all = true;
        for item in &first.items {
            match serde_json::to_value(item) {
                Ok(value) => items.push(value),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "skipping query with unserializable items");
                    erased_all = false;
                    break;
                }
            }
        }
        if !erased_all {
            continue;
        }

        queries.push(DehydratedQuery {
            key: key.serialized(),
            items,
            self_token: first.self_token.clone(),
            next_token: first.next_token.clone(),
            total_count: state.total_count,
            last_updated: state.last_updated,
            error: None,
        });
    }
    DehydratedState { queries }
}

/// Seed a client-side cache from a snapshot.
///
/// First writer wins: keys the client has already begun or finished
/// fetching are left untouched, and reapplying the same snapshot is a
/// no-op, so no duplicate pages or doubled counts can appear. Entries
/// whose key fails to parse or whose items do not deserialize into `T`
/// are skipped; the rest proceed. Returns the number of entries
/// installed.
pub fn hydrate<T>(client: &QueryClient<T>, snapshot: &DehydratedState) -> usize
where
    T: DeserializeOwned + Clone + 'static,
{
    let mut installed = 0;
    for entry in &snapshot.queries {
        let key = match QueryKey::parse(&entry.key) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(key = %entry.key, error = %e, "skipping hydration entry with unparseable key");
                continue;
            }
        };

        if let Some(error) = entry.error.clone() {
            if client.seed_error(&key, error, entry.last_updated) {
                installed += 1;
            }
            continue;
        }

        let items: Result<Vec<T>, _> = entry
            .items
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect();
        let items = match items {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key = %entry.key, error = %e, "skipping hydration entry with mismatched items");
                continue;
            }
        };

        let mut page = Page::new(items);
        page.self_token = entry.self_token.clone();
        page.next_token = entry.next_token.clone();
        page.total_count = entry.total_count;

        if client.seed_success(&key, page, entry.total_count, entry.last_updated) {
            installed += 1;
        }
    }
    installed
}
