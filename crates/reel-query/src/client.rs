//! The pagination controller.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;

use crate::error::ErrorInfo;
use crate::fetch::PageFetcher;
use crate::key::QueryKey;
use crate::navigation::{NavigationEvents, NavigationSubscription};
use crate::observe::{ObserverRegistry, Subscription};
use crate::page::{Page, PageToken};
use crate::policy::QueryClientConfig;
use crate::store::{PageStore, QueryState, QueryStatus};

type SharedFetch = Shared<LocalBoxFuture<'static, ()>>;

/// Cache context owning every [`QueryState`] for its lifetime.
///
/// Constructed once per client session, or per request during
/// server-side prefetch; explicitly passed around, never a global.
/// Cloning is cheap and shares the same cache.
///
/// All mutations happen on one logical thread; fetches suspend at the
/// [`PageFetcher`] boundary and their completions are serialized back
/// onto the same thread, so mutual exclusion is structural. Concurrent
/// callers for the same key while a fetch is outstanding share one
/// in-flight future and a single network call is issued.
pub struct QueryClient<T> {
    inner: Rc<ClientInner<T>>,
}

impl<T> Clone for QueryClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct ClientInner<T> {
    fetcher: Rc<dyn PageFetcher<T>>,
    config: QueryClientConfig,
    store: RefCell<PageStore<T>>,
    inflight: RefCell<HashMap<String, SharedFetch>>,
    observers: RefCell<ObserverRegistry>,
}

impl<T> ClientInner<T> {
    fn notify(&self, id: &str) {
        let callbacks = self.observers.borrow().callbacks_for(id);
        for callback in callbacks {
            callback();
        }
    }
}

impl<T: Clone + 'static> QueryClient<T> {
    /// Create a client with the default invalidation policy.
    pub fn new(fetcher: impl PageFetcher<T> + 'static) -> Self {
        Self::with_config(fetcher, QueryClientConfig::default())
    }

    /// Create a client with an explicit invalidation policy.
    pub fn with_config(fetcher: impl PageFetcher<T> + 'static, config: QueryClientConfig) -> Self {
        Self {
            inner: Rc::new(ClientInner {
                fetcher: Rc::new(fetcher),
                config,
                store: RefCell::new(PageStore::new()),
                inflight: RefCell::new(HashMap::new()),
                observers: RefCell::new(ObserverRegistry::default()),
            }),
        }
    }

    /// Ensure the first page for `key` is present.
    ///
    /// A fresh entry with at least one page is returned unchanged with
    /// no side effects. A missing, errored-empty, or stale entry
    /// triggers a first-page fetch; a stale entry keeps serving its old
    /// flattened view until the refetch lands. Fetch failures become
    /// `QueryStatus::Error` state, never an `Err`.
    pub async fn ensure_first_page(&self, key: &QueryKey) -> QueryState<T> {
        let id = key.serialized();

        if let Some(inflight) = self.inflight(&id) {
            inflight.await;
            return self.snapshot(&id);
        }

        let cached = {
            let mut store = self.inner.store.borrow_mut();
            let hit = match store.get(&id) {
                Some(state)
                    if !state.pages.is_empty()
                        && !state.is_stale(self.inner.config.stale_time) =>
                {
                    Some(state.clone())
                }
                _ => None,
            };
            if hit.is_some() {
                store.touch(&id);
            }
            hit
        };
        if let Some(state) = cached {
            return state;
        }

        tracing::debug!(key = %id, "fetching first page");
        self.run_fetch(key, id, None).await
    }

    /// Load the next page for `key`.
    ///
    /// No-op while a fetch is in flight or when there is no next page
    /// (terminal state until reset). On failure the already-loaded
    /// pages are preserved and a retry re-enters the same transition.
    pub async fn load_next_page(&self, key: &QueryKey) -> QueryState<T> {
        let id = key.serialized();

        if let Some(inflight) = self.inflight(&id) {
            inflight.await;
            return self.snapshot(&id);
        }

        let token = {
            let mut store = self.inner.store.borrow_mut();
            let next = match store.get(&id) {
                None => return QueryState::idle(),
                Some(state) if state.status.is_fetching() => return state.clone(),
                Some(state) => state.next_token().cloned(),
            };
            store.touch(&id);
            match next {
                Some(token) => token,
                // Terminal: no further pages until reset.
                None => return store.get(&id).cloned().unwrap_or_else(QueryState::idle),
            }
        };

        tracing::debug!(key = %id, token = %token, "fetching next page");
        self.run_fetch(key, id, Some(token)).await
    }

    /// Rendering-layer trigger for [`QueryClient::load_next_page`].
    pub async fn request_next_page(&self, key: &QueryKey) {
        let _ = self.load_next_page(key).await;
    }

    async fn run_fetch(&self, key: &QueryKey, id: String, token: Option<PageToken>) -> QueryState<T> {
        let phase = if token.is_some() {
            QueryStatus::FetchingNext
        } else {
            QueryStatus::Fetching
        };
        let generation = {
            let mut store = self.inner.store.borrow_mut();
            let generation = store.begin_fetch(&id, phase);
            store.evict_over(self.inner.config.max_entries);
            generation
        };
        self.inner.notify(&id);

        let inner = Rc::clone(&self.inner);
        let fetch_key = key.clone();
        let fetch_id = id.clone();
        let fut: SharedFetch = async move {
            let result = inner.fetcher.fetch_page(&fetch_key, token.as_ref()).await;
            let applied = {
                let mut store = inner.store.borrow_mut();
                if store.generation_of(&fetch_id) != Some(generation) {
                    tracing::debug!(key = %fetch_id, "discarding completion for superseded query");
                    false
                } else {
                    match result {
                        Ok(page) => {
                            if token.is_none() {
                                store.replace_first(&fetch_id, page);
                            } else if let Err(err) = store.append(&fetch_id, page) {
                                tracing::warn!(key = %fetch_id, error = %err, "dropped out-of-order page");
                                store.rollback(&fetch_id);
                            }
                        }
                        Err(error) => {
                            tracing::debug!(key = %fetch_id, code = error.code, "fetch failed");
                            store.settle_error(&fetch_id, error);
                        }
                    }
                    true
                }
            };
            // A superseded flight was already dropped from the map by
            // whoever invalidated or evicted the entry; removing here
            // would clobber a newer flight for the same key.
            if applied {
                inner.inflight.borrow_mut().remove(&fetch_id);
                inner.notify(&fetch_id);
            }
        }
        .boxed_local()
        .shared();

        self.inner.inflight.borrow_mut().insert(id.clone(), fut.clone());
        fut.await;
        self.snapshot(&id)
    }

    fn inflight(&self, id: &str) -> Option<SharedFetch> {
        self.inner.inflight.borrow().get(id).cloned()
    }

    fn snapshot(&self, id: &str) -> QueryState<T> {
        self.inner
            .store
            .borrow()
            .get(id)
            .cloned()
            .unwrap_or_else(QueryState::idle)
    }

    /// Flatten all fetched pages for `key` in fetch order.
    pub fn flatten(&self, key: &QueryKey) -> Vec<T> {
        self.inner
            .store
            .borrow()
            .get(&key.serialized())
            .map(QueryState::flatten)
            .unwrap_or_default()
    }

    /// Current state for `key`, if any.
    pub fn state(&self, key: &QueryKey) -> Option<QueryState<T>> {
        self.inner.store.borrow().get(&key.serialized()).cloned()
    }

    /// Current status for `key` (`Idle` when unknown).
    pub fn status(&self, key: &QueryKey) -> QueryStatus {
        self.inner
            .store
            .borrow()
            .get(&key.serialized())
            .map(|s| s.status)
            .unwrap_or(QueryStatus::Idle)
    }

    /// Last fetch failure for `key`, if any.
    pub fn error(&self, key: &QueryKey) -> Option<ErrorInfo> {
        self.inner
            .store
            .borrow()
            .get(&key.serialized())
            .and_then(|s| s.error.clone())
    }

    /// Server-reported total count for `key`, if known.
    pub fn total_count(&self, key: &QueryKey) -> Option<u64> {
        self.inner
            .store
            .borrow()
            .get(&key.serialized())
            .and_then(|s| s.total_count)
    }

    /// Whether more pages can be fetched for `key`.
    pub fn has_next_page(&self, key: &QueryKey) -> bool {
        self.inner
            .store
            .borrow()
            .get(&key.serialized())
            .map(QueryState::has_next_page)
            .unwrap_or(false)
    }

    /// Replace the entry for `key` with a fresh idle state.
    ///
    /// Any fetch still in flight for the old entry is discarded when it
    /// completes rather than applied, and stops counting as in flight,
    /// so the next first-page read issues a fresh fetch.
    pub fn invalidate(&self, key: &QueryKey) {
        let id = key.serialized();
        self.inner.inflight.borrow_mut().remove(&id);
        self.inner.store.borrow_mut().reset(&id);
        self.inner.notify(&id);
    }

    /// Tie the entry for `key` to the transient navigation scope.
    pub fn mark_route_scoped(&self, key: &QueryKey) {
        self.inner.store.borrow_mut().mark_scoped(&key.serialized());
    }

    /// Evict every entry tied to the navigation scope.
    pub fn clear_route_scope(&self) {
        let evicted = self.inner.store.borrow_mut().evict_scoped();
        for id in evicted {
            tracing::debug!(key = %id, "evicted route-scoped query");
            self.inner.inflight.borrow_mut().remove(&id);
            self.inner.notify(&id);
        }
    }

    /// Subscribe to change notifications for `key`.
    pub fn subscribe(&self, key: &QueryKey, callback: impl Fn() + 'static) -> Subscription {
        let id = key.serialized();
        let token = self
            .inner
            .observers
            .borrow_mut()
            .insert(&id, Rc::new(callback));
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.observers.borrow_mut().remove(&id, token);
            }
        })
    }

    /// Evict route-scoped entries whenever a navigation completes.
    pub fn bind_navigation(&self, events: &NavigationEvents) -> NavigationSubscription {
        let weak = Rc::downgrade(&self.inner);
        events.on_navigation_complete(move || {
            if let Some(inner) = weak.upgrade() {
                let evicted = inner.store.borrow_mut().evict_scoped();
                for id in evicted {
                    inner.inflight.borrow_mut().remove(&id);
                    inner.notify(&id);
                }
            }
        })
    }

    /// Install a prefetched first page for a key the cache has never
    /// written. First writer wins: returns `false` without touching
    /// anything when an entry already exists or a fetch has begun.
    pub fn seed_success(
        &self,
        key: &QueryKey,
        page: Page<T>,
        total_count: Option<u64>,
        last_updated: u64,
    ) -> bool {
        let id = key.serialized();
        let state = QueryState::seeded(
            vec![page],
            QueryStatus::Success,
            None,
            total_count,
            last_updated,
        );
        let installed = {
            let mut store = self.inner.store.borrow_mut();
            let installed = store.insert_seeded(&id, state);
            if installed {
                store.evict_over(self.inner.config.max_entries);
            }
            installed
        };
        if installed {
            self.inner.notify(&id);
        }
        installed
    }

    /// Install a captured error state for a key the cache has never
    /// written. Same first-writer-wins rules as
    /// [`QueryClient::seed_success`].
    pub fn seed_error(&self, key: &QueryKey, error: ErrorInfo, last_updated: u64) -> bool {
        let id = key.serialized();
        let state = QueryState::seeded(Vec::new(), QueryStatus::Error, Some(error), None, last_updated);
        let installed = {
            let mut store = self.inner.store.borrow_mut();
            let installed = store.insert_seeded(&id, state);
            if installed {
                store.evict_over(self.inner.config.max_entries);
            }
            installed
        };
        if installed {
            self.inner.notify(&id);
        }
        installed
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.store.borrow().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use futures::future::join;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    fn yield_now() -> impl Future<Output = ()> {
        struct YieldNow(bool);
        impl Future for YieldNow {
            type Output = ();
            fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
                if self.0 {
                    Poll::Ready(())
                } else {
                    self.0 = true;
                    cx.waker().wake_by_ref();
                    Poll::Pending
                }
            }
        }
        YieldNow(false)
    }

    /// Scripted fetcher: responses keyed by token, consumed in order,
    /// with the final response repeating. Suspends before answering so
    /// concurrent callers can interleave.
    struct FakeFetcher {
        calls: Cell<usize>,
        yields: Cell<usize>,
        script: RefCell<HashMap<Option<String>, VecDeque<Result<Page<String>, ErrorInfo>>>>,
    }

    impl FakeFetcher {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                yields: Cell::new(1),
                script: RefCell::new(HashMap::new()),
            }
        }

        fn on(self, token: Option<&str>, result: Result<Page<String>, ErrorInfo>) -> Self {
            self.script
                .borrow_mut()
                .entry(token.map(str::to_string))
                .or_default()
                .push_back(result);
            self
        }
    }

    #[async_trait(?Send)]
    impl PageFetcher<String> for FakeFetcher {
        async fn fetch_page(
            &self,
            _key: &QueryKey,
            token: Option<&PageToken>,
        ) -> Result<Page<String>, ErrorInfo> {
            for _ in 0..self.yields.get() {
                yield_now().await;
            }
            self.calls.set(self.calls.get() + 1);
            let token_key = token.map(|t| t.as_str().to_string());
            let mut script = self.script.borrow_mut();
            let queue = script.get_mut(&token_key).expect("unscripted token");
            if queue.len() > 1 {
                queue.pop_front().expect("non-empty queue")
            } else {
                queue.front().expect("non-empty queue").clone()
            }
        }
    }

    fn items(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn search_key() -> QueryKey {
        QueryKey::new("/search/movie")
            .with_param("query", "dune")
            .expect("serializable param")
    }

    fn two_page_fetcher() -> Rc<FakeFetcher> {
        Rc::new(
            FakeFetcher::new()
                .on(
                    None,
                    Ok(Page::new(items(&["A", "B"]))
                        .with_next_token("p2")
                        .with_total_count(4)),
                )
                .on(
                    Some("p2"),
                    Ok(Page::new(items(&["C", "D"])).with_self_token("p2")),
                ),
        )
    }

    #[test]
    fn test_first_page_then_next_page_flattens_in_order() {
        let fetcher = two_page_fetcher();
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        let state = block_on(client.ensure_first_page(&key));
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(client.flatten(&key), items(&["A", "B"]));
        assert_eq!(client.total_count(&key), Some(4));
        assert!(client.has_next_page(&key));

        let state = block_on(client.load_next_page(&key));
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(client.flatten(&key), items(&["A", "B", "C", "D"]));
        assert!(!client.has_next_page(&key));

        // Terminal: no further pages, no further calls.
        let state = block_on(client.load_next_page(&key));
        assert_eq!(state.flatten(), items(&["A", "B", "C", "D"]));
        assert_eq!(fetcher.calls.get(), 2);
    }

    #[test]
    fn test_ensure_first_page_is_idempotent() {
        let fetcher = two_page_fetcher();
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        block_on(client.ensure_first_page(&key));
        let state = block_on(client.ensure_first_page(&key));

        assert_eq!(state.flatten(), items(&["A", "B"]));
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn test_concurrent_first_page_reads_share_one_fetch() {
        let fetcher = two_page_fetcher();
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        let (a, b) = block_on(join(
            client.ensure_first_page(&key),
            client.ensure_first_page(&key),
        ));

        assert_eq!(fetcher.calls.get(), 1);
        assert_eq!(a.flatten(), b.flatten());
        assert_eq!(a.status, QueryStatus::Success);
        assert_eq!(b.status, QueryStatus::Success);
    }

    #[test]
    fn test_concurrent_next_page_reads_share_one_fetch() {
        let fetcher = two_page_fetcher();
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        block_on(client.ensure_first_page(&key));
        let (a, b) = block_on(join(
            client.load_next_page(&key),
            client.load_next_page(&key),
        ));

        assert_eq!(fetcher.calls.get(), 2);
        assert_eq!(a.flatten(), items(&["A", "B", "C", "D"]));
        assert_eq!(b.flatten(), a.flatten());
    }

    #[test]
    fn test_failed_next_page_preserves_pages_and_retries_cleanly() {
        let fetcher = Rc::new(
            FakeFetcher::new()
                .on(
                    None,
                    Ok(Page::new(items(&["A", "B"])).with_next_token("p2")),
                )
                .on(Some("p2"), Err(ErrorInfo::new(500, "upstream exploded")))
                .on(
                    Some("p2"),
                    Ok(Page::new(items(&["C", "D"])).with_self_token("p2")),
                ),
        );
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        block_on(client.ensure_first_page(&key));
        let state = block_on(client.load_next_page(&key));

        assert_eq!(state.status, QueryStatus::Error);
        assert_eq!(state.error.as_ref().map(|e| e.code), Some(500));
        assert_eq!(state.flatten(), items(&["A", "B"]));

        // Retry re-enters the same transition; no duplicated pages.
        let state = block_on(client.load_next_page(&key));
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(state.flatten(), items(&["A", "B", "C", "D"]));
        assert_eq!(fetcher.calls.get(), 3);
    }

    #[test]
    fn test_error_first_page_surfaces_as_state_and_is_retryable() {
        let fetcher = Rc::new(
            FakeFetcher::new()
                .on(None, Err(ErrorInfo::new(503, "try later")))
                .on(
                    None,
                    Ok(Page::new(items(&["A"])).with_total_count(1)),
                ),
        );
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        let state = block_on(client.ensure_first_page(&key));
        assert_eq!(state.status, QueryStatus::Error);
        assert!(state.flatten().is_empty());

        let state = block_on(client.ensure_first_page(&key));
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(state.flatten(), items(&["A"]));
    }

    #[test]
    fn test_stale_entry_is_refetched() {
        let fetcher = two_page_fetcher();
        let client = QueryClient::with_config(
            Rc::clone(&fetcher),
            QueryClientConfig::new().with_stale_time(Duration::ZERO),
        );
        let key = search_key();

        block_on(client.ensure_first_page(&key));
        std::thread::sleep(Duration::from_millis(5));
        block_on(client.ensure_first_page(&key));

        assert_eq!(fetcher.calls.get(), 2);
        // Refetch replaced, not duplicated, the first page.
        assert_eq!(client.flatten(&key), items(&["A", "B"]));
    }

    #[test]
    fn test_stale_refetch_serves_old_view_until_it_lands() {
        let fetcher = Rc::new(
            FakeFetcher::new()
                .on(None, Ok(Page::new(items(&["A", "B"])).with_total_count(2)))
                .on(None, Ok(Page::new(items(&["A2", "B2"])).with_total_count(2))),
        );
        let client = QueryClient::with_config(
            Rc::clone(&fetcher),
            QueryClientConfig::new().with_stale_time(Duration::ZERO),
        );
        let key = search_key();

        block_on(client.ensure_first_page(&key));
        std::thread::sleep(Duration::from_millis(5));

        fetcher.yields.set(2);
        let observer = client.clone();
        let observed_key = key.clone();
        let observed = Rc::new(RefCell::new(Vec::new()));
        let observed_cb = Rc::clone(&observed);
        block_on(join(client.ensure_first_page(&key), async move {
            yield_now().await;
            observed_cb.borrow_mut().push(observer.flatten(&observed_key));
        }));

        // The old flattened view was still served while the stale
        // refetch was suspended, then the fresh page replaced it.
        assert_eq!(observed.borrow()[0], items(&["A", "B"]));
        assert_eq!(client.flatten(&key), items(&["A2", "B2"]));
        assert_eq!(fetcher.calls.get(), 2);
    }

    #[test]
    fn test_invalidate_discards_in_flight_completion() {
        let fetcher = two_page_fetcher();
        fetcher.yields.set(2);
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        let invalidator = client.clone();
        let invalidate_key = key.clone();
        let (state, ()) = block_on(join(client.ensure_first_page(&key), async move {
            yield_now().await;
            invalidator.invalidate(&invalidate_key);
        }));

        // The late completion must not resurrect the evicted entry.
        assert_eq!(state.status, QueryStatus::Idle);
        assert!(client.flatten(&key).is_empty());
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn test_ensure_after_midflight_invalidate_issues_refetch() {
        let fetcher = two_page_fetcher();
        fetcher.yields.set(2);
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        let invalidator = client.clone();
        let invalidate_key = key.clone();
        block_on(join(client.ensure_first_page(&key), async move {
            yield_now().await;
            invalidator.invalidate(&invalidate_key);
        }));

        // The superseded flight no longer counts as in flight; the next
        // first-page read fetches afresh instead of returning Idle.
        let state = block_on(client.ensure_first_page(&key));
        assert_eq!(state.status, QueryStatus::Success);
        assert_eq!(state.flatten(), items(&["A", "B"]));
        assert_eq!(fetcher.calls.get(), 2);
    }

    #[test]
    fn test_lru_bound_holds() {
        let fetcher = Rc::new(
            FakeFetcher::new().on(None, Ok(Page::new(items(&["x"])))),
        );
        let client = QueryClient::with_config(
            Rc::clone(&fetcher),
            QueryClientConfig::new().with_max_entries(1),
        );
        let movies = QueryKey::new("/search/movie");
        let people = QueryKey::new("/search/person");

        block_on(client.ensure_first_page(&movies));
        block_on(client.ensure_first_page(&people));

        assert_eq!(client.len(), 1);
        assert!(client.state(&movies).is_none());
        assert!(client.state(&people).is_some());
    }

    #[test]
    fn test_seeded_error_entries_respect_lru_bound() {
        let client: QueryClient<String> = QueryClient::with_config(
            FakeFetcher::new(),
            QueryClientConfig::new().with_max_entries(1),
        );
        let movies = QueryKey::new("/search/movie");
        let people = QueryKey::new("/search/person");

        assert!(client.seed_error(&movies, ErrorInfo::new(500, "boom"), 0));
        assert!(client.seed_error(&people, ErrorInfo::new(500, "boom"), 0));

        assert_eq!(client.len(), 1);
        assert!(client.state(&movies).is_none());
        assert!(client.state(&people).is_some());
    }

    #[test]
    fn test_independent_keys_do_not_interfere() {
        let fetcher = Rc::new(
            FakeFetcher::new().on(None, Ok(Page::new(items(&["x"])).with_total_count(1))),
        );
        let client = QueryClient::new(Rc::clone(&fetcher));
        let movies = QueryKey::new("/search/movie")
            .with_param("query", "dune")
            .expect("serializable param");
        let people = QueryKey::new("/search/person")
            .with_param("query", "dune")
            .expect("serializable param");

        let (a, b) = block_on(join(
            client.ensure_first_page(&movies),
            client.ensure_first_page(&people),
        ));

        assert_eq!(fetcher.calls.get(), 2);
        assert_eq!(a.status, QueryStatus::Success);
        assert_eq!(b.status, QueryStatus::Success);
        assert_eq!(client.len(), 2);
    }

    #[test]
    fn test_subscription_fires_and_releases() {
        let fetcher = two_page_fetcher();
        let client = QueryClient::new(Rc::clone(&fetcher));
        let key = search_key();

        let fired = Rc::new(Cell::new(0u32));
        let fired_cb = Rc::clone(&fired);
        let sub = client.subscribe(&key, move || fired_cb.set(fired_cb.get() + 1));

        block_on(client.ensure_first_page(&key));
        let after_fetch = fired.get();
        assert!(after_fetch >= 2, "begin and settle both notify");

        sub.unsubscribe();
        client.invalidate(&key);
        assert_eq!(fired.get(), after_fetch);
    }

    #[test]
    fn test_navigation_clears_route_scoped_entries() {
        let fetcher = two_page_fetcher();
        let client = QueryClient::new(Rc::clone(&fetcher));
        let events = NavigationEvents::new();
        let _binding = client.bind_navigation(&events);
        let key = search_key();

        block_on(client.ensure_first_page(&key));
        client.mark_route_scoped(&key);
        events.notify_complete();

        assert!(client.state(&key).is_none());
    }
}
