//! Query cache and pagination engine for paginated API browsing.
//!
//! This crate provides:
//! - `QueryKey` - Canonical serializable query identity
//! - `Page` / `PageToken` - Cursor-paginated response envelopes
//! - `QueryClient` - The pagination controller: single-flight fetches,
//!   page concatenation, stale-while-revalidate, LRU-bounded cache
//! - `PageFetcher` - The async seam to the transport layer
//! - `QueryClientConfig` - Staleness and eviction policy
//! - `NavigationEvents` - Route-change hook for scope-tied eviction
//!
//! # Example
//!
//! ```ignore
//! use reel_query::{QueryClient, QueryKey};
//!
//! let key = QueryKey::new("/search/movie").with_param("query", "dune")?;
//! let client = QueryClient::new(fetcher);
//!
//! let state = client.ensure_first_page(&key).await;
//! let movies = client.flatten(&key);
//! if client.has_next_page(&key) {
//!     client.load_next_page(&key).await;
//! }
//! ```

mod client;
mod error;
mod fetch;
mod key;
mod navigation;
mod observe;
mod page;
mod policy;
mod store;

pub use client::*;
pub use error::*;
pub use fetch::*;
pub use key::*;
pub use navigation::*;
pub use observe::*;
pub use page::*;
pub use policy::*;
pub use store::{QueryState, QueryStatus};
