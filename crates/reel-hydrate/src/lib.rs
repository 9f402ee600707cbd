//! Server-to-client cache handoff for `reel-query`.
//!
//! A page prefetched during server-side rendering should not be
//! fetched a second time when the client takes over. This crate
//! provides:
//! - `DehydratedState` - Plain serializable snapshot of cached queries
//! - `dehydrate` / `dehydrate_with` - Capture first pages server-side
//! - `hydrate` - Seed a client cache, first writer wins, idempotent
//!
//! # Example
//!
//! ```ignore
//! // Server, per request:
//! let client = QueryClient::new(fetcher);
//! client.ensure_first_page(&key).await;
//! let snapshot = reel_hydrate::dehydrate(&client, &[key]);
//! let payload = serde_json::to_string(&snapshot)?;
//!
//! // Client, on first render:
//! let snapshot: DehydratedState = serde_json::from_str(&payload)?;
//! reel_hydrate::hydrate(&client, &snapshot);
//! ```

mod bridge;
mod state;

pub use bridge::*;
pub use state::*;
