//! The hydration transport format.

use reel_query::{ErrorInfo, PageToken};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializable snapshot of one or more cached queries.
///
/// Plain data by construction: items are type-erased JSON values, so
/// one snapshot can carry queries of different item types (a movie tab
/// and a person tab) across the server/client process boundary
/// verbatim. No functions, no cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DehydratedState {
    /// Captured queries, one per key.
    pub queries: Vec<DehydratedQuery>,
}

impl DehydratedState {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of captured queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the snapshot captured nothing.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Fold another snapshot into this one, e.g. to combine captures
    /// from several typed clients serving the same request.
    pub fn merge(mut self, other: Self) -> Self {
        self.queries.extend(other.queries);
        self
    }
}

/// One captured query: its key, first page, and result metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DehydratedQuery {
    /// Canonical serialized query key.
    pub key: String,
    /// First-page items, type-erased.
    pub items: Vec<Value>,
    /// Cursor the captured page was fetched with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_token: Option<PageToken>,
    /// Cursor for the page after the captured one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<PageToken>,
    /// Server-reported total count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    /// Epoch milliseconds of the capture's last page delivery, so the
    /// client's staleness window starts from the prefetch time.
    pub last_updated: u64,
    /// Captured failure, present only when errors were opted in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}
