//! Fetched pages and their cursors.

use serde::{Deserialize, Serialize};

/// Opaque cursor identifying where a page of results begins.
///
/// The cache never inspects the contents; only the fetcher gives the
/// token meaning (for page-number APIs it is simply the decimal page
/// number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageToken(String);

impl PageToken {
    /// Create a new token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PageToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PageToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for PageToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// One fetched page of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in display order.
    pub items: Vec<T>,
    /// The token this page was fetched with (absent for the first page).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_token: Option<PageToken>,
    /// Token for the following page; absent means no further pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<PageToken>,
    /// Server-reported total item count, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// Create a page holding the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            self_token: None,
            next_token: None,
            total_count: None,
        }
    }

    /// Set the token this page was fetched with.
    pub fn with_self_token(mut self, token: impl Into<PageToken>) -> Self {
        self.self_token = Some(token.into());
        self
    }

    /// Set the token for the following page.
    pub fn with_next_token(mut self, token: impl Into<PageToken>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    /// Set the server-reported total count.
    pub fn with_total_count(mut self, count: u64) -> Self {
        self.total_count = Some(count);
        self
    }

    /// Whether this is the last page.
    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }

    /// Number of items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
