//! The fetch seam between the cache and the transport layer.

use async_trait::async_trait;

use crate::error::ErrorInfo;
use crate::key::QueryKey;
use crate::page::{Page, PageToken};

/// One-page fetch over an opaque transport.
///
/// The cache guarantees it never issues a second call for the same
/// `(key, token)` pair while one is outstanding; implementations do not
/// need their own deduplication. Timeouts and retries, if any, are the
/// implementation's business and surface as a plain [`ErrorInfo`].
#[async_trait(?Send)]
pub trait PageFetcher<T> {
    /// Fetch one page for `key`. An absent token means the first page.
    async fn fetch_page(
        &self,
        key: &QueryKey,
        token: Option<&PageToken>,
    ) -> Result<Page<T>, ErrorInfo>;
}

#[async_trait(?Send)]
impl<T, F: PageFetcher<T> + ?Sized> PageFetcher<T> for std::rc::Rc<F> {
    async fn fetch_page(
        &self,
        key: &QueryKey,
        token: Option<&PageToken>,
    ) -> Result<Page<T>, ErrorInfo> {
        (**self).fetch_page(key, token).await
    }
}
