//! Single-page and full-enumeration list fetching.
//!
//! Full enumeration walks pages of [`MAX_PAGE_LIMIT`] items starting at page 0.
//! The `totalAvailableResults` reported by the first page is taken as a
//! snapshot: enumeration stops once that many items were collected, extra items
//! are dropped, and an empty page before the snapshot is reached means the
//! collection shrank underneath us and fails the whole enumeration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::query::{ListQuery, MAX_PAGE_LIMIT};

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page
    pub data: Vec<T>,
    /// Total reported by the server, when present
    pub total_available_results: Option<u64>,
}

impl<T> Page<T> {
    /// Create a page.
    #[must_use]
    pub const fn new(data: Vec<T>, total_available_results: Option<u64>) -> Self {
        Self {
            data,
            total_available_results,
        }
    }
}

/// Anything that can serve one page of a listing.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PageSource<T: Send + Sync + 'static>: Send + Sync {
    /// Fetches the page described by `query`.
    async fn fetch_page(&self, query: &ListQuery) -> Result<Page<T>>;
}

/// Fetches a single page.
///
/// # Errors
///
/// Propagates the source error unchanged.
pub async fn fetch_page<T, S>(source: &S, query: &ListQuery) -> Result<Page<T>>
where
    T: Send + Sync + 'static,
    S: PageSource<T> + ?Sized,
{
    source.fetch_page(query).await
}

/// Enumerates every item matching `base`.
///
/// `page` and `limit` of `base` are ignored.
///
/// # Errors
///
/// Returns [`Error::PageFetchFailed`] with the failing page index when a page
/// errors or the listing shrinks during enumeration. Partial results are
/// discarded.
pub async fn fetch_all<T, S>(source: &S, base: &ListQuery) -> Result<Vec<T>>
where
    T: Send + Sync + 'static,
    S: PageSource<T> + ?Sized,
{
    let limit = MAX_PAGE_LIMIT;
    let mut items: Vec<T> = Vec::new();
    let mut snapshot_total: Option<usize> = None;
    let mut page_index: u32 = 0;

    loop {
        let query = base.clone().with_page(page_index).with_limit(limit);
        let page = source
            .fetch_page(&query)
            .await
            .map_err(|e| Error::PageFetchFailed {
                page: page_index,
                source: Box::new(e),
            })?;

        if page_index == 0 {
            snapshot_total = page
                .total_available_results
                .map(|t| usize::try_from(t).unwrap_or(usize::MAX));
        }
        let received = page.data.len();

        match snapshot_total {
            Some(0) => return Ok(Vec::new()),
            Some(total) => {
                if received == 0 {
                    return Err(Error::PageFetchFailed {
                        page: page_index,
                        source: Box::new(Error::ParseError(format!(
                            "listing returned an empty page after {} of {total} items",
                            items.len()
                        ))),
                    });
                }
                items.extend(page.data);
                if items.len() >= total {
                    items.truncate(total);
                    return Ok(items);
                }
            }
            None => {
                items.extend(page.data);
                if received < limit as usize {
                    return Ok(items);
                }
            }
        }

        tracing::debug!(page = page_index, collected = items.len(), "fetched page");
        page_index += 1;
    }
}
