//! Page request/response shapes and the source trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page request: a size hint and the cursor from the previous page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_size: u32,
    /// `None` requests the first page
    pub cursor: Option<String>,
}

impl PageRequest {
    pub fn first(page_size: u32) -> Self {
        Self {
            page_size,
            cursor: None,
        }
    }

    pub fn after(page_size: u32, cursor: impl Into<String>) -> Self {
        Self {
            page_size,
            cursor: Some(cursor.into()),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items in server order
    pub items: Vec<T>,
    /// Opaque marker for the next request
    pub next_cursor: Option<String>,
    /// `false` is terminal for the query
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Build a page, normalizing an empty cursor to `None`
    pub fn new(items: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
            has_more,
        }
    }

    /// Final page: no cursor, nothing more to load
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None, false)
    }

    /// Build a page from a wire response whose more-data flag may be missing
    ///
    /// Without an explicit flag, a non-empty cursor means more data.
    pub fn from_wire(items: Vec<T>, next_cursor: Option<String>, has_more: Option<bool>) -> Self {
        let next_cursor = next_cursor.filter(|c| !c.is_empty());
        let has_more = has_more.unwrap_or(next_cursor.is_some());
        Self {
            items,
            next_cursor,
            has_more,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }
}

/// Fetches a single page of one concrete list
///
/// Implemented once per endpoint; the collection logic is shared.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;
    type Error: Send;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Self::Item>, Self::Error>;
}
