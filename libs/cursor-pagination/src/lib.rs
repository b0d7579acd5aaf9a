//! Cursor-paginated collections
//!
//! Every list view (feed, comments, replies, search results, followers)
//! has the same shape: a page-size hint, an opaque server cursor, an ordered
//! result list and a has-more flag. This crate implements that shape once.
//!
//! - [`PageSource`]: how one page is fetched (one impl per endpoint)
//! - [`PaginatedCollection`]: ordered, append-only results with an in-flight
//!   guard and a generation counter that discards stale completions
//! - [`ScrollProximity`] / [`InfiniteScroll`]: decide when the viewport is
//!   close enough to the end to load the next page, at most once per frame
//!
//! ```rust
//! use async_trait::async_trait;
//! use cursor_pagination::{Page, PageRequest, PageSource, PaginatedCollection};
//!
//! struct Numbers;
//!
//! #[async_trait]
//! impl PageSource for Numbers {
//!     type Item = u32;
//!     type Error = std::convert::Infallible;
//!
//!     async fn fetch_page(&self, request: PageRequest) -> Result<Page<u32>, Self::Error> {
//!         Ok(match request.cursor.as_deref() {
//!             None => Page::new(vec![1, 2], Some("2".into()), true),
//!             Some(_) => Page::last(vec![3]),
//!         })
//!     }
//! }
//!
//! # async fn run() {
//! let numbers = PaginatedCollection::new(Numbers, 2);
//! numbers.load_more().await.unwrap();
//! numbers.load_more().await.unwrap();
//! assert_eq!(numbers.items(), vec![1, 2, 3]);
//! assert!(!numbers.has_more());
//! # }
//! ```

mod collection;
mod error;
mod page;
mod scroll;

pub use collection::{LoadOutcome, PaginatedCollection, SkipReason};
pub use error::LoadError;
pub use page::{Page, PageRequest, PageSource};
pub use scroll::{InfiniteScroll, ScrollMetrics, ScrollProximity, DEFAULT_THRESHOLD};
