//! Ordered, append-only paginated collection

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::LoadError;
use crate::page::{Page, PageRequest, PageSource};

/// Result of a [`PaginatedCollection::load_more`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and appended
    Loaded { appended: usize, has_more: bool },
    /// No request was issued
    Skipped(SkipReason),
    /// The fetch completed after a reset or detach and was discarded
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch for this collection has not completed yet
    InFlight,
    /// The server already answered `has_more = false`
    Exhausted,
}

struct State<T> {
    items: Vec<T>,
    cursor: Option<String>,
    has_more: bool,
    in_flight: bool,
    generation: u64,
    pages_loaded: usize,
}

impl<T> State<T> {
    fn fresh(generation: u64) -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            has_more: true,
            in_flight: false,
            generation,
            pages_loaded: 0,
        }
    }
}

/// Clears the in-flight flag if the fetch future is dropped before completing
struct InFlight<'a, T> {
    state: &'a Mutex<State<T>>,
    generation: u64,
    armed: bool,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation {
            state.in_flight = false;
        }
    }
}

/// A list view's results, loaded page by page from a [`PageSource`]
///
/// Clones share state, so a scroll handler and the view rendering the list
/// can each hold one.
///
/// Invariants:
/// - items are only ever appended at the tail, in page order
/// - at most one fetch is in flight per collection
/// - a fetch that completes after [`reset`](Self::reset) or
///   [`detach`](Self::detach) is discarded
/// - a failed fetch leaves items, cursor and has-more untouched
pub struct PaginatedCollection<S: PageSource> {
    source: Arc<S>,
    page_size: u32,
    state: Arc<Mutex<State<S::Item>>>,
}

impl<S: PageSource> Clone for PaginatedCollection<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            page_size: self.page_size,
            state: Arc::clone(&self.state),
        }
    }
}

impl<S: PageSource> PaginatedCollection<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source: Arc::new(source),
            page_size: page_size.max(1),
            state: Arc::new(Mutex::new(State::fresh(0))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<S::Item>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Issue exactly one page request without touching collection state
    pub async fn load_page(
        &self,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<Page<S::Item>, LoadError<S::Error>> {
        self.source
            .fetch_page(PageRequest { page_size, cursor })
            .await
            .map_err(LoadError::Source)
    }

    /// Append items at the tail, in the order given
    pub fn append_results(&self, items: Vec<S::Item>) {
        self.lock().items.extend(items);
    }

    /// Fetch the next page and append it
    ///
    /// Issues no request while another fetch is in flight or once the
    /// server has reported the end of the collection.
    pub async fn load_more(&self) -> Result<LoadOutcome, LoadError<S::Error>> {
        let (generation, request) = {
            let mut state = self.lock();
            if state.in_flight {
                debug!(generation = state.generation, "Page fetch already in flight, skipping");
                return Ok(LoadOutcome::Skipped(SkipReason::InFlight));
            }
            if !state.has_more {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            }
            state.in_flight = true;
            (
                state.generation,
                PageRequest {
                    page_size: self.page_size,
                    cursor: state.cursor.clone(),
                },
            )
        };

        debug!(
            generation,
            page_size = request.page_size,
            cursor = ?request.cursor,
            "Loading page"
        );

        let mut flight = InFlight {
            state: &self.state,
            generation,
            armed: true,
        };
        let result = self.source.fetch_page(request).await;

        let mut state = self.lock();
        flight.armed = false;

        if state.generation != generation {
            debug!(
                fetched_generation = generation,
                current_generation = state.generation,
                "Discarding stale page"
            );
            return Ok(LoadOutcome::Stale);
        }
        state.in_flight = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(generation, pages_loaded = state.pages_loaded, "Page fetch failed");
                return Err(LoadError::Source(e));
            }
        };

        let appended = page.items.len();
        let has_more = if page.has_more && page.next_cursor.is_none() {
            // Without a cursor the next request would restart from the first page
            warn!(generation, "Server reported more data without a cursor, treating as last page");
            false
        } else {
            page.has_more
        };

        state.items.extend(page.items);
        state.cursor = page.next_cursor;
        state.has_more = has_more;
        state.pages_loaded += 1;

        debug!(
            generation,
            appended,
            total = state.items.len(),
            has_more,
            "Page appended"
        );

        Ok(LoadOutcome::Loaded { appended, has_more })
    }

    /// Drop all results and start again from the first page
    ///
    /// Used when the list is intentionally reloaded, e.g. after creating a post.
    ///
    /// The in-flight guard is released immediately, so a `load_more` issued
    /// after this call runs concurrently with the discarded fetch. The old
    /// fetch's result is dropped by the generation check and never clears the
    /// new fetch's guard.
    pub fn reset(&self) {
        let mut state = self.lock();
        let generation = state.generation + 1;
        *state = State::fresh(generation);
        debug!(generation, "Collection reset");
    }

    /// Mark the owning view as torn down
    ///
    /// Results of fetches started before this call are discarded. Loaded
    /// items stay readable. As with [`reset`](Self::reset), the guard is
    /// released, so a later `load_more` may overlap the discarded fetch.
    pub fn detach(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.in_flight = false;
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.lock().in_flight
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn pages_loaded(&self) -> usize {
        self.lock().pages_loaded
    }

    /// Cursor the next [`load_more`](Self::load_more) will send
    pub fn next_cursor(&self) -> Option<String> {
        self.lock().cursor.clone()
    }

    /// Run `f` over the current items without cloning them
    pub fn with_items<R>(&self, f: impl FnOnce(&[S::Item]) -> R) -> R {
        f(&self.lock().items)
    }

    /// Snapshot of the current items
    pub fn items(&self) -> Vec<S::Item>
    where
        S::Item: Clone,
    {
        self.lock().items.clone()
    }
}

impl<S: PageSource> fmt::Debug for PaginatedCollection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("PaginatedCollection")
            .field("page_size", &self.page_size)
            .field("len", &state.items.len())
            .field("has_more", &state.has_more)
            .field("in_flight", &state.in_flight)
            .field("generation", &state.generation)
            .finish()
    }
}
