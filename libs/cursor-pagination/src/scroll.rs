//! Scroll-proximity trigger for incremental loading

use std::sync::{Mutex, PoisonError};

use tracing::trace;

use crate::collection::{LoadOutcome, PaginatedCollection};
use crate::error::LoadError;
use crate::page::PageSource;

/// Distance from the bottom, in the container's units, that triggers a load
pub const DEFAULT_THRESHOLD: f64 = 100.0;

/// Geometry of a scrollable container at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top
    pub scroll_offset: f64,
    /// Total height of the scrollable content
    pub content_height: f64,
    /// Visible height of the container
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_offset: f64, content_height: f64, viewport_height: f64) -> Self {
        Self {
            scroll_offset,
            content_height,
            viewport_height,
        }
    }

    /// Distance left between the bottom of the viewport and the end of content
    pub fn remaining(&self) -> f64 {
        (self.content_height - (self.scroll_offset + self.viewport_height)).max(0.0)
    }
}

/// Decides whether the viewport is near enough to the end to load more
///
/// Scroll events only record the latest metrics; the decision is made once
/// per animation frame, so a burst of events costs one evaluation.
#[derive(Debug, Clone)]
pub struct ScrollProximity {
    threshold: f64,
    pending: Option<ScrollMetrics>,
}

impl Default for ScrollProximity {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ScrollProximity {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
            pending: None,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Record a scroll event; only the latest one before a frame counts
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) {
        self.pending = Some(metrics);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Evaluate the pending scroll event, if any
    ///
    /// Returns true when the remaining distance is at most the threshold.
    /// Consumes the pending event either way.
    pub fn on_animation_frame(&mut self) -> bool {
        match self.pending.take() {
            Some(metrics) => {
                let near_end = metrics.remaining() <= self.threshold;
                trace!(remaining = metrics.remaining(), near_end, "Scroll evaluated");
                near_end
            }
            None => false,
        }
    }
}

/// A collection wired to a scroll-proximity trigger
///
/// The view forwards scroll events and animation frames; loads happen only
/// when the trigger fires, and the collection's own guards still apply.
pub struct InfiniteScroll<S: PageSource> {
    collection: PaginatedCollection<S>,
    proximity: Mutex<ScrollProximity>,
}

impl<S: PageSource> InfiniteScroll<S> {
    pub fn new(collection: PaginatedCollection<S>) -> Self {
        Self::with_threshold(collection, DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(collection: PaginatedCollection<S>, threshold: f64) -> Self {
        Self {
            collection,
            proximity: Mutex::new(ScrollProximity::new(threshold)),
        }
    }

    pub fn collection(&self) -> &PaginatedCollection<S> {
        &self.collection
    }

    pub fn on_scroll(&self, metrics: ScrollMetrics) {
        self.proximity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_scroll(metrics);
    }

    /// Evaluate pending scroll state and load the next page if near the end
    ///
    /// Returns `None` when the trigger did not fire.
    pub async fn on_animation_frame(
        &self,
    ) -> Result<Option<LoadOutcome>, LoadError<S::Error>> {
        let fire = self
            .proximity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .on_animation_frame();
        if !fire {
            return Ok(None);
        }
        self.collection.load_more().await.map(Some)
    }
}
