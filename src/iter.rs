//! Iterator adapters for automatic progress tracking.
//!
//! [`ProgressIteratorExt`] adds helper methods to any [`Iterator`] so a loop can
//! drive a [`ProgressTracker`] without calling [`tick`](ProgressTracker::tick)
//! by hand.
//!
//! # Sizing
//!
//! A tracker needs a known total. [`progress`](ProgressIteratorExt::progress)
//! takes it from [`Iterator::size_hint`] and fails if the hint is not exact.
//! Use [`progress_with`](ProgressIteratorExt::progress_with) to supply a
//! tracker you built yourself.
//!
//! # Example
//!
//! ```no_run
//! use tickbar::ProgressIteratorExt;
//!
//! for item in vec![1, 2, 3].into_iter().progress().unwrap() {
//!     // ...
//! }
//! ```

use std::io::{Stdout, Write};

use compact_str::CompactString;
use tracing::warn;

use crate::{
    builder::TrackerBuilder,
    clock::{Clock, SystemClock},
    error::{Error, Result},
    progress::{AdvanceOptions, ProgressTracker},
};

/// Wraps an iterator and advances a tracker once per yielded item.
///
/// If drawing fails, the error is kept, rendering stops, and counting goes on.
/// Retrieve the error with [`into_tracker`](Self::into_tracker).
pub struct ProgressIter<I, W = Stdout, C = SystemClock> {
    iter: I,
    tracker: ProgressTracker<W, C>,
    error: Option<Error>,
}

impl<I, W, C> ProgressIter<I, W, C> {
    /// Creates a new `ProgressIter`.
    ///
    /// Usually constructed via [`ProgressIteratorExt`] methods.
    pub const fn new(iter: I, tracker: ProgressTracker<W, C>) -> Self {
        Self {
            iter,
            tracker,
            error: None,
        }
    }

    /// The tracker being driven.
    #[must_use]
    pub const fn tracker(&self) -> &ProgressTracker<W, C> {
        &self.tracker
    }

    /// Releases the tracker, or the first output error hit while iterating.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the tracker during iteration.
    pub fn into_tracker(self) -> Result<ProgressTracker<W, C>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.tracker),
        }
    }
}

impl<I: Iterator, W: Write, C: Clock> Iterator for ProgressIter<I, W, C> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next()?;

        if self.error.is_some() {
            // Keep the count right, stop touching the broken stream.
            let _ = self.tracker.advance(AdvanceOptions::hidden());
        } else if let Err(err) = self.tracker.tick() {
            warn!(error = %err, "progress output failed, rendering disabled");
            self.error = Some(err);
        }

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Extension trait to attach progress tracking to any Iterator.
pub trait ProgressIteratorExt: Iterator + Sized {
    /// Wraps the iterator in a default tracker sized from `size_hint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the iterator length is unknown or zero.
    fn progress(self) -> Result<ProgressIter<Self>> {
        self.progress_with_prefix(CompactString::default())
    }

    /// Like [`progress`](Self::progress), with a line prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the iterator length is unknown or zero.
    fn progress_with_prefix(self, prefix: impl Into<CompactString>) -> Result<ProgressIter<Self>> {
        let total = self.exact_len().ok_or_else(|| {
            Error::InvalidArgument("iterator length is not known up front".into())
        })?;
        let tracker = TrackerBuilder::new(total).with_prefix(prefix).build()?;
        Ok(ProgressIter::new(self, tracker))
    }

    /// Wraps the iterator using an existing tracker.
    fn progress_with<W, C>(self, tracker: ProgressTracker<W, C>) -> ProgressIter<Self, W, C> {
        ProgressIter::new(self, tracker)
    }

    /// The exact remaining length, if the size hint pins it down.
    fn exact_len(&self) -> Option<u64> {
        match self.size_hint() {
            (lower, Some(upper)) if lower == upper => u64::try_from(upper).ok(),
            _ => None,
        }
    }
}

impl<I: Iterator> ProgressIteratorExt for I {}
