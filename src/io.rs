//! I/O wrappers that report transferred bytes as progress.
//!
//! [`ProgressReader`] and [`ProgressWriter`] wrap any [`Read`] or [`Write`] and
//! pass data through unchanged. After every successful call the tracker is
//! moved to the cumulative byte count through a manual step override, so the
//! tracker's total should be the expected number of bytes.
//!
//! A failure to draw the progress line never fails the wrapped call: the bytes
//! have already moved by then. The first such error is kept, rendering stops,
//! counting goes on, and the error is available through `render_error`.

use std::io::{self, Read, Write};

use tracing::warn;

use crate::{
    clock::Clock,
    error::Error,
    progress::{AdvanceOptions, ProgressTracker},
};

/// Moves `tracker` to `bytes`, parking the first render failure in `error`.
fn report<W: Write, C: Clock>(
    tracker: &mut ProgressTracker<W, C>,
    error: &mut Option<Error>,
    bytes: u64,
) {
    if error.is_some() {
        let _ = tracker.advance(AdvanceOptions::hidden().with_step(bytes));
    } else if let Err(err) = tracker.advance(AdvanceOptions::new().with_step(bytes)) {
        warn!(error = %err, "progress output failed, rendering disabled");
        *error = Some(err);
    }
}

/// A [`Read`] wrapper that advances a tracker by bytes read.
pub struct ProgressReader<R, W, C> {
    inner: R,
    tracker: ProgressTracker<W, C>,
    bytes: u64,
    error: Option<Error>,
}

impl<R, W, C> ProgressReader<R, W, C> {
    /// Wraps `inner`, reporting to `tracker`.
    pub const fn new(inner: R, tracker: ProgressTracker<W, C>) -> Self {
        Self {
            inner,
            tracker,
            bytes: 0,
            error: None,
        }
    }

    /// Bytes read so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes
    }

    /// The tracker being driven.
    #[must_use]
    pub const fn tracker(&self) -> &ProgressTracker<W, C> {
        &self.tracker
    }

    /// The first error hit while drawing the progress line, if any.
    #[must_use]
    pub const fn render_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Splits the wrapper back into its parts.
    pub fn into_parts(self) -> (R, ProgressTracker<W, C>) {
        (self.inner, self.tracker)
    }
}

impl<R: Read, W: Write, C: Clock> Read for ProgressReader<R, W, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.bytes += n as u64;
            report(&mut self.tracker, &mut self.error, self.bytes);
        }
        Ok(n)
    }
}

/// A [`Write`] wrapper that advances a tracker by bytes written.
pub struct ProgressWriter<I, W, C> {
    inner: I,
    tracker: ProgressTracker<W, C>,
    bytes: u64,
    error: Option<Error>,
}

impl<I, W, C> ProgressWriter<I, W, C> {
    /// Wraps `inner`, reporting to `tracker`.
    pub const fn new(inner: I, tracker: ProgressTracker<W, C>) -> Self {
        Self {
            inner,
            tracker,
            bytes: 0,
            error: None,
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// The first error hit while drawing the progress line, if any.
    #[must_use]
    pub const fn render_error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Splits the wrapper back into its parts.
    pub fn into_parts(self) -> (I, ProgressTracker<W, C>) {
        (self.inner, self.tracker)
    }
}

impl<I: Write, W: Write, C: Clock> Write for ProgressWriter<I, W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if n > 0 {
            self.bytes += n as u64;
            report(&mut self.tracker, &mut self.error, self.bytes);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
