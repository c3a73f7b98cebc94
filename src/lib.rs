//! # `tickbar`
//!
//! A single-line, in-place updating progress indicator for long-running loops.
//!
//! `tickbar` draws one progress line and keeps redrawing it in place:
//!
//! * **Throttled**: renders are spaced by a configurable maximum frequency, except the
//!   final completion render, which is always drawn.
//! * **Informative**: each line shows a bar, the completion percentage, an ETA derived from
//!   the average time per step, and optionally the throughput.
//! * **Plain**: the old line is backspaced over, blanked, and backspaced over again; no ANSI
//!   cursor control and no terminal capability detection.
//!
//! ```no_run
//! use tickbar::{AdvanceOptions, ProgressTracker};
//!
//! let mut tracker = ProgressTracker::new(1_000)?;
//! for i in 0..1_000 {
//!     // ... one unit of work ...
//!     if i % 250 == 0 {
//!         tracker.advance(AdvanceOptions::new().with_interleaved(format!("checkpoint {i}")))?;
//!     } else {
//!         tracker.tick()?;
//!     }
//! }
//! # Ok::<(), tickbar::Error>(())
//! ```
//!
//! ## Modules
//!
//! * [`builder`]: [`TrackerBuilder`] and the [`TrackerOptions`] configuration value.
//! * [`progress`]: The core [`ProgressTracker`] state machine and [`ProgressSnapshot`] metrics.
//! * [`render`]: Pluggable [`BarRenderer`] strategies.
//! * [`clock`]: Time sources, including a [`ManualClock`] for deterministic tests.
//! * [`iter`]: Extension traits for tracking progress on Iterators.
//! * [`io`]: Wrappers for [`std::io::Read`] and [`std::io::Write`] that track bytes.
//!
//! ## Threading
//!
//! A [`ProgressTracker`] has a single owner. It is `Send` but not `Sync`; callers that
//! need to share one across threads must add their own synchronization.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod builder;
pub mod clock;
pub mod error;
pub mod format;
pub mod io;
pub mod iter;
pub mod progress;
pub mod render;

pub use builder::{TrackerBuilder, TrackerOptions};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use iter::{ProgressIter, ProgressIteratorExt};
pub use progress::{AdvanceOptions, BAR_WIDTH, ProgressSnapshot, ProgressTracker};
pub use render::{BarRenderer, RendererKind, SimpleRenderer, SubCellRenderer};
