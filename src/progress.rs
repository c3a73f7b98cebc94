//! The progress tracker state machine.
//!
//! [`ProgressTracker`] owns everything needed to draw a single progress line:
//! the step counter, the timing state used for throttling and ETA, and the
//! output stream. Each call to [`advance`](ProgressTracker::advance) moves the
//! counter and, unless throttled, erases the previous line and draws a new one
//! in its place.
//!
//! # Throttling
//!
//! A render happens only when the caller asks for one (`force_display`) and
//! either the configured minimum interval has passed since the previous render
//! or the run is complete. The completion render is never suppressed.
//!
//! # Erasure
//!
//! The previous line is reclaimed by backspacing over it, overwriting it with
//! spaces, and backspacing again. No ANSI cursor control is used, so a line
//! that wrapped across several terminal rows will not be fully erased.
//!
//! # Threading
//!
//! A tracker has exactly one writer. It may be moved to another thread but is
//! deliberately not `Sync`; wrap it in a lock if it really must be shared.

use std::{cell::Cell, io::Write, marker::PhantomData, time::Duration};

use compact_str::CompactString;
use tracing::{debug, trace};
use web_time::Instant;

use crate::{
    builder::TrackerBuilder,
    clock::Clock,
    error::Result,
    format::{format_elapsed, format_eta},
    render::BarRenderer,
};

/// Number of cells between the brackets of the bar.
pub const BAR_WIDTH: usize = 21;

const BACKSPACE: char = '\x08';

/// A single-line, in-place updating progress indicator.
///
/// Create one with [`ProgressTracker::new`] or [`TrackerBuilder`], then call
/// [`tick`](Self::tick) (or [`advance`](Self::advance)) once per unit of work.
pub struct ProgressTracker<W = std::io::Stdout, C = crate::clock::SystemClock> {
    pub(crate) total: u64,
    pub(crate) position: u64,

    pub(crate) start: Instant,
    pub(crate) last_render: Instant,
    pub(crate) min_interval: Duration,

    pub(crate) prefix: CompactString,
    pub(crate) show_throughput: bool,
    pub(crate) renderer: Box<dyn BarRenderer>,

    /// Characters in the most recently drawn line; 0 before the first render.
    pub(crate) last_len: usize,

    pub(crate) writer: W,
    pub(crate) clock: C,

    // Single-writer state: Send, but not Sync.
    pub(crate) _not_sync: PhantomData<Cell<()>>,
}

/// Per-call options for [`ProgressTracker::advance`].
///
/// Every field has a default, so callers only set what they need:
///
/// ```
/// use tickbar::AdvanceOptions;
///
/// let opts = AdvanceOptions::new().with_message("parsing").with_step(7);
/// assert!(opts.force_display);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdvanceOptions {
    /// Whether a render is wanted this call. Defaults to `true`.
    ///
    /// Passing `false` skips rendering entirely, even at completion.
    pub force_display: bool,
    /// Appended to the end of the progress line.
    pub trailing_message: CompactString,
    /// Printed once above the progress line, scrolling normally.
    pub interleaved_message: CompactString,
    /// Absolute step to jump to instead of incrementing by one.
    pub step: Option<u64>,
}

impl Default for AdvanceOptions {
    fn default() -> Self {
        Self {
            force_display: true,
            trailing_message: CompactString::default(),
            interleaved_message: CompactString::default(),
            step: None,
        }
    }
}

impl AdvanceOptions {
    /// Same as [`AdvanceOptions::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances without drawing.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            force_display: false,
            ..Self::default()
        }
    }

    /// Sets the trailing message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<CompactString>) -> Self {
        self.trailing_message = message.into();
        self
    }

    /// Sets the interleaved message.
    #[must_use]
    pub fn with_interleaved(mut self, message: impl Into<CompactString>) -> Self {
        self.interleaved_message = message.into();
        self
    }

    /// Sets the manual step override.
    #[must_use]
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = Some(step);
        self
    }

    /// Sets whether a render is wanted.
    #[must_use]
    pub fn with_display(mut self, force_display: bool) -> Self {
        self.force_display = force_display;
        self
    }
}

impl ProgressTracker {
    /// Creates a tracker with default options that draws to standard output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `total` is zero.
    pub fn new(total: u64) -> Result<Self> {
        TrackerBuilder::new(total).build()
    }
}

impl<W: Write, C: Clock> ProgressTracker<W, C> {
    /// Advances by one step with default options.
    pub fn tick(&mut self) -> Result<bool> {
        self.advance(AdvanceOptions::default())
    }

    /// Updates the step counter and redraws the line if the throttle allows it.
    ///
    /// Returns `Ok(true)` if a line was written, `Ok(false)` if the render was
    /// skipped (hidden, or throttled before completion).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if writing to the output stream fails.
    pub fn advance(&mut self, options: AdvanceOptions) -> Result<bool> {
        self.position = options
            .step
            .unwrap_or_else(|| self.position.saturating_add(1));

        if !options.force_display {
            trace!(position = self.position, "render not requested");
            return Ok(false);
        }

        let now = self.clock.now();
        let complete = self.is_complete();
        let since_last = now.saturating_duration_since(self.last_render);
        if !complete && since_last < self.min_interval {
            trace!(position = self.position, ?since_last, "render throttled");
            return Ok(false);
        }

        self.render(now, complete, &options)?;
        Ok(true)
    }

    fn render(&mut self, now: Instant, complete: bool, options: &AdvanceOptions) -> Result<()> {
        let snapshot = self.snapshot_at(now);
        let percent = snapshot.percent();

        let mut line = String::with_capacity(self.last_len.max(64));
        line.push_str(&self.prefix);
        line.push('[');
        line.push_str(&self.renderer.render(percent, BAR_WIDTH));
        line.push(']');
        line.push_str(&format!(
            "  {percent:6.2}%  ETA: {}  ",
            format_eta(snapshot.eta())
        ));
        if self.show_throughput {
            line.push_str(&format!("{:.3} iter/s", snapshot.throughput()));
        }
        line.push_str(&options.trailing_message);
        if complete {
            line.push_str(" done ");
            line.push_str(&format_elapsed(snapshot.elapsed()));
        } else {
            line.push_str("  ");
        }

        let mut out = erase_sequence(self.last_len);
        if !options.interleaved_message.is_empty() {
            out.push_str(&options.interleaved_message);
            out.push('\n');
        }
        out.push_str(&line);
        if complete {
            out.push('\n');
        }

        self.writer.write_all(out.as_bytes())?;
        self.writer.flush()?;

        self.last_len = line.chars().count();
        self.last_render = now;

        if complete {
            debug!(
                position = self.position,
                total = self.total,
                elapsed = ?snapshot.elapsed(),
                "progress complete"
            );
        }
        Ok(())
    }
}

impl<W, C: Clock> ProgressTracker<W, C> {
    /// Captures the current counters and elapsed time.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.snapshot_at(self.clock.now())
    }

    /// Time since construction, according to the tracker's clock.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.start)
    }

    fn snapshot_at(&self, now: Instant) -> ProgressSnapshot {
        ProgressSnapshot {
            position: self.position,
            total: self.total,
            elapsed: now.saturating_duration_since(self.start),
        }
    }
}

impl<W, C> ProgressTracker<W, C> {
    /// Current step.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Expected number of steps.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Completion as a percentage. Not clamped: overshooting the total yields more than 100.
    #[must_use]
    pub fn percent(&self) -> f64 {
        percent_of(self.position, self.total)
    }

    /// Whether the completion percentage has reached 100.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percent() >= 100.0
    }

    /// Character count of the most recently drawn line.
    #[must_use]
    pub const fn last_rendered_len(&self) -> usize {
        self.last_len
    }

    /// Minimum spacing between two in-progress renders.
    #[must_use]
    pub const fn min_render_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of cells in the bar.
    #[must_use]
    pub const fn bar_width(&self) -> usize {
        BAR_WIDTH
    }

    /// Returns a reference to the output stream.
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Consumes the tracker and returns the output stream.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W, C> std::fmt::Debug for ProgressTracker<W, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("position", &self.position)
            .field("total", &self.total)
            .field("prefix", &self.prefix)
            .field("renderer", &self.renderer)
            .finish_non_exhaustive()
    }
}

/// Backspace over `len` characters, blank them, and backspace again.
fn erase_sequence(len: usize) -> String {
    let mut erase = String::with_capacity(len * 3);
    erase.extend(std::iter::repeat_n(BACKSPACE, len));
    erase.extend(std::iter::repeat_n(' ', len));
    erase.extend(std::iter::repeat_n(BACKSPACE, len));
    erase
}

#[allow(clippy::cast_precision_loss)]
fn percent_of(position: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        position as f64 * 100.0 / total as f64
    }
}

/// A plain-data view of a tracker's counters at one instant.
///
/// Derived metrics such as ETA and throughput are computed from the average
/// rate since the tracker was created.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressSnapshot {
    position: u64,
    total: u64,
    elapsed: Duration,
}

impl ProgressSnapshot {
    /// Current step.
    #[must_use]
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Expected number of steps.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Time since the tracker was created.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Completion percentage, unclamped.
    #[must_use]
    pub fn percent(&self) -> f64 {
        percent_of(self.position, self.total)
    }

    /// Estimates the time remaining from the average time per step.
    ///
    /// Returns `None` when no step has completed yet, since the rate is undefined.
    /// Once the position reaches the total the estimate is zero.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn eta(&self) -> Option<Duration> {
        if self.position == 0 {
            return None;
        }
        let per_step = self.elapsed.as_secs_f64() / self.position as f64;
        let remaining = self.total.saturating_sub(self.position) as f64;
        Duration::try_from_secs_f64(per_step * remaining).ok()
    }

    /// Average steps per second since the tracker was created.
    ///
    /// Returns `0.0` while no time has elapsed.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.position as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{AdvanceOptions, BAR_WIDTH, ProgressSnapshot, ProgressTracker};
    use crate::{
        builder::TrackerBuilder,
        clock::ManualClock,
        render::{BarRenderer, RendererKind},
    };

    fn tracker(total: u64) -> (ProgressTracker<Vec<u8>, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let tracker = TrackerBuilder::new(total)
            .with_writer(Vec::<u8>::new())
            .with_clock(clock.clone())
            .build()
            .unwrap();
        (tracker, clock)
    }

    fn output(tracker: &ProgressTracker<Vec<u8>, ManualClock>) -> String {
        String::from_utf8(tracker.writer().clone()).unwrap()
    }

    /// Single Step Run
    /// One tick on a one-step tracker draws a full bar and commits the line.
    #[test]
    fn test_single_step_completion() {
        let (mut t, clock) = tracker(1);
        clock.advance(Duration::from_millis(1_500));

        assert!(t.tick().unwrap());

        let out = output(&t);
        assert_eq!(
            out,
            format!(
                "[{}]  100.00%  ETA: 00:00:00   done 00:00:01.500\n",
                "#".repeat(BAR_WIDTH)
            )
        );
        assert_eq!(t.last_rendered_len(), out.chars().count() - 1);
    }

    /// Throttling
    /// A second in-progress render inside the interval is suppressed.
    #[test]
    fn test_throttle() {
        let (mut t, clock) = tracker(100);
        assert_eq!(t.min_render_interval(), Duration::from_millis(100));

        // Construction counts as the last render.
        assert!(!t.tick().unwrap());

        clock.advance(Duration::from_millis(100));
        assert!(t.tick().unwrap());

        clock.advance(Duration::from_millis(99));
        assert!(!t.tick().unwrap());

        clock.advance(Duration::from_millis(1));
        assert!(t.tick().unwrap());
        assert_eq!(t.position(), 4);
    }

    /// Completion Bypasses Throttle
    #[test]
    fn test_completion_never_throttled() {
        let (mut t, clock) = tracker(2);
        clock.advance(Duration::from_secs(1));
        assert!(t.tick().unwrap());
        // No time passes at all before the final step.
        assert!(t.tick().unwrap());
        assert!(output(&t).ends_with('\n'));
    }

    /// Hidden Advances
    /// `force_display = false` skips rendering even at completion.
    #[test]
    fn test_hidden_advance() {
        let (mut t, clock) = tracker(1);
        clock.advance(Duration::from_secs(5));
        assert!(!t.advance(AdvanceOptions::hidden()).unwrap());
        assert_eq!(t.position(), 1);
        assert!(t.writer().is_empty());
    }

    /// Bar Fill
    /// With four steps the bar grows by floor(25% * 21) cells.
    #[test]
    fn test_bar_fill_quarters() {
        let (mut t, clock) = tracker(4);

        clock.advance(Duration::from_secs(1));
        t.tick().unwrap();
        let first = format!("[{}{}]", "#".repeat(5), " ".repeat(16));
        assert!(output(&t).starts_with(&first), "{}", output(&t));

        clock.advance(Duration::from_secs(1));
        t.tick().unwrap();
        let second = format!("[{}{}]", "#".repeat(10), " ".repeat(11));
        assert!(output(&t).contains(&second));
    }

    /// In-Place Redraw
    /// The second render erases exactly the characters of the first.
    #[test]
    fn test_erase_previous_line() {
        let (mut t, clock) = tracker(10);
        clock.advance(Duration::from_secs(1));
        t.advance(AdvanceOptions::new().with_message("warming up"))
            .unwrap();
        let first = output(&t);
        let first_len = first.chars().count();
        assert_eq!(t.last_rendered_len(), first_len);
        assert!(!first.ends_with('\n'));

        clock.advance(Duration::from_secs(1));
        t.advance(AdvanceOptions::new().with_interleaved("checkpoint saved"))
            .unwrap();
        let all = output(&t);
        let second = &all[first.len()..];

        let erase = format!(
            "{}{}{}",
            "\x08".repeat(first_len),
            " ".repeat(first_len),
            "\x08".repeat(first_len)
        );
        assert!(second.starts_with(&erase));

        let rest = &second[erase.len()..];
        let (message, line) = rest.split_once('\n').unwrap();
        assert_eq!(message, "checkpoint saved");
        assert_eq!(t.last_rendered_len(), line.chars().count());
    }

    /// Manual Override
    #[test]
    #[allow(clippy::float_cmp)]
    fn test_manual_step() {
        let (mut t, _clock) = tracker(10);
        t.advance(AdvanceOptions::hidden()).unwrap();
        t.advance(AdvanceOptions::hidden().with_step(7)).unwrap();
        assert_eq!(t.percent(), 70.0);

        // Overrides are taken verbatim, even backwards.
        t.advance(AdvanceOptions::hidden().with_step(3)).unwrap();
        assert_eq!(t.position(), 3);
    }

    /// Overshoot
    /// Percent goes past 100 while the bar stays at full width.
    #[test]
    fn test_overshoot() {
        let (mut t, _clock) = tracker(4);
        t.advance(AdvanceOptions::new().with_step(6)).unwrap();

        let out = output(&t);
        assert!(out.contains(&format!("[{}]", "#".repeat(BAR_WIDTH))));
        assert!(out.contains("150.00%"));
        assert!(out.contains("ETA: 00:00:00"));
    }

    /// Zero-Step Render
    /// An explicit step of 0 renders the ETA placeholder instead of dividing by zero.
    #[test]
    fn test_eta_placeholder() {
        let (mut t, clock) = tracker(10);
        clock.advance(Duration::from_secs(1));
        t.advance(AdvanceOptions::new().with_step(0)).unwrap();
        assert!(output(&t).contains("ETA: --:--:--"));
    }

    /// Throughput Text
    #[test]
    fn test_throughput_text() {
        let clock = ManualClock::new();
        let mut t = TrackerBuilder::new(10)
            .with_throughput(true)
            .with_prefix("load ")
            .with_writer(Vec::<u8>::new())
            .with_clock(clock.clone())
            .build()
            .unwrap();

        clock.advance(Duration::from_secs(4));
        t.advance(AdvanceOptions::new().with_message(" | ok")).unwrap();

        let out = output(&t);
        assert!(out.starts_with("load ["));
        assert!(out.ends_with("ETA: 00:00:36  0.250 iter/s | ok  "), "{out}");
    }

    /// Sub-Cell Bar
    /// Half of 21 cells is ten full blocks plus a half block.
    #[test]
    fn test_sub_cell_render() {
        let clock = ManualClock::new();
        let mut t = TrackerBuilder::new(2)
            .with_renderer_kind(RendererKind::SubCell)
            .with_writer(Vec::<u8>::new())
            .with_clock(clock.clone())
            .build()
            .unwrap();

        clock.advance(Duration::from_secs(1));
        assert!(t.tick().unwrap());

        let bar = format!("[{}▌{}]", "█".repeat(10), " ".repeat(10));
        assert!(output(&t).starts_with(&bar), "{}", output(&t));
    }

    #[derive(Debug)]
    struct Dots;

    impl BarRenderer for Dots {
        fn render(&self, _percent: f64, width: usize) -> String {
            ".".repeat(width)
        }
    }

    /// Custom Renderer
    #[test]
    fn test_custom_renderer() {
        let mut t = TrackerBuilder::new(1)
            .with_renderer(Dots)
            .with_writer(Vec::<u8>::new())
            .with_clock(ManualClock::new())
            .build()
            .unwrap();

        t.tick().unwrap();
        assert!(output(&t).starts_with(&format!("[{}]  100.00%", ".".repeat(BAR_WIDTH))));
    }

    /// Snapshot Math
    /// ETA and throughput follow the average rate; zero progress has no ETA.
    #[test]
    fn test_snapshot_math() {
        let snap = ProgressSnapshot {
            position: 0,
            total: 10,
            elapsed: Duration::ZERO,
        };
        assert!(snap.eta().is_none());
        assert!(snap.throughput().abs() < f64::EPSILON);

        let snap = ProgressSnapshot {
            position: 5,
            total: 10,
            elapsed: Duration::from_secs(10),
        };
        assert_eq!(snap.eta(), Some(Duration::from_secs(10)));
        assert!((snap.throughput() - 0.5).abs() < 1e-9);
    }
}
