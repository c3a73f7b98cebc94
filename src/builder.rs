//! Configuration and construction of [`ProgressTracker`] instances.
//!
//! [`ProgressTracker::new`] covers the common case. The [`TrackerBuilder`]
//! exposes every option, plus the injection points used by tests and
//! embedders:
//!
//! * **Output:** any [`std::io::Write`] can replace standard output.
//! * **Time:** any [`Clock`] can replace the system clock, which makes
//!   throttling and ETA deterministic under a [`ManualClock`](crate::ManualClock).
//!
//! [`TrackerOptions`] is the same configuration as a plain value. With the
//! `serde` feature enabled it can be loaded from a config file.

use std::{cell::Cell, io::Stdout, marker::PhantomData, time::Duration};

use compact_str::CompactString;
use tracing::debug;

use crate::{
    clock::{Clock, SystemClock},
    error::{Error, Result},
    progress::ProgressTracker,
    render::{BarRenderer, DEFAULT_GLYPH, RendererKind},
};

/// Default upper bound on the render rate, in hertz.
pub const DEFAULT_MAX_FREQUENCY_HZ: f64 = 10.0;

/// Construction-time options for a tracker.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrackerOptions {
    /// Append `X.XXX iter/s` to the line.
    pub show_throughput: bool,
    /// Text placed before the bar.
    pub prefix: CompactString,
    /// Maximum number of in-progress renders per second.
    pub max_update_frequency_hz: f64,
    /// Fill glyph for the simple renderer.
    pub bar_glyph: char,
    /// Which built-in renderer draws the bar.
    pub renderer: RendererKind,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            show_throughput: false,
            prefix: CompactString::default(),
            max_update_frequency_hz: DEFAULT_MAX_FREQUENCY_HZ,
            bar_glyph: DEFAULT_GLYPH,
            renderer: RendererKind::Simple,
        }
    }
}

/// A builder for [`ProgressTracker`].
///
/// ```
/// use tickbar::TrackerBuilder;
///
/// let tracker = TrackerBuilder::new(250)
///     .with_prefix("indexing ")
///     .with_throughput(true)
///     .with_max_frequency(4.0)
///     .with_writer(Vec::<u8>::new())
///     .build()
///     .unwrap();
///
/// assert_eq!(tracker.total(), 250);
/// ```
pub struct TrackerBuilder<W = Stdout, C = SystemClock> {
    total: u64,
    options: TrackerOptions,
    renderer: Option<Box<dyn BarRenderer>>,
    writer: W,
    clock: C,
}

impl TrackerBuilder {
    /// Starts a builder for `total` steps with default options.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self::from_options(total, TrackerOptions::default())
    }

    /// Starts a builder from a complete set of options.
    #[must_use]
    pub fn from_options(total: u64, options: TrackerOptions) -> Self {
        Self {
            total,
            options,
            renderer: None,
            writer: std::io::stdout(),
            clock: SystemClock,
        }
    }
}

impl<W, C> TrackerBuilder<W, C> {
    /// Sets the text placed before the bar.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<CompactString>) -> Self {
        self.options.prefix = prefix.into();
        self
    }

    /// Enables or disables the throughput field.
    #[must_use]
    pub fn with_throughput(mut self, show: bool) -> Self {
        self.options.show_throughput = show;
        self
    }

    /// Sets the maximum render rate in hertz. Validated in [`build`](Self::build).
    #[must_use]
    pub fn with_max_frequency(mut self, hz: f64) -> Self {
        self.options.max_update_frequency_hz = hz;
        self
    }

    /// Sets the fill glyph of the simple renderer.
    #[must_use]
    pub fn with_glyph(mut self, glyph: char) -> Self {
        self.options.bar_glyph = glyph;
        self
    }

    /// Selects one of the built-in renderers.
    #[must_use]
    pub fn with_renderer_kind(mut self, kind: RendererKind) -> Self {
        self.options.renderer = kind;
        self.renderer = None;
        self
    }

    /// Uses a custom renderer, overriding [`with_renderer_kind`](Self::with_renderer_kind).
    #[must_use]
    pub fn with_renderer(mut self, renderer: impl BarRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Replaces the output stream.
    #[must_use]
    pub fn with_writer<W2>(self, writer: W2) -> TrackerBuilder<W2, C> {
        TrackerBuilder {
            total: self.total,
            options: self.options,
            renderer: self.renderer,
            writer,
            clock: self.clock,
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock<C2>(self, clock: C2) -> TrackerBuilder<W, C2> {
        TrackerBuilder {
            total: self.total,
            options: self.options,
            renderer: self.renderer,
            writer: self.writer,
            clock,
        }
    }
}

impl<W, C: Clock> TrackerBuilder<W, C> {
    /// Validates the configuration and creates the tracker.
    ///
    /// The start time and the initial "last render" time are both taken from
    /// the clock now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `total` is zero or the maximum
    /// frequency is not a positive finite number.
    pub fn build(self) -> Result<ProgressTracker<W, C>> {
        if self.total == 0 {
            return Err(Error::InvalidArgument(
                "total steps must be greater than zero".into(),
            ));
        }
        let min_interval = min_render_interval(self.options.max_update_frequency_hz)?;

        let renderer = self.renderer.unwrap_or_else(|| {
            self.options
                .renderer
                .instantiate(self.options.bar_glyph)
        });

        debug!(
            total = self.total,
            ?min_interval,
            show_throughput = self.options.show_throughput,
            prefix = %self.options.prefix,
            ?renderer,
            "creating progress tracker"
        );

        let now = self.clock.now();
        Ok(ProgressTracker {
            total: self.total,
            position: 0,
            start: now,
            last_render: now,
            min_interval,
            prefix: self.options.prefix,
            show_throughput: self.options.show_throughput,
            renderer,
            last_len: 0,
            writer: self.writer,
            clock: self.clock,
            _not_sync: PhantomData::<Cell<()>>,
        })
    }
}

fn min_render_interval(hz: f64) -> Result<Duration> {
    if !hz.is_finite() || hz <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "maximum update frequency must be a positive finite number, got {hz}"
        )));
    }
    Duration::try_from_secs_f64(1.0 / hz).map_err(|_| {
        Error::InvalidArgument(format!("maximum update frequency {hz} Hz is too small"))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{TrackerBuilder, TrackerOptions};
    use crate::{Error, render::RendererKind};

    /// Rejected Configuration
    #[test]
    fn test_validation() {
        assert!(matches!(
            TrackerBuilder::new(0).build(),
            Err(Error::InvalidArgument(_))
        ));
        for hz in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e-320] {
            let result = TrackerBuilder::new(10)
                .with_max_frequency(hz)
                .with_writer(Vec::<u8>::new())
                .build();
            assert!(
                matches!(result, Err(Error::InvalidArgument(_))),
                "{hz} should be rejected"
            );
        }
    }

    #[test]
    fn test_frequency_to_interval() {
        let t = TrackerBuilder::new(10)
            .with_max_frequency(4.0)
            .with_writer(Vec::<u8>::new())
            .build()
            .unwrap();
        assert_eq!(t.min_render_interval(), Duration::from_millis(250));
        assert_eq!(t.position(), 0);
        assert_eq!(t.last_rendered_len(), 0);
    }

    /// Options Round Trip
    /// A builder created from options keeps the chosen renderer and glyph.
    #[test]
    fn test_from_options() {
        let options = TrackerOptions {
            bar_glyph: '=',
            renderer: RendererKind::SubCell,
            ..TrackerOptions::default()
        };
        let t = TrackerBuilder::from_options(8, options)
            .with_writer(Vec::<u8>::new())
            .build()
            .unwrap();
        assert!(format!("{t:?}").contains("SubCellRenderer"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_options_from_json() {
        let options: TrackerOptions =
            serde_json::from_str(r#"{"prefix": "sync ", "renderer": "sub_cell"}"#).unwrap();
        assert_eq!(options.prefix, "sync ");
        assert_eq!(options.renderer, RendererKind::SubCell);
        assert!((options.max_update_frequency_hz - 10.0).abs() < f64::EPSILON);
    }
}
