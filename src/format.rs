//! Duration formatting for the ETA and completion stamps.

use std::time::Duration;

/// Shown in place of the ETA before any step has completed.
pub const ETA_UNKNOWN: &str = "--:--:--";

/// Durations up to this length get millisecond precision in the completion stamp.
pub const PRECISE_ELAPSED_LIMIT: Duration = Duration::from_secs(60);

/// Formats a duration as `HH:MM:SS`. Hours are not wrapped into days.
#[must_use]
pub fn format_hms(duration: Duration) -> String {
    let mut t = duration.as_secs();
    let seconds = t % 60;
    t /= 60;
    let minutes = t % 60;
    let hours = t / 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Formats a duration as `HH:MM:SS.mmm`.
#[must_use]
pub fn format_hms_millis(duration: Duration) -> String {
    format!("{}.{:03}", format_hms(duration), duration.subsec_millis())
}

/// Formats an optional ETA, falling back to [`ETA_UNKNOWN`].
#[must_use]
pub fn format_eta(eta: Option<Duration>) -> String {
    eta.map_or_else(|| ETA_UNKNOWN.to_owned(), format_hms)
}

/// Formats the total run time shown after `done`.
///
/// Short runs keep millisecond precision; anything longer than a minute is
/// truncated to whole seconds.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed <= PRECISE_ELAPSED_LIMIT {
        format_hms_millis(elapsed)
    } else {
        format_hms(elapsed)
    }
}
