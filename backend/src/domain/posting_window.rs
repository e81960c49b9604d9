//! Local time-of-day window during which posts may be created.

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

/// Half-open local window `[start, end)` evaluated in a fixed offset.
///
/// # Examples
/// ```
/// use chrono::{FixedOffset, NaiveTime, TimeZone, Utc};
/// use lunchbox::domain::PostingWindow;
///
/// let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
/// let window = PostingWindow::new(
///     NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
///     tokyo,
/// );
/// // 03:30 UTC is 12:30 in Tokyo.
/// let lunch = Utc.with_ymd_and_hms(2026, 4, 1, 3, 30, 0).unwrap();
/// assert!(window.is_open_at(lunch));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingWindow {
    start: NaiveTime,
    end: NaiveTime,
    offset: FixedOffset,
    always_open: bool,
}

impl PostingWindow {
    /// Window open from `start` (inclusive) to `end` (exclusive) local time.
    ///
    /// When `end` is not after `start` the window wraps past midnight.
    pub fn new(start: NaiveTime, end: NaiveTime, offset: FixedOffset) -> Self {
        Self {
            start,
            end,
            offset,
            always_open: false,
        }
    }

    /// A window that never closes.
    pub fn always_open(offset: FixedOffset) -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
            offset,
            always_open: true,
        }
    }

    /// Offset the window is evaluated in.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Whether posting is allowed at `instant`.
    pub fn is_open_at(&self, instant: DateTime<Utc>) -> bool {
        if self.always_open {
            return true;
        }
        let local = instant.with_timezone(&self.offset).time();
        if self.start < self.end {
            self.start <= local && local < self.end
        } else {
            local >= self.start || local < self.end
        }
    }
}
