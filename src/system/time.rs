//! Time keeping for the watch face

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use embassy_time::Instant;

/// Device-wide 12h/24h preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockStyle {
    TwelveHour,
    #[default]
    TwentyFourHour,
}

/// Source of local wall-clock time
pub trait Clock {
    /// Current local time
    fn now(&self) -> NaiveDateTime;

    /// Current 12h/24h preference, read on every use
    fn clock_style(&self) -> ClockStyle;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }

    fn clock_style(&self) -> ClockStyle {
        (**self).clock_style()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimeReference {
    /// Clock time
    time: NaiveDateTime,
    /// Related system time
    instant: Instant,
}

impl Default for TimeReference {
    fn default() -> Self {
        Self {
            time: NaiveDateTime::default(),
            instant: Instant::from_ticks(0),
        }
    }
}

impl TimeReference {
    /// Create new time reference from NaiveDateTime
    pub fn from_datetime(time: NaiveDateTime) -> Self {
        Self {
            time,
            instant: Instant::now(),
        }
    }

    /// Create new time reference from a UNIX timestamp and a UTC offset in seconds.
    ///
    /// `None` when the result is outside the representable date range.
    pub fn from_timestamp(timestamp: i64, offset: i32) -> Option<Self> {
        let utc = NaiveDateTime::default().checked_add_signed(TimeDelta::try_seconds(timestamp)?)?;
        let local = utc.checked_add_signed(TimeDelta::seconds(offset as i64))?;
        Some(Self::from_datetime(local))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TimeManager {
    reference: TimeReference,
    style: ClockStyle,
}

impl TimeManager {
    /// Initialize time measurement on boot
    pub fn init(reference: TimeReference) -> Self {
        Self {
            reference,
            style: ClockStyle::default(),
        }
    }

    /// Get current time
    pub fn get_time(&self) -> NaiveDateTime {
        let elapsed = Instant::now().duration_since(self.reference.instant);
        let elapsed = i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX);
        self.reference
            .time
            .checked_add_signed(TimeDelta::microseconds(elapsed))
            .unwrap_or(self.reference.time)
    }

    /// Update time reference
    pub fn set_time(&mut self, reference: TimeReference) {
        self.reference = reference;
    }

    /// Change the 12h/24h preference
    pub fn set_clock_style(&mut self, style: ClockStyle) {
        self.style = style;
    }
}

impl Clock for TimeManager {
    fn now(&self) -> NaiveDateTime {
        self.get_time()
    }

    fn clock_style(&self) -> ClockStyle {
        self.style
    }
}

/// Turns a clock polled at any rate into one tick per wall-clock minute.
#[derive(Debug, Default)]
pub struct MinuteTicker {
    last: Option<NaiveDateTime>,
}

impl MinuteTicker {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Returns the start of the current minute when it has not been reported yet.
    ///
    /// The first poll always ticks. Setting the clock backwards ticks again
    /// as soon as the minute differs from the last one reported.
    pub fn poll(&mut self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let minute = now.with_second(0)?.with_nanosecond(0)?;
        if self.last == Some(minute) {
            return None;
        }
        self.last = Some(minute);
        Some(minute)
    }
}
