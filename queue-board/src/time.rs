//! Board clock.
//!
//! The board always shows Hong Kong time regardless of the host's zone.
//! Asia/Hong_Kong has had no DST since 1979, so a fixed UTC+08:00 offset is
//! exact.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Asia/Hong_Kong offset from UTC, in seconds.
pub const HONG_KONG_OFFSET_SECS: i32 = 8 * 60 * 60;

/// How often the clock ticker republishes.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Board time zone.
pub fn hong_kong() -> FixedOffset {
    FixedOffset::east_opt(HONG_KONG_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// How much of the time to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockPrecision {
    /// `HH:MM`
    #[default]
    Minutes,
    /// `HH:MM:SS`
    Seconds,
}

/// Format an instant as zero-padded 24-hour wall-clock time in `zone`.
pub fn format_clock(instant: DateTime<Utc>, zone: &FixedOffset, precision: ClockPrecision) -> String {
    let local = instant.with_timezone(zone);
    match precision {
        ClockPrecision::Minutes => local.format("%H:%M").to_string(),
        ClockPrecision::Seconds => local.format("%H:%M:%S").to_string(),
    }
}

/// Format an instant as `MM/DD/YYYY, HH:MM:SS` in `zone`.
pub fn format_date_time(instant: DateTime<Utc>, zone: &FixedOffset) -> String {
    instant
        .with_timezone(zone)
        .format("%m/%d/%Y, %H:%M:%S")
        .to_string()
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A running clock. Dropping it stops the ticker.
pub struct Clock {
    current: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl Clock {
    /// Spawn a ticker that republishes the formatted time every `period`.
    pub fn spawn(zone: FixedOffset, precision: ClockPrecision, period: Duration) -> Self {
        let (tx, rx) = watch::channel(format_clock(Utc::now(), &zone, precision));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let now = format_clock(Utc::now(), &zone, precision);
                // Only wake readers when the displayed text changes.
                tx.send_if_modified(|current| {
                    if *current == now {
                        false
                    } else {
                        *current = now;
                        true
                    }
                });
                if tx.is_closed() {
                    break;
                }
            }
        });

        Self { current: rx, task }
    }

    /// Latest formatted time.
    pub fn now(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current.clone()
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.task.abort();
    }
}
