use anyhow::{Context, Result, bail};
use hifitime::Epoch;

pub const MILLISECONDS_PER_HOUR: i64 = 3_600_000;

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> Result<i64> {
    let now = Epoch::now().context("Failed to read the system clock")?;
    Ok(now.to_unix_milliseconds().round() as i64)
}

/// Closed interval of Unix milliseconds: `start_ms <= t <= end_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeWindow {
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self> {
        if start_ms > end_ms {
            bail!(
                "Window start ({}) is after window end ({})",
                start_ms,
                end_ms
            );
        }
        Ok(Self { start_ms, end_ms })
    }

    /// The lookback window `[now - hours, now]`.
    pub fn last_hours(now_ms: i64, hours: u32) -> Self {
        let start_ms = now_ms.saturating_sub(i64::from(hours) * MILLISECONDS_PER_HOUR);
        Self {
            start_ms,
            end_ms: now_ms,
        }
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms <= self.end_ms
    }

    pub fn duration_ms(&self) -> i64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}
