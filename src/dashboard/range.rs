use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

const SECONDS_PER_DAY: u64 = 86_400;
/// Longest window accepted anywhere, about a century
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// The `days` calendar days ending on (and including) `today`
    ///
    /// `days` is clamped to `1..=MAX_WINDOW_DAYS`; the start never goes
    /// below the earliest representable date.
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        let days = days.clamp(1, MAX_WINDOW_DAYS);
        let start = today
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("Range start {} is after range end {}", start, end);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered
    pub fn len_days(&self) -> u32 {
        ((self.end - self.start).num_days() + 1) as u32
    }

    /// Each day in the range, oldest first
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Parse a window length such as "7d", "30days", "2w" or a bare "7" into whole days
pub fn parse_window(s: &str) -> Result<u32> {
    let s = s.trim();
    let days = match s.parse::<u64>() {
        Ok(0) => bail!("Window must be at least one day: '{}'", s),
        Ok(days) => days,
        Err(_) => {
            let duration = humantime::parse_duration(s)
                .with_context(|| format!("Invalid window '{}'", s))?;
            let secs = duration.as_secs();
            if secs == 0 || secs % SECONDS_PER_DAY != 0 || duration.subsec_nanos() != 0 {
                bail!("Window must be a whole number of days: '{}'", s);
            }
            secs / SECONDS_PER_DAY
        }
    };

    if days > u64::from(MAX_WINDOW_DAYS) {
        bail!(
            "Window too large: '{}' (at most {} days)",
            s,
            MAX_WINDOW_DAYS
        );
    }
    Ok(days as u32)
}
