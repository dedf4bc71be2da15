//! Date utilities: the `yyyy-MM-dd` wire format and the injected clock.

use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::{FileUploadError, Result};

/// Format used for every date stored in a metadata record.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date as `yyyy-MM-dd`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `yyyy-MM-dd` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Source of the current calendar date.
pub trait Clock: Send + Sync {
    /// Today's date on the server.
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the server's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock reporting the date in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct ZonedClock {
    tz: Tz,
}

impl ZonedClock {
    /// Create a clock for the given IANA timezone name (e.g., "Asia/Tokyo", "UTC").
    pub fn new(timezone: &str) -> Result<Self> {
        let tz = timezone
            .parse()
            .map_err(|_| FileUploadError::Config(format!("unknown timezone: {timezone}")))?;
        Ok(Self { tz })
    }
}

impl Clock for ZonedClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// Clock that always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Build the clock for an optional configured timezone.
pub fn clock_for(timezone: Option<&str>) -> Result<Box<dyn Clock>> {
    match timezone {
        Some(tz) => Ok(Box::new(ZonedClock::new(tz)?)),
        None => Ok(Box::new(LocalClock)),
    }
}
