pub mod alarms;
pub mod config;
pub mod exam;
pub mod quote;
pub mod stats;
pub mod task;
pub mod timer;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use studydesk_core::storage::{Config, Database};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Config and database for the current data directory.
pub fn open() -> Result<(Config, Database), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    Ok((config, db))
}

/// Parse a local date-time: RFC 3339, `YYYY-MM-DD HH:MM`, or `YYYY-MM-DD`
/// (midnight).
pub fn parse_when(raw: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|_| format!("cannot parse '{raw}' as a date/time (try 'YYYY-MM-DD HH:MM')"))?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("'{raw}' does not exist in the local time zone"))?;
    Ok(local.with_timezone(&Utc))
}

/// Format a UTC instant in local time for listings.
pub fn local(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
