//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an RFC 3339 string such as the gateway's `expires_at`.
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value)
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// Creates a timestamp from Unix seconds.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the duration from another timestamp to this one.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Creates a new timestamp by adding whole seconds.
    pub fn plus_secs(&self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Adds calendar months, clamping to the last day of shorter months
    /// (Jan 31 + 1 month = Feb 28/29).
    pub fn add_months(&self, months: u32) -> Self {
        Self(
            self.0
                .checked_add_months(Months::new(months))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// Adds calendar years.
    pub fn add_years(&self, years: u32) -> Self {
        self.add_months(years.saturating_mul(12))
    }

    /// RFC 3339 rendering used in API responses.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn at(value: &str) -> Timestamp {
        Timestamp::parse_rfc3339(value).unwrap()
    }

    #[test]
    fn timestamp_now_creates_current_time() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = at("2024-01-15T10:30:00-03:00");
        assert_eq!(ts.as_datetime().to_rfc3339(), "2024-01-15T13:30:00+00:00");
    }

    #[test]
    fn rejects_garbage_rfc3339() {
        assert!(Timestamp::parse_rfc3339("tomorrow").is_none());
    }

    #[test]
    fn add_months_uses_calendar_months() {
        let ts = at("2024-03-15T12:00:00Z").add_months(1);
        assert_eq!(ts.as_datetime().month(), 4);
        assert_eq!(ts.as_datetime().day(), 15);
    }

    #[test]
    fn add_months_clamps_to_end_of_month() {
        let ts = at("2024-01-31T00:00:00Z").add_months(1);
        assert_eq!(ts.as_datetime().month(), 2);
        assert_eq!(ts.as_datetime().day(), 29);
    }

    #[test]
    fn add_years_keeps_day_and_month() {
        let ts = at("2024-06-10T08:00:00Z").add_years(1);
        assert_eq!(ts.as_datetime().year(), 2025);
        assert_eq!(ts.as_datetime().month(), 6);
        assert_eq!(ts.as_datetime().day(), 10);
    }

    #[test]
    fn plus_secs_moves_forward() {
        let start = at("2024-01-01T00:00:00Z");
        assert_eq!(start.plus_secs(3600).duration_since(&start).num_minutes(), 60);
    }

    #[test]
    fn from_unix_secs_round_trips_epoch() {
        let ts = Timestamp::from_unix_secs(0).unwrap();
        assert_eq!(ts.to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn timestamp_serializes_as_string() {
        let json = serde_json::to_string(&at("2024-01-15T10:30:00Z")).unwrap();
        assert!(json.contains("2024-01-15T10:30:00"));
    }
}
