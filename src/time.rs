use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Deref;

/// Timestamp wraps chrono::DateTime and serializes as the ISO 8601 form the
/// admin API uses, e.g. `2026-01-23T09:00:00.000Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    pub fn new(dt: DateTime<Utc>) -> Self {
        Timestamp(dt)
    }

    /// Parse an RFC 3339 timestamp with any offset
    pub fn parse(s: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Timestamp(dt.with_timezone(&Utc)))
    }

    /// Get ISO 8601 formatted string with milliseconds and `Z`
    pub fn iso(&self) -> String {
        to_iso_millis(self.0)
    }

    /// Calendar day in UTC
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

impl Deref for Timestamp {
    type Target = DateTime<Utc>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(t: Timestamp) -> Self {
        t.0
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.iso())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}

/// Format as `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn to_iso_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Midnight UTC of the given instant's day
pub fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&dt.date_naive().and_time(NaiveTime::MIN))
}

/// Midnight UTC on the first day of the given instant's month
pub fn start_of_month(dt: DateTime<Utc>) -> DateTime<Utc> {
    let first = dt.date_naive().with_day(1).unwrap_or_else(|| dt.date_naive());
    Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN))
}

/// Move an instant to another calendar day, keeping its time of day
pub fn reschedule(old: DateTime<Utc>, target: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&target.and_time(old.time()))
}
