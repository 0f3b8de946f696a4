//! Calendar-day helpers. Every date in the crate is a UTC calendar day
//! (`NaiveDate`), so day arithmetic is exact and DST never enters into it.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a raw date string into a UTC calendar day.
///
/// Accepts plain ISO days, RFC 3339 / RFC 2822 instants (converted to UTC
/// before the day is taken) and offset-less datetimes (read as UTC).
/// Returns `None` for blank or unparseable input.
pub fn parse_strict_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc).date_naive());
    }
    if let Ok(instant) = DateTime::parse_from_rfc2822(raw) {
        return Some(instant.with_timezone(&Utc).date_naive());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Lazily walk every day in `[start, end)`. Empty when `start >= end`.
pub fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d < end)
}

/// Every day in `[start, end)` as ISO strings, ascending.
pub fn enumerate_days(start: NaiveDate, end: NaiveDate) -> Vec<String> {
    days(start, end).map(iso).collect()
}

/// Shift by `n` calendar days, saturating at the representable range.
pub fn add_days(date: NaiveDate, n: i64) -> NaiveDate {
    let shifted = if n >= 0 {
        date.checked_add_days(Days::new(n as u64))
    } else {
        date.checked_sub_days(Days::new(n.unsigned_abs()))
    };
    shifted.unwrap_or(if n >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Serde adapter for `Option<NaiveDate>` fields fed by loosely typed input.
/// Anything that does not parse reads as `None` instead of failing the record.
pub mod lenient {
    use chrono::NaiveDate;
    use serde::de::IgnoredAny;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        #[allow(dead_code)]
        Other(IgnoredAny),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<RawDate> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(RawDate::Text(s)) => super::parse_strict_date(&s),
            _ => None,
        })
    }

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_some(&super::iso(*d)),
            None => serializer.serialize_none(),
        }
    }
}
