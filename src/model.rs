use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;

/// Half-open calendar interval `[start, end)`. Each day in it is one night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start < end, "DateSpan start must be before end");
        Self { start, end }
    }

    /// `None` for zero or negative length.
    pub fn try_new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn overlaps(&self, other: &DateSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    /// Intersection, or `None` when the spans share no day.
    pub fn clamp(&self, other: &DateSpan) -> Option<DateSpan> {
        DateSpan::try_new(self.start.max(other.start), self.end.min(other.end))
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        dates::days(self.start, self.end)
    }
}

/// Dates a search asked about. Either side may be missing; only a request
/// carrying both is checked against reservations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestedDates {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

impl RequestedDates {
    pub fn new(check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) -> Self {
        Self { check_in, check_out }
    }

    pub fn stay(stay: DateSpan) -> Self {
        Self {
            check_in: Some(stay.start),
            check_out: Some(stay.end),
        }
    }

    /// The complete window, if both sides are present and ascending.
    pub fn window(&self) -> Option<DateSpan> {
        DateSpan::try_new(self.check_in?, self.check_out?)
    }
}

/// Outer bound a property can ever be offered in. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredWindow {
    #[serde(default, with = "crate::dates::lenient")]
    pub start_of_availability: Option<NaiveDate>,
    #[serde(default, with = "crate::dates::lenient")]
    pub end_of_availability: Option<NaiveDate>,
}

impl DeclaredWindow {
    /// Build from raw CRM strings; a malformed side reads as open.
    pub fn from_raw(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start_of_availability: start.and_then(dates::parse_strict_date),
            end_of_availability: end.and_then(dates::parse_strict_date),
        }
    }
}

/// Statuses that mean a reservation no longer holds its room.
const CANCELLED_STATUSES: &[&str] = &["cancelada", "cancelado", "cancelled", "canceled"];

/// One existing booking of a room, as handed over by the listing source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    #[serde(default)]
    pub id: String,
    /// Room (unit) the booking holds.
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default, with = "crate::dates::lenient")]
    pub check_in: Option<NaiveDate>,
    #[serde(default, with = "crate::dates::lenient")]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub status: String,
}

impl ReservationRecord {
    pub fn is_cancelled(&self) -> bool {
        let status = self.status.trim();
        CANCELLED_STATUSES
            .iter()
            .any(|s| status.eq_ignore_ascii_case(s))
    }

    /// Unit id with blanks treated as missing.
    pub fn unit(&self) -> Option<&str> {
        self.unit_id
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// The booked nights, if both dates parsed and form a positive span.
    pub fn stay(&self) -> Option<DateSpan> {
        DateSpan::try_new(self.check_in?, self.check_out?)
    }

    /// Stay that still holds its room: not cancelled and well-formed.
    pub fn active_stay(&self) -> Option<DateSpan> {
        if self.is_cancelled() {
            return None;
        }
        self.stay()
    }
}

/// A listed property: the aggregate whose occupancy gets judged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyCandidate {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub property_type: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Declared room inventory; `None` when the CRM has no count.
    #[serde(default)]
    pub total_rooms: Option<u32>,
    #[serde(flatten)]
    pub availability: DeclaredWindow,
}

/// Per-property availability detail for one search. Serialized onto each
/// listing in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityMetadata {
    pub available_dates: Vec<String>,
    pub unavailable_dates: Vec<String>,
    pub available_nights: u32,
    pub is_fully_available: bool,
}

impl Default for AvailabilityMetadata {
    fn default() -> Self {
        Self {
            available_dates: Vec::new(),
            unavailable_dates: Vec::new(),
            available_nights: 0,
            is_fully_available: true,
        }
    }
}

/// Room id -> owning property id.
pub type RoomToPropertyMap = HashMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn span_basics() {
        let s = DateSpan::new(d(2025, 3, 1), d(2025, 3, 5));
        assert_eq!(s.nights(), 4);
        assert!(s.contains_day(d(2025, 3, 1)));
        assert!(s.contains_day(d(2025, 3, 4)));
        assert!(!s.contains_day(d(2025, 3, 5))); // half-open
        assert_eq!(s.days().count(), 4);
    }

    #[test]
    fn span_overlap() {
        let a = DateSpan::new(d(2025, 3, 1), d(2025, 3, 5));
        let b = DateSpan::new(d(2025, 3, 4), d(2025, 3, 8));
        let c = DateSpan::new(d(2025, 3, 5), d(2025, 3, 8));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // checkout day is free for the next arrival
    }

    #[test]
    fn span_clamp() {
        let window = DateSpan::new(d(2025, 3, 1), d(2025, 3, 5));
        let long = DateSpan::new(d(2025, 2, 20), d(2025, 3, 3));
        assert_eq!(
            window.clamp(&long),
            Some(DateSpan::new(d(2025, 3, 1), d(2025, 3, 3)))
        );
        let after = DateSpan::new(d(2025, 3, 5), d(2025, 3, 9));
        assert_eq!(window.clamp(&after), None);
    }

    #[test]
    fn try_new_rejects_empty_and_inverted() {
        assert!(DateSpan::try_new(d(2025, 3, 1), d(2025, 3, 1)).is_none());
        assert!(DateSpan::try_new(d(2025, 3, 2), d(2025, 3, 1)).is_none());
    }

    #[test]
    fn requested_window_needs_both_sides() {
        assert!(RequestedDates::default().window().is_none());
        assert!(RequestedDates::new(Some(d(2025, 3, 1)), None).window().is_none());
        let both = RequestedDates::new(Some(d(2025, 3, 1)), Some(d(2025, 3, 2)));
        assert_eq!(both.window().map(|w| w.nights()), Some(1));
    }

    #[test]
    fn cancelled_status_matching() {
        let mut r = ReservationRecord {
            status: "Cancelada".into(),
            ..Default::default()
        };
        assert!(r.is_cancelled());
        r.status = " cancelled ".into();
        assert!(r.is_cancelled());
        r.status = "Confirmada".into();
        assert!(!r.is_cancelled());
    }

    #[test]
    fn blank_unit_is_missing() {
        let r = ReservationRecord {
            unit_id: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(r.unit(), None);
    }

    #[test]
    fn active_stay_requires_valid_dates() {
        let r = ReservationRecord {
            check_in: Some(d(2025, 3, 3)),
            check_out: Some(d(2025, 3, 3)),
            ..Default::default()
        };
        assert_eq!(r.active_stay(), None);
    }

    #[test]
    fn declared_window_from_raw() {
        let w = DeclaredWindow::from_raw(Some("2025-01-01"), Some("31/31/2025"));
        assert_eq!(w.start_of_availability, Some(d(2025, 1, 1)));
        assert_eq!(w.end_of_availability, None);
    }

    #[test]
    fn property_reads_camel_case_json() {
        let json = r#"{
            "id": "P1",
            "type": "Apartamento",
            "city": "Valencia",
            "totalRooms": 3,
            "startOfAvailability": "2025-01-01",
            "endOfAvailability": "not-a-date"
        }"#;
        let p: PropertyCandidate = serde_json::from_str(json).unwrap();
        assert_eq!(p.total_rooms, Some(3));
        assert_eq!(p.property_type.as_deref(), Some("Apartamento"));
        assert_eq!(p.availability.start_of_availability, Some(d(2025, 1, 1)));
        assert_eq!(p.availability.end_of_availability, None);
    }

    #[test]
    fn default_metadata_is_fully_available() {
        let m = AvailabilityMetadata::default();
        assert!(m.is_fully_available);
        assert_eq!(m.available_nights, 0);
        assert!(m.available_dates.is_empty() && m.unavailable_dates.is_empty());
    }
}
