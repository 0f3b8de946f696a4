use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::*;

use super::overlap::merge_spans;

/// How room occupancy turns into a fully-booked decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapacityPolicy {
    /// A room touched by any active reservation in the window counts as
    /// occupied for the whole search.
    #[default]
    AnyOverlap,
    /// Fully booked only if on some single day every room is held at once.
    Concurrent,
}

impl std::str::FromStr for CapacityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any-overlap" | "any_overlap" | "any" => Ok(CapacityPolicy::AnyOverlap),
            "concurrent" => Ok(CapacityPolicy::Concurrent),
            other => Err(format!("unknown capacity policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityVerdict {
    pub occupied_rooms: usize,
    pub total_rooms: Option<u32>,
    pub fully_booked: bool,
}

/// Distinct rooms held by an active reservation overlapping `window`.
pub fn occupied_rooms(window: &DateSpan, reservations: &[&ReservationRecord]) -> usize {
    reservations
        .iter()
        .filter(|r| r.active_stay().is_some_and(|s| s.overlaps(window)))
        .filter_map(|r| r.unit())
        .collect::<HashSet<_>>()
        .len()
}

/// A property without a positive room count is never excluded.
pub fn is_fully_booked(total_rooms: Option<u32>, occupied: usize) -> bool {
    match total_rooms {
        Some(total) if total > 0 => occupied >= total as usize,
        _ => false,
    }
}

/// Judge one property's room inventory for `window`.
pub fn assess(
    window: &DateSpan,
    total_rooms: Option<u32>,
    reservations: &[&ReservationRecord],
    policy: CapacityPolicy,
) -> CapacityVerdict {
    let occupied = occupied_rooms(window, reservations);
    let fully_booked = match policy {
        CapacityPolicy::AnyOverlap => is_fully_booked(total_rooms, occupied),
        CapacityPolicy::Concurrent => {
            // Can't saturate on any day unless the any-overlap count already does.
            is_fully_booked(total_rooms, occupied)
                && total_rooms.is_some_and(|total| {
                    !saturated_spans(&room_spans(window, reservations), total).is_empty()
                })
        }
    };
    CapacityVerdict {
        occupied_rooms: occupied,
        total_rooms,
        fully_booked,
    }
}

/// Per-room held spans inside `window`, each room's own bookings merged so a
/// room never counts twice on the same day.
fn room_spans(window: &DateSpan, reservations: &[&ReservationRecord]) -> Vec<DateSpan> {
    let mut by_room: HashMap<&str, Vec<DateSpan>> = HashMap::new();
    for r in reservations {
        let (Some(unit), Some(stay)) = (r.unit(), r.active_stay()) else {
            continue;
        };
        if let Some(clamped) = stay.clamp(window) {
            by_room.entry(unit).or_default().push(clamped);
        }
    }

    let mut spans = Vec::new();
    for held in by_room.into_values() {
        spans.extend(merge_spans(&held));
    }
    spans
}

/// Day ranges on which at least `rooms` of the `held` spans are in force at
/// once, sorted. Each span is one room's merged occupancy.
pub fn saturated_spans(held: &[DateSpan], rooms: u32) -> Vec<DateSpan> {
    if rooms == 0 {
        return Vec::new();
    }

    // net change in held rooms on each boundary day
    let mut deltas: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for span in held {
        *deltas.entry(span.start).or_default() += 1;
        *deltas.entry(span.end).or_default() -= 1;
    }

    let mut saturated = Vec::new();
    let mut in_use = 0i64;
    let mut since: Option<NaiveDate> = None;
    for (day, delta) in deltas {
        in_use += delta;
        match (in_use >= i64::from(rooms), since) {
            (true, None) => since = Some(day),
            (false, Some(start)) => {
                saturated.push(DateSpan::new(start, day));
                since = None;
            }
            _ => {}
        }
    }
    saturated
}
