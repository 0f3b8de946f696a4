use crate::dates;
use crate::model::*;

// ── Overlap Calculator ────────────────────────────────────────────

/// Day-level availability of one property over `window`.
///
/// Every active reservation is clamped to the window; the clamped spans are
/// merged into the reserved set and the free set is the window minus that.
/// The two sets partition the window, so every night lands in exactly one of
/// `unavailable_dates` / `available_dates`.
pub fn compute_metadata(window: &DateSpan, reservations: &[&ReservationRecord]) -> AvailabilityMetadata {
    let reserved = reserved_spans(window, reservations);
    let free = free_spans(window, &reserved);

    let unavailable_dates: Vec<String> = reserved
        .iter()
        .flat_map(|s| s.days())
        .map(dates::iso)
        .collect();
    let available_dates: Vec<String> = free
        .iter()
        .flat_map(|s| s.days())
        .map(dates::iso)
        .collect();

    AvailabilityMetadata {
        available_nights: available_dates.len() as u32,
        is_fully_available: unavailable_dates.is_empty(),
        available_dates,
        unavailable_dates,
    }
}

/// Clamped, sorted, disjoint spans of `window` held by some active reservation.
/// Cancelled, zero-length, undated and out-of-window records contribute nothing.
pub fn reserved_spans(window: &DateSpan, reservations: &[&ReservationRecord]) -> Vec<DateSpan> {
    let clamped: Vec<DateSpan> = reservations
        .iter()
        .filter_map(|r| r.active_stay())
        .filter_map(|stay| stay.clamp(window))
        .collect();
    merge_spans(&clamped)
}

/// Collapse spans that overlap or touch. Input order doesn't matter; the
/// result is sorted by start.
pub fn merge_spans(spans: &[DateSpan]) -> Vec<DateSpan> {
    let mut ordered = spans.to_vec();
    ordered.sort_by_key(|s| (s.start, s.end));
    ordered.into_iter().fold(Vec::new(), |mut merged: Vec<DateSpan>, span| {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
        merged
    })
}

/// Nights of `window` left once `reserved` is taken out. `reserved` is
/// sorted and disjoint, as `reserved_spans` returns it.
pub fn free_spans(window: &DateSpan, reserved: &[DateSpan]) -> Vec<DateSpan> {
    let mut free = Vec::new();
    let mut cursor = window.start;
    for held in reserved {
        if held.start >= window.end {
            break;
        }
        free.extend(DateSpan::try_new(cursor, held.start));
        cursor = cursor.max(held.end);
    }
    free.extend(DateSpan::try_new(cursor, window.end));
    free
}
