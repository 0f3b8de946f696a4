// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total searches. Labels: outcome.
pub const SEARCHES_TOTAL: &str = "vacancy_searches_total";

/// Histogram: search latency in seconds.
pub const SEARCH_DURATION_SECONDS: &str = "vacancy_search_duration_seconds";

/// Counter: properties dropped from results. Labels: reason.
pub const PROPERTIES_EXCLUDED_TOTAL: &str = "vacancy_properties_excluded_total";

/// Counter: searches answered without reservation data.
pub const RESERVATION_FALLBACK_TOTAL: &str = "vacancy_reservation_fallback_total";

// ── Collaborator traffic ────────────────────────────────────────

/// Counter: reservation records received from the listing source.
pub const RESERVATIONS_FETCHED_TOTAL: &str = "vacancy_reservations_fetched_total";

/// Counter: reservation pages requested.
pub const RESERVATION_PAGES_TOTAL: &str = "vacancy_reservation_pages_total";

/// Counter: room -> property lookup batches. Labels: status.
pub const ROOM_LOOKUP_BATCHES_TOTAL: &str = "vacancy_room_lookup_batches_total";

// ── Evaluation ──────────────────────────────────────────────────

/// Counter: reservations whose room could not be traced to a property.
pub const UNLINKED_RESERVATIONS_TOTAL: &str = "vacancy_unlinked_reservations_total";

/// Counter: metadata served from the request memo.
pub const METADATA_CACHE_HITS_TOTAL: &str = "vacancy_metadata_cache_hits_total";

/// Exclusion reason label for `PROPERTIES_EXCLUDED_TOTAL`.
pub fn exclusion_label(admitted_by_declared: bool) -> &'static str {
    if admitted_by_declared {
        "fully_booked"
    } else {
        "outside_declared_window"
    }
}
