// ── Request limits ───────────────────────────────────────────────

/// Widest stay a search may ask about.
pub const MAX_STAY_NIGHTS: i64 = 731;

// ── Collaborator batching ────────────────────────────────────────

/// Reservations requested per page from the listing source.
pub const RESERVATION_PAGE_SIZE: usize = 200;

/// Ceiling on reservation records gathered for one search, far above any
/// real calendar. Only an endlessly paging source gets near it.
pub const MAX_RESERVATION_RECORDS: usize = 5_000_000;

/// Room ids per room -> property lookup batch.
pub const ROOM_LOOKUP_BATCH_SIZE: usize = 50;

// ── Listing defaults ─────────────────────────────────────────────

/// Reported as the only type when no fetched property carries one.
pub const DEFAULT_PROPERTY_TYPE: &str = "Apartamento";
