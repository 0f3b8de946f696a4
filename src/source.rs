use std::collections::HashSet;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::limits::*;
use crate::model::*;
use crate::observability::{
    RESERVATIONS_FETCHED_TOTAL, RESERVATION_PAGES_TOTAL, ROOM_LOOKUP_BATCHES_TOTAL,
};

#[derive(Debug)]
pub enum SourceError {
    /// The backing system could not be reached or refused the call.
    Unavailable(String),
    /// A response arrived but could not be read.
    Malformed(String),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Unavailable(msg) => write!(f, "source unavailable: {msg}"),
            SourceError::Malformed(msg) => write!(f, "malformed source response: {msg}"),
            SourceError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// One page of a paginated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

/// Where properties, reservations and room ownership come from (the CRM in
/// production). Records arrive already normalized.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_properties(&self) -> Result<Vec<PropertyCandidate>, SourceError>;

    /// One page of non-cancelled reservations that may touch `window`
    /// (inclusive on both ends), plus records whose dates are unknown.
    async fn fetch_reservations(
        &self,
        window: &DateSpan,
        page: Page,
    ) -> Result<Vec<ReservationRecord>, SourceError>;

    /// Owning property for each room id the source knows. Unknown ids are
    /// absent from the result.
    async fn lookup_room_properties(
        &self,
        room_ids: &[String],
    ) -> Result<RoomToPropertyMap, SourceError>;
}

/// Page through every reservation touching `window`, until the first short
/// or empty page. Any page error fails the whole collection: a partial set
/// would under-report occupancy.
///
/// A full page that brings no reservation id not already seen means the
/// source is serving the same rows again instead of advancing; that fails
/// with `Malformed` rather than looping forever.
pub async fn collect_reservations(
    source: &dyn ListingSource,
    window: &DateSpan,
    page_size: usize,
) -> Result<Vec<ReservationRecord>, SourceError> {
    collect_reservations_up_to(source, window, page_size, MAX_RESERVATION_RECORDS).await
}

async fn collect_reservations_up_to(
    source: &dyn ListingSource,
    window: &DateSpan,
    page_size: usize,
    max_records: usize,
) -> Result<Vec<ReservationRecord>, SourceError> {
    let limit = page_size.max(1);
    let mut all: Vec<ReservationRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut offset = 0;

    loop {
        let batch = source
            .fetch_reservations(window, Page { offset, limit })
            .await?;
        metrics::counter!(RESERVATION_PAGES_TOTAL).increment(1);
        metrics::counter!(RESERVATIONS_FETCHED_TOTAL).increment(batch.len() as u64);
        debug!("reservation page at offset {offset}: {} records", batch.len());

        let short = batch.len() < limit;
        // records without an id can't be told apart, so they always count as new
        let fresh = batch
            .iter()
            .filter(|r| r.id.is_empty() || seen.insert(r.id.clone()))
            .count();
        if !short && fresh == 0 {
            warn!("listing source repeated a page at offset {offset}");
            return Err(SourceError::Malformed(format!(
                "reservation page at offset {offset} repeats earlier records"
            )));
        }

        all.extend(batch);
        if short {
            return Ok(all);
        }
        if all.len() > max_records {
            return Err(SourceError::LimitExceeded("too many reservations"));
        }
        offset += limit;
    }
}

/// Resolve room ids to owning properties in concurrent batches. Duplicate
/// ids are looked up once. A failed batch is logged and skipped; its rooms
/// stay unlinked.
pub async fn resolve_rooms(
    source: &dyn ListingSource,
    room_ids: &[String],
    batch_size: usize,
) -> RoomToPropertyMap {
    let mut seen = HashSet::new();
    let unique: Vec<String> = room_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect();
    if unique.is_empty() {
        return RoomToPropertyMap::new();
    }

    let lookups = unique
        .chunks(batch_size.max(1))
        .map(|batch| source.lookup_room_properties(batch));
    let results = join_all(lookups).await;

    let mut map = RoomToPropertyMap::new();
    for result in results {
        match result {
            Ok(found) => {
                metrics::counter!(ROOM_LOOKUP_BATCHES_TOTAL, "status" => "ok").increment(1);
                map.extend(found);
            }
            Err(e) => {
                metrics::counter!(ROOM_LOOKUP_BATCHES_TOTAL, "status" => "error").increment(1);
                warn!("room lookup batch failed, its rooms stay unlinked: {e}");
            }
        }
    }
    map
}

/// Distinct room ids referenced by `reservations`, in first-seen order.
pub fn referenced_rooms(reservations: &[ReservationRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    reservations
        .iter()
        .filter_map(|r| r.unit())
        .filter(|unit| seen.insert(*unit))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves `total` synthetic reservations and records every page asked for.
    struct Paged {
        total: usize,
        pages: Mutex<Vec<Page>>,
        lookups: AtomicUsize,
        fail_lookups_containing: Option<&'static str>,
        /// Serve the first page for every request.
        ignore_offset: bool,
        anonymous: bool,
    }

    impl Paged {
        fn new(total: usize) -> Self {
            Self {
                total,
                pages: Mutex::new(Vec::new()),
                lookups: AtomicUsize::new(0),
                fail_lookups_containing: None,
                ignore_offset: false,
                anonymous: false,
            }
        }
    }

    #[async_trait]
    impl ListingSource for Paged {
        async fn fetch_properties(&self) -> Result<Vec<PropertyCandidate>, SourceError> {
            Ok(Vec::new())
        }

        async fn fetch_reservations(
            &self,
            _window: &DateSpan,
            page: Page,
        ) -> Result<Vec<ReservationRecord>, SourceError> {
            self.pages.lock().unwrap().push(page);
            let offset = if self.ignore_offset { 0 } else { page.offset };
            let end = offset.saturating_add(page.limit).min(self.total);
            Ok((offset..end)
                .map(|i| ReservationRecord {
                    id: if self.anonymous { String::new() } else { format!("B{i}") },
                    unit_id: Some(format!("R{}", i % 7)),
                    ..Default::default()
                })
                .collect())
        }

        async fn lookup_room_properties(
            &self,
            room_ids: &[String],
        ) -> Result<RoomToPropertyMap, SourceError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if let Some(bad) = self.fail_lookups_containing
                && room_ids.iter().any(|r| r == bad) {
                    return Err(SourceError::Unavailable("lookup refused".into()));
                }
            Ok(room_ids
                .iter()
                .map(|r| (r.clone(), format!("P-{r}")))
                .collect())
        }
    }

    fn window() -> DateSpan {
        DateSpan::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        )
    }

    #[tokio::test]
    async fn pages_until_short_page() {
        let source = Paged::new(450);
        let all = collect_reservations(&source, &window(), 200).await.unwrap();
        assert_eq!(all.len(), 450);
        let pages = source.pages.lock().unwrap().clone();
        assert_eq!(
            pages,
            vec![
                Page { offset: 0, limit: 200 },
                Page { offset: 200, limit: 200 },
                Page { offset: 400, limit: 200 },
            ]
        );
    }

    #[tokio::test]
    async fn exact_multiple_ends_on_empty_page() {
        let source = Paged::new(400);
        let all = collect_reservations(&source, &window(), 200).await.unwrap();
        assert_eq!(all.len(), 400);
        assert_eq!(source.pages.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn long_calendars_page_past_any_page_count() {
        let source = Paged::new(1_200);
        let all = collect_reservations(&source, &window(), 1).await.unwrap();
        assert_eq!(all.len(), 1_200);
        assert_eq!(source.pages.lock().unwrap().len(), 1_201);
    }

    #[tokio::test]
    async fn source_repeating_a_page_is_malformed() {
        let mut source = Paged::new(usize::MAX);
        source.ignore_offset = true;
        let result = collect_reservations(&source, &window(), 10).await;
        assert!(matches!(result, Err(SourceError::Malformed(_))));
        // first page is new, the second repeats it
        assert_eq!(source.pages.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn endless_source_hits_record_ceiling() {
        let source = Paged::new(usize::MAX);
        let result = collect_reservations_up_to(&source, &window(), 10, 95).await;
        assert!(matches!(result, Err(SourceError::LimitExceeded(_))));
        assert_eq!(source.pages.lock().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn anonymous_records_do_not_look_like_a_repeat() {
        let mut source = Paged::new(4);
        source.anonymous = true;
        let all = collect_reservations(&source, &window(), 2).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn rooms_resolved_in_batches_without_duplicates() {
        let source = Paged::new(0);
        let ids: Vec<String> = (0..120).map(|i| format!("R{}", i % 110)).collect();
        let map = resolve_rooms(&source, &ids, 50).await;
        assert_eq!(map.len(), 110);
        assert_eq!(source.lookups.load(Ordering::SeqCst), 3);
        assert_eq!(map["R7"], "P-R7");
    }

    #[tokio::test]
    async fn failed_batch_leaves_rooms_unlinked() {
        let mut source = Paged::new(0);
        source.fail_lookups_containing = Some("R0");
        let ids: Vec<String> = (0..60).map(|i| format!("R{i}")).collect();
        let map = resolve_rooms(&source, &ids, 50).await;
        // first batch (R0..R49) failed, second (R50..R59) resolved
        assert_eq!(map.len(), 10);
        assert!(!map.contains_key("R0"));
        assert!(map.contains_key("R55"));
    }

    #[tokio::test]
    async fn no_rooms_no_lookups() {
        let source = Paged::new(0);
        let map = resolve_rooms(&source, &[], 50).await;
        assert!(map.is_empty());
        assert_eq!(source.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn referenced_rooms_dedups_and_skips_missing() {
        let records = vec![
            ReservationRecord {
                unit_id: Some("R1".into()),
                ..Default::default()
            },
            ReservationRecord::default(),
            ReservationRecord {
                unit_id: Some("R1".into()),
                ..Default::default()
            },
            ReservationRecord {
                unit_id: Some("R2".into()),
                ..Default::default()
            },
        ];
        assert_eq!(referenced_rooms(&records), vec!["R1", "R2"]);
    }
}
