use std::collections::BTreeSet;
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::dates::parse_strict_date;
use crate::engine::{AvailabilityFilter, CapacityPolicy, MetadataCache, SearchError};
use crate::limits::*;
use crate::model::*;
use crate::observability::{RESERVATION_FALLBACK_TOTAL, SEARCHES_TOTAL, SEARCH_DURATION_SECONDS};
use crate::source::{collect_reservations, referenced_rooms, resolve_rooms, ListingSource, SourceError};

/// Raw search parameters as they arrive from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub page_size: usize,
    pub room_batch_size: usize,
    pub capacity_policy: CapacityPolicy,
    /// Fail the search when reservations can't be fetched instead of
    /// answering without them.
    pub strict: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page_size: RESERVATION_PAGE_SIZE,
            room_batch_size: ROOM_LOOKUP_BATCH_SIZE,
            capacity_policy: CapacityPolicy::default(),
            strict: false,
        }
    }
}

/// A surviving property with its availability detail alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyListing {
    #[serde(flatten)]
    pub property: PropertyCandidate,
    #[serde(flatten)]
    pub availability: AvailabilityMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub properties: Vec<PropertyListing>,
    pub available_types: Vec<String>,
    /// False when a dated search was answered without reservation data.
    pub reservations_checked: bool,
}

/// Parse and validate the requested dates.
pub fn parse_requested_dates(request: &SearchRequest) -> Result<RequestedDates, SearchError> {
    let check_in = parse_optional("check_in", request.check_in.as_deref())?;
    let check_out = parse_optional("check_out", request.check_out.as_deref())?;

    if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
        if check_out <= check_in {
            return Err(SearchError::InvalidWindow {
                check_in,
                check_out,
            });
        }
        if (check_out - check_in).num_days() > MAX_STAY_NIGHTS {
            return Err(SearchError::LimitExceeded("stay window too wide"));
        }
    }

    Ok(RequestedDates::new(check_in, check_out))
}

/// Blank reads as not supplied; anything else must parse.
fn parse_optional(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, SearchError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_strict_date(s)
            .map(Some)
            .ok_or_else(|| SearchError::MalformedDate {
                field,
                raw: s.to_string(),
            }),
    }
}

fn matches_field(value: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|w| !w.is_empty()) {
        None => true,
        Some(wanted) => value.is_some_and(|v| v.trim().eq_ignore_ascii_case(wanted)),
    }
}

/// Sorted distinct types across `properties`, or the default type when
/// none carries one.
pub fn available_types(properties: &[PropertyCandidate]) -> Vec<String> {
    let types: BTreeSet<String> = properties
        .iter()
        .filter_map(|p| p.property_type.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if types.is_empty() {
        vec![DEFAULT_PROPERTY_TYPE.to_string()]
    } else {
        types.into_iter().collect()
    }
}

/// Reservations and room ownership for a dated search.
async fn fetch_occupancy(
    source: &dyn ListingSource,
    window: &DateSpan,
    options: &SearchOptions,
) -> Result<(Vec<ReservationRecord>, RoomToPropertyMap), SourceError> {
    let reservations = collect_reservations(source, window, options.page_size).await?;
    let room_ids = referenced_rooms(&reservations);
    let rooms = resolve_rooms(source, &room_ids, options.room_batch_size).await;
    info!(
        "{} reservations across {} rooms ({} linked) for {}..{}",
        reservations.len(),
        room_ids.len(),
        rooms.len(),
        window.start,
        window.end
    );
    Ok((reservations, rooms))
}

/// Run one property search end to end.
pub async fn search(
    source: &dyn ListingSource,
    request: &SearchRequest,
    options: &SearchOptions,
) -> Result<SearchResponse, SearchError> {
    let started = Instant::now();
    let result = run_search(source, request, options).await;

    let outcome = match &result {
        Ok(r) if r.reservations_checked => "ok",
        Ok(_) => "fallback",
        Err(_) => "error",
    };
    metrics::counter!(SEARCHES_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(SEARCH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
    result
}

async fn run_search(
    source: &dyn ListingSource,
    request: &SearchRequest,
    options: &SearchOptions,
) -> Result<SearchResponse, SearchError> {
    let requested = parse_requested_dates(request)?;
    let properties = source.fetch_properties().await?;

    let (reservations, rooms, reservations_checked) = match requested.window() {
        None => (Vec::new(), RoomToPropertyMap::new(), true),
        Some(window) => match fetch_occupancy(source, &window, options).await {
            Ok((reservations, rooms)) => (reservations, rooms, true),
            Err(e) if options.strict => return Err(e.into()),
            Err(e) => {
                warn!("reservation check skipped, results may include booked properties: {e}");
                metrics::counter!(RESERVATION_FALLBACK_TOTAL).increment(1);
                (Vec::new(), RoomToPropertyMap::new(), false)
            }
        },
    };

    let cache = MetadataCache::new();
    let filter = AvailabilityFilter::new(requested, &reservations, &rooms, &cache)
        .with_policy(options.capacity_policy);

    let listings: Vec<PropertyListing> = properties
        .iter()
        .filter(|p| matches_field(p.property_type.as_deref(), request.property_type.as_deref()))
        .filter(|p| matches_field(p.city.as_deref(), request.location.as_deref()))
        .filter_map(|p| {
            let verdict = filter.verdict(p);
            verdict.available.then(|| PropertyListing {
                property: p.clone(),
                availability: if reservations_checked {
                    verdict.metadata
                } else {
                    AvailabilityMetadata::default()
                },
            })
        })
        .collect();

    info!(
        "search matched {} of {} properties",
        listings.len(),
        properties.len()
    );

    Ok(SearchResponse {
        properties: listings,
        available_types: available_types(&properties),
        reservations_checked,
    })
}
