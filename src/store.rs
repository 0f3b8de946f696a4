use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::*;
use crate::source::{ListingSource, Page, SourceError};

/// Everything a listing source serves, as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub properties: Vec<PropertyCandidate>,
    #[serde(default)]
    pub reservations: Vec<ReservationRecord>,
    /// Room id -> owning property id.
    #[serde(default)]
    pub rooms: RoomToPropertyMap,
}

impl Snapshot {
    /// Two reservations sharing an id are rejected: loading would keep only
    /// one of them.
    pub fn from_json(raw: &str) -> Result<Self, SourceError> {
        let snapshot: Self =
            serde_json::from_str(raw).map_err(|e| SourceError::Malformed(e.to_string()))?;

        if let Some(dup) = first_duplicate_id(&snapshot.reservations) {
            return Err(SourceError::Malformed(format!("duplicate reservation id {dup}")));
        }
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }
}

fn first_duplicate_id(reservations: &[ReservationRecord]) -> Option<String> {
    let mut ids = HashSet::new();
    reservations
        .iter()
        .map(|r| r.id.as_str())
        .filter(|id| !id.is_empty())
        .find(|id| !ids.insert(*id))
        .map(str::to_string)
}

/// Listing source held entirely in memory. Stands in for the CRM in the
/// binary, benches and tests.
pub struct InMemorySource {
    properties: DashMap<String, PropertyCandidate>,
    reservations: DashMap<String, ReservationRecord>,
    rooms: DashMap<String, String>,
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySource {
    pub fn new() -> Self {
        Self {
            properties: DashMap::new(),
            reservations: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let source = Self::new();
        for p in snapshot.properties {
            source.insert_property(p);
        }
        for r in snapshot.reservations {
            source.insert_reservation(r);
        }
        for (room, property) in snapshot.rooms {
            source.map_room(room, property);
        }
        source
    }

    // ── Properties ───────────────────────────────────────────

    pub fn insert_property(&self, property: PropertyCandidate) {
        self.properties.insert(property.id.clone(), property);
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    // ── Reservations ─────────────────────────────────────────

    /// Records without an id are keyed by insertion position. Returns the
    /// record previously stored under the same id, if any.
    pub fn insert_reservation(&self, mut reservation: ReservationRecord) -> Option<ReservationRecord> {
        if reservation.id.is_empty() {
            reservation.id = format!("anon-{:08}", self.reservations.len());
        }
        let replaced = self.reservations.insert(reservation.id.clone(), reservation);
        if let Some(old) = &replaced {
            warn!("reservation {} replaced, previous booking dropped", old.id);
        }
        replaced
    }

    pub fn cancel_reservation(&self, id: &str) -> bool {
        match self.reservations.get_mut(id) {
            Some(mut r) => {
                r.status = "Cancelada".into();
                true
            }
            None => false,
        }
    }

    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }

    // ── Room index ───────────────────────────────────────────

    pub fn map_room(&self, room_id: String, property_id: String) {
        self.rooms.insert(room_id, property_id);
    }

    pub fn unmap_room(&self, room_id: &str) {
        self.rooms.remove(room_id);
    }
}

/// Same shape as the CRM query: `check_in <= window.end AND check_out >=
/// window.start AND not cancelled`. Records with a missing date are kept;
/// the engine decides what they mean.
fn may_touch(r: &ReservationRecord, window: &DateSpan) -> bool {
    if r.is_cancelled() {
        return false;
    }
    let starts_in_time = r.check_in.is_none_or(|ci| ci <= window.end);
    let ends_in_time = r.check_out.is_none_or(|co| co >= window.start);
    starts_in_time && ends_in_time
}

#[async_trait]
impl ListingSource for InMemorySource {
    async fn fetch_properties(&self) -> Result<Vec<PropertyCandidate>, SourceError> {
        let mut properties: Vec<PropertyCandidate> =
            self.properties.iter().map(|e| e.value().clone()).collect();
        properties.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(properties)
    }

    async fn fetch_reservations(
        &self,
        window: &DateSpan,
        page: Page,
    ) -> Result<Vec<ReservationRecord>, SourceError> {
        // Id order keeps pages stable between calls.
        let mut matching: Vec<ReservationRecord> = self
            .reservations
            .iter()
            .filter(|e| may_touch(e.value(), window))
            .map(|e| e.value().clone())
            .collect();
        matching.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

    async fn lookup_room_properties(
        &self,
        room_ids: &[String],
    ) -> Result<RoomToPropertyMap, SourceError> {
        Ok(room_ids
            .iter()
            .filter_map(|id| {
                self.rooms
                    .get(id)
                    .map(|p| (id.clone(), p.value().clone()))
            })
            .collect())
    }
}
