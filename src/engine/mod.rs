mod cache;
mod capacity;
mod error;
mod index;
mod overlap;
mod policy;

pub use cache::MetadataCache;
pub use capacity::{
    assess, is_fully_booked, occupied_rooms, saturated_spans, CapacityPolicy,
    CapacityVerdict,
};
pub use error::SearchError;
pub use index::{build_index, ReservationIndex};
pub use overlap::{compute_metadata, free_spans, merge_spans, reserved_spans};
pub use policy::declared_window_admits;

use std::collections::HashMap;

use tracing::debug;

use crate::model::*;
use crate::observability::{exclusion_label, PROPERTIES_EXCLUDED_TOTAL, UNLINKED_RESERVATIONS_TOTAL};

/// Outcome for one property in one search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyVerdict {
    pub available: bool,
    pub admitted_by_declared: bool,
    /// `None` when no complete window was requested.
    pub capacity: Option<CapacityVerdict>,
    pub metadata: AvailabilityMetadata,
}

/// Verdicts for every evaluated property, keyed by property id.
#[derive(Debug, Default)]
pub struct Evaluation {
    verdicts: HashMap<String, PropertyVerdict>,
}

impl Evaluation {
    /// Unknown ids are not available.
    pub fn is_available(&self, property_id: &str) -> bool {
        self.verdicts.get(property_id).is_some_and(|v| v.available)
    }

    pub fn metadata(&self, property_id: &str) -> Option<&AvailabilityMetadata> {
        self.verdicts.get(property_id).map(|v| &v.metadata)
    }

    pub fn verdict(&self, property_id: &str) -> Option<&PropertyVerdict> {
        self.verdicts.get(property_id)
    }

    pub fn available_count(&self) -> usize {
        self.verdicts.values().filter(|v| v.available).count()
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn into_metadata(self) -> HashMap<String, AvailabilityMetadata> {
        self.verdicts
            .into_iter()
            .map(|(id, v)| (id, v.metadata))
            .collect()
    }
}

// ── Availability Filter ───────────────────────────────────────────

/// Per-request availability policy over one reservation snapshot.
///
/// Acceptance is two gates: the property's declared offering window must
/// admit the requested dates, and (when a complete window was requested) its
/// room inventory must not be exhausted. Day-level metadata is attached for
/// display but never gates on its own; one booked room must not hide a
/// multi-room property.
pub struct AvailabilityFilter<'a> {
    requested: RequestedDates,
    by_property: HashMap<&'a str, Vec<&'a ReservationRecord>>,
    cache: &'a MetadataCache,
    policy: CapacityPolicy,
}

impl<'a> AvailabilityFilter<'a> {
    pub fn new(
        requested: RequestedDates,
        reservations: &'a [ReservationRecord],
        rooms: &'a RoomToPropertyMap,
        cache: &'a MetadataCache,
    ) -> Self {
        let by_property = if requested.window().is_some() {
            let index = build_index(reservations);
            let (by_property, unlinked) = index.group_by_property(rooms);
            if unlinked > 0 {
                debug!("{unlinked} reservations not traceable to any property");
                metrics::counter!(UNLINKED_RESERVATIONS_TOTAL).increment(unlinked as u64);
            }
            by_property
        } else {
            HashMap::new()
        };

        Self {
            requested,
            by_property,
            cache,
            policy: CapacityPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CapacityPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn reservations_for(&self, property_id: &str) -> &[&'a ReservationRecord] {
        self.by_property.get(property_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_property_available(&self, property: &PropertyCandidate) -> bool {
        if !declared_window_admits(&property.availability, &self.requested) {
            return false;
        }
        match self.requested.window() {
            None => true,
            Some(window) => !self.capacity(property, &window).fully_booked,
        }
    }

    /// Day-level metadata for the requested window; the default (fully
    /// available, no dates) when no complete window was requested.
    pub fn compute_metadata(&self, property: &PropertyCandidate) -> AvailabilityMetadata {
        let Some(window) = self.requested.window() else {
            return AvailabilityMetadata::default();
        };
        self.cache.get_or_compute(&property.id, window, || {
            compute_metadata(&window, self.reservations_for(&property.id))
        })
    }

    fn capacity(&self, property: &PropertyCandidate, window: &DateSpan) -> CapacityVerdict {
        assess(
            window,
            property.total_rooms,
            self.reservations_for(&property.id),
            self.policy,
        )
    }

    pub fn verdict(&self, property: &PropertyCandidate) -> PropertyVerdict {
        let admitted_by_declared = declared_window_admits(&property.availability, &self.requested);
        let capacity = self
            .requested
            .window()
            .map(|window| self.capacity(property, &window));
        let available = admitted_by_declared && !capacity.is_some_and(|c| c.fully_booked);

        if !available {
            debug!(
                "property {} excluded ({})",
                property.id,
                exclusion_label(admitted_by_declared)
            );
            metrics::counter!(PROPERTIES_EXCLUDED_TOTAL, "reason" => exclusion_label(admitted_by_declared))
                .increment(1);
        }

        PropertyVerdict {
            available,
            admitted_by_declared,
            capacity,
            metadata: self.compute_metadata(property),
        }
    }

    pub fn evaluate(&self, properties: &[PropertyCandidate]) -> Evaluation {
        let verdicts = properties
            .iter()
            .map(|p| (p.id.clone(), self.verdict(p)))
            .collect();
        Evaluation { verdicts }
    }
}

/// One-call evaluation of a candidate list against a reservation snapshot.
pub fn evaluate_availability(
    properties: &[PropertyCandidate],
    requested: RequestedDates,
    reservations: &[ReservationRecord],
    rooms: &RoomToPropertyMap,
    cache: &MetadataCache,
) -> Evaluation {
    AvailabilityFilter::new(requested, reservations, rooms, cache).evaluate(properties)
}
