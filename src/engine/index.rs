use std::collections::HashMap;

use tracing::debug;

use crate::model::*;

/// Reservations grouped by the room they hold. Borrowed from the request's
/// reservation snapshot; never outlives it.
#[derive(Debug, Default)]
pub struct ReservationIndex<'a> {
    by_unit: HashMap<&'a str, Vec<&'a ReservationRecord>>,
}

/// Group reservations by unit id. Records without a unit are skipped; within
/// a unit, records keep their input order.
pub fn build_index(reservations: &[ReservationRecord]) -> ReservationIndex<'_> {
    let mut by_unit: HashMap<&str, Vec<&ReservationRecord>> = HashMap::new();
    for record in reservations {
        match record.unit() {
            Some(unit) => by_unit.entry(unit).or_default().push(record),
            None => debug!("reservation {} has no unit, skipped", record.id),
        }
    }
    ReservationIndex { by_unit }
}

impl<'a> ReservationIndex<'a> {
    pub fn get(&self, unit_id: &str) -> &[&'a ReservationRecord] {
        self.by_unit.get(unit_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn units(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.by_unit.keys().copied()
    }

    /// Number of distinct units.
    pub fn len(&self) -> usize {
        self.by_unit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_unit.is_empty()
    }

    /// Re-key by owning property. Units missing from `rooms` can't be traced
    /// to any property and are dropped; the count of dropped reservations is
    /// returned alongside.
    pub fn group_by_property(
        &self,
        rooms: &'a RoomToPropertyMap,
    ) -> (HashMap<&'a str, Vec<&'a ReservationRecord>>, usize) {
        let mut by_property: HashMap<&'a str, Vec<&'a ReservationRecord>> = HashMap::new();
        let mut unlinked = 0usize;

        for (unit, records) in &self.by_unit {
            match rooms.get(*unit) {
                Some(property_id) => by_property
                    .entry(property_id.as_str())
                    .or_default()
                    .extend(records.iter().copied()),
                None => {
                    debug!("unit {unit} has no owning property, {} reservations unlinked", records.len());
                    unlinked += records.len();
                }
            }
        }

        (by_property, unlinked)
    }
}
