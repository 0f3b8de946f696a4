use dashmap::DashMap;

use crate::model::*;
use crate::observability::METADATA_CACHE_HITS_TOTAL;

/// Memo of computed metadata for one request. The caller creates it, hands it
/// to the filter by reference and drops it with the request; nothing is shared
/// across requests since reservations may have changed in between.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: DashMap<(String, DateSpan), AvailabilityMetadata>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized entry for `(property_id, window)`, computing it on
    /// first use.
    pub fn get_or_compute<F>(&self, property_id: &str, window: DateSpan, compute: F) -> AvailabilityMetadata
    where
        F: FnOnce() -> AvailabilityMetadata,
    {
        let key = (property_id.to_string(), window);
        if let Some(hit) = self.entries.get(&key) {
            metrics::counter!(METADATA_CACHE_HITS_TOTAL).increment(1);
            return hit.value().clone();
        }
        self.entries.entry(key).or_insert_with(compute).value().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn window(a: u32, b: u32) -> DateSpan {
        DateSpan::new(
            NaiveDate::from_ymd_opt(2025, 3, a).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, b).unwrap(),
        )
    }

    #[test]
    fn computes_once_per_key() {
        let cache = MetadataCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            AvailabilityMetadata {
                available_nights: 4,
                ..Default::default()
            }
        };

        let first = cache.get_or_compute("P1", window(1, 5), compute);
        let second = cache.get_or_compute("P1", window(1, 5), compute);
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn window_is_part_of_the_key() {
        let cache = MetadataCache::new();
        cache.get_or_compute("P1", window(1, 5), AvailabilityMetadata::default);
        cache.get_or_compute("P1", window(2, 5), AvailabilityMetadata::default);
        cache.get_or_compute("P2", window(1, 5), AvailabilityMetadata::default);
        assert_eq!(cache.len(), 3);
    }
}
