use crate::{distance_miles, CanonicalRecord, Coordinates};

/// Keeps records strictly closer than `radius_miles` to the origin.
#[derive(Debug, Clone, Copy)]
pub struct ProximityFilter {
    origin: Coordinates,
    radius_miles: f64,
}

impl ProximityFilter {
    pub fn new(origin: Coordinates, radius_miles: f64) -> Self {
        Self {
            origin,
            radius_miles,
        }
    }

    pub fn origin(&self) -> Coordinates {
        self.origin
    }

    pub fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    /// Records without coordinates are never kept. The boundary is exclusive.
    pub fn keep(&self, record: &CanonicalRecord) -> bool {
        let Some(coords) = record.coords else {
            return false;
        };

        match distance_miles(&self.origin, &coords) {
            Ok(miles) => miles < self.radius_miles,
            Err(err) => {
                tracing::warn!(venue = %record.venue, error = %err, "dropping record");
                false
            }
        }
    }

    pub fn apply(&self, mut records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
        let before = records.len();
        records.retain(|record| self.keep(record));
        tracing::debug!(
            kept = records.len(),
            dropped = before - records.len(),
            radius = self.radius_miles,
            "applied proximity filter"
        );
        records
    }
}
