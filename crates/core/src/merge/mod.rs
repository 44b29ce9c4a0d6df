use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{distance_miles, CanonicalRecord, Coordinates};

/// Strategy used to fold same-day, co-located records together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Compare each record with its immediate predecessor only. Co-located
    /// shows separated by another record after sorting stay apart.
    #[default]
    Adjacent,
    /// Merge every same-day record within range of any member of a group,
    /// regardless of where it landed in the sorted order.
    Cluster,
}

/// Orders records by `(date, city, bands)`, then by the remaining fields so
/// the order never depends on the input order.
pub fn compare_records(a: &CanonicalRecord, b: &CanonicalRecord) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.city.cmp(&b.city))
        .then_with(|| compare_bands(&a.bands, &b.bands))
        .then_with(|| a.venue.cmp(&b.venue))
        .then_with(|| a.region.cmp(&b.region))
        .then_with(|| a.country.cmp(&b.country))
        .then_with(|| compare_coords(a.coords, b.coords))
}

/// Compares two lineups as if joined with `", "`, byte by byte, without
/// building the joined strings.
fn compare_bands(a: &[String], b: &[String]) -> Ordering {
    joined_bytes(a).cmp(joined_bytes(b))
}

fn joined_bytes(bands: &[String]) -> impl Iterator<Item = u8> + '_ {
    bands.iter().enumerate().flat_map(|(index, band)| {
        let separator: &[u8] = if index == 0 { b"" } else { b", " };
        separator.iter().chain(band.as_bytes()).copied()
    })
}

fn compare_coords(a: Option<Coordinates>, b: Option<Coordinates>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a
            .latitude
            .total_cmp(&b.latitude)
            .then_with(|| a.longitude.total_cmp(&b.longitude)),
    }
}

pub fn sort_records(records: &mut [CanonicalRecord]) {
    records.sort_by(compare_records);
}

/// Sorts records chronologically and merges entries that describe the same
/// show.
#[derive(Debug, Clone, Copy)]
pub struct ChronoMerger {
    eps_miles: f64,
    mode: MergeMode,
}

impl ChronoMerger {
    pub fn new(eps_miles: f64) -> Self {
        Self::with_mode(eps_miles, MergeMode::Adjacent)
    }

    pub fn with_mode(eps_miles: f64, mode: MergeMode) -> Self {
        Self { eps_miles, mode }
    }

    pub fn mode(&self) -> MergeMode {
        self.mode
    }

    pub fn sort_and_merge(&self, mut records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
        sort_records(&mut records);
        self.merge(records)
    }

    /// Merges an already sorted sequence.
    pub fn merge(&self, sorted: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
        let before = sorted.len();
        let merged = match self.mode {
            MergeMode::Adjacent => self.merge_adjacent(sorted),
            MergeMode::Cluster => self.merge_clusters(sorted),
        };
        tracing::debug!(
            before,
            after = merged.len(),
            mode = ?self.mode,
            "merged co-located records"
        );
        merged
    }

    /// Two records are the same show when they share a date and sit closer
    /// than `eps_miles`. Records without coordinates never match.
    pub fn same_show(&self, a: &CanonicalRecord, b: &CanonicalRecord) -> bool {
        if a.date != b.date {
            return false;
        }
        match (a.coords, b.coords) {
            (Some(x), Some(y)) => distance_miles(&x, &y)
                .map(|miles| miles < self.eps_miles)
                .unwrap_or(false),
            _ => false,
        }
    }

    fn merge_adjacent(&self, sorted: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
        let mut merged: Vec<CanonicalRecord> = Vec::with_capacity(sorted.len());
        for record in sorted {
            match merged.last_mut() {
                // The survivor keeps its own position, so it is compared
                // against each following record until one does not match.
                Some(survivor) if self.same_show(survivor, &record) => survivor.absorb(record),
                _ => merged.push(record),
            }
        }
        merged
    }

    fn merge_clusters(&self, sorted: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
        let len = sorted.len();
        let mut parent: Vec<usize> = (0..len).collect();

        let mut start = 0;
        while start < len {
            let mut end = start + 1;
            while end < len && sorted[end].date == sorted[start].date {
                end += 1;
            }
            for i in start..end {
                for j in (i + 1)..end {
                    if self.same_show(&sorted[i], &sorted[j]) {
                        union(&mut parent, i, j);
                    }
                }
            }
            start = end;
        }

        let mut slot: Vec<Option<usize>> = vec![None; len];
        let mut merged: Vec<CanonicalRecord> = Vec::new();
        for (index, record) in sorted.into_iter().enumerate() {
            let root = find(&mut parent, index);
            let existing = slot[root];
            match existing {
                Some(at) => merged[at].absorb(record),
                None => {
                    slot[root] = Some(merged.len());
                    merged.push(record);
                }
            }
        }
        merged
    }
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}
