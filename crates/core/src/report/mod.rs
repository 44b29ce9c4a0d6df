use serde::{Deserialize, Serialize};

use crate::CanonicalRecord;

/// Column headings in display order.
pub const REPORT_COLUMNS: [&str; 5] = ["Bands", "Date", "Day", "Location", "Venue"];

/// One line of the rendered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Bands")]
    pub bands: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Day")]
    pub day: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Venue")]
    pub venue: String,
}

impl From<&CanonicalRecord> for ReportRow {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            bands: record.bands_display(),
            date: record.date.format("%Y-%m-%d").to_string(),
            day: record.weekday(),
            location: record.location_label(),
            venue: record.venue.clone(),
        }
    }
}

/// Ordered, non-empty table ready for a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ReportAssembler;

impl ReportAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Builds rows in the given order. Returns `None` when there is nothing
    /// to render.
    pub fn assemble(&self, records: &[CanonicalRecord]) -> Option<Report> {
        if records.is_empty() {
            return None;
        }

        Some(Report {
            rows: records.iter().map(ReportRow::from).collect(),
        })
    }
}
