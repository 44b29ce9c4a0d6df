use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ConcertError, Coordinates, Geocoder, RawEvent, Result};

/// Countries whose locations are labelled with the region instead of the
/// country name.
const REGION_LABEL_COUNTRIES: [&str; 2] = ["United States", "Canada"];

/// Normalised event, the unit every pipeline stage works on.
///
/// `weekday` and `location_label` are derived on access so they can never
/// drift from the fields they are computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub bands: Vec<String>,
    pub date: NaiveDate,
    pub venue: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub coords: Option<Coordinates>,
}

impl CanonicalRecord {
    /// Band names joined for display, in insertion order.
    pub fn bands_display(&self) -> String {
        self.bands.join(", ")
    }

    /// English name of the day of week, e.g. `Wednesday`.
    pub fn weekday(&self) -> String {
        self.date.format("%A").to_string()
    }

    pub fn location_label(&self) -> String {
        location_label(&self.city, &self.region, &self.country)
    }

    /// Appends the bands of a record that describes the same show.
    pub fn absorb(&mut self, other: CanonicalRecord) {
        self.bands.extend(other.bands);
    }
}

/// `"{city}, {region}"` for the US and Canada, `"{city}, {country}"` elsewhere.
pub fn location_label(city: &str, region: &str, country: &str) -> String {
    if REGION_LABEL_COUNTRIES.contains(&country) {
        format!("{city}, {region}")
    } else {
        format!("{city}, {country}")
    }
}

/// Extracts the calendar date preceding the `T` time separator.
pub fn parse_event_date(datetime: &str) -> Result<NaiveDate> {
    let malformed = || ConcertError::MalformedDate(datetime.to_string());
    let Some((date, _time)) = datetime.split_once('T') else {
        return Err(malformed());
    };
    // chrono skips whitespace before numeric fields; the prefix must be bare.
    if date.starts_with(char::is_whitespace) || date.ends_with(char::is_whitespace) {
        return Err(malformed());
    }

    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| malformed())
}

/// Turns raw events into [`CanonicalRecord`]s, geocoding venues that do not
/// carry their own coordinates.
pub struct RecordNormalizer<'a> {
    geocoder: &'a dyn Geocoder,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(geocoder: &'a dyn Geocoder) -> Self {
        Self { geocoder }
    }

    pub fn normalize(&self, raw: &RawEvent) -> Result<CanonicalRecord> {
        let date = parse_event_date(&raw.datetime)?;
        let venue = &raw.venue;

        let mut record = CanonicalRecord {
            bands: raw.lineup.clone(),
            date,
            venue: venue.name.clone(),
            city: venue.city.clone(),
            region: venue.region.clone(),
            country: venue.country.clone(),
            coords: venue.coordinates(),
        };

        if record.coords.is_none() {
            record.coords = self.lookup(&record.location_label());
        }

        Ok(record)
    }

    /// Normalises a whole batch. Records with a malformed date are logged and
    /// skipped; the rest of the batch is unaffected.
    pub fn normalize_all(&self, raws: &[RawEvent]) -> Vec<CanonicalRecord> {
        raws.iter()
            .filter_map(|raw| match self.normalize(raw) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(venue = %raw.venue.name, error = %err, "skipping event");
                    None
                }
            })
            .collect()
    }

    fn lookup(&self, label: &str) -> Option<Coordinates> {
        match self.geocoder.geocode(label) {
            Ok(Some(coords)) => Some(coords),
            Ok(None) => {
                tracing::debug!(location = label, "no geocoding match");
                None
            }
            Err(err) => {
                tracing::warn!(location = label, error = %err, "geocoding failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::Venue;

    #[derive(Default)]
    struct RecordingGeocoder {
        answer: Option<Coordinates>,
        fail: bool,
        queries: Mutex<Vec<String>>,
    }

    impl Geocoder for RecordingGeocoder {
        fn geocode(&self, place: &str) -> Result<Option<Coordinates>> {
            self.queries.lock().unwrap().push(place.to_string());
            if self.fail {
                Err(ConcertError::Transport("connection reset".into()))
            } else {
                Ok(self.answer)
            }
        }
    }

    fn raw(datetime: &str, country: &str, latitude: Option<f64>) -> RawEvent {
        RawEvent {
            lineup: vec!["Alpha".into(), "Beta".into()],
            datetime: datetime.to_string(),
            venue: Venue {
                name: "The Hall".into(),
                city: "Austin".into(),
                region: "TX".into(),
                country: country.into(),
                latitude,
                longitude: latitude.map(|_| -97.74),
            },
        }
    }

    #[test]
    fn labels_north_american_locations_by_region() {
        assert_eq!(location_label("Austin", "TX", "United States"), "Austin, TX");
        assert_eq!(location_label("Toronto", "ON", "Canada"), "Toronto, ON");
        assert_eq!(location_label("Berlin", "", "Germany"), "Berlin, Germany");
    }

    #[test]
    fn parses_date_prefix_and_weekday() {
        let date = parse_event_date("2024-05-01T19:00:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());

        let geocoder = RecordingGeocoder::default();
        let record = RecordNormalizer::new(&geocoder)
            .normalize(&raw("2024-05-01T19:00:00", "United States", Some(30.27)))
            .unwrap();
        assert_eq!(record.weekday(), "Wednesday");
        assert_eq!(record.bands_display(), "Alpha, Beta");
        assert_eq!(record.location_label(), "Austin, TX");
    }

    #[test]
    fn rejects_datetime_without_separator() {
        assert!(matches!(
            parse_event_date("2024-05-01 19:00"),
            Err(ConcertError::MalformedDate(_))
        ));
        assert!(matches!(
            parse_event_date("soon-ishT20:00"),
            Err(ConcertError::MalformedDate(_))
        ));
        assert!(matches!(
            parse_event_date(" 2024-05-01T19:00:00"),
            Err(ConcertError::MalformedDate(_))
        ));
        assert!(matches!(
            parse_event_date("2024-05-01 T19:00:00"),
            Err(ConcertError::MalformedDate(_))
        ));
    }

    #[test]
    fn venue_coordinates_skip_geocoding() {
        let geocoder = RecordingGeocoder::default();
        let record = RecordNormalizer::new(&geocoder)
            .normalize(&raw("2024-05-01T19:00:00", "United States", Some(30.27)))
            .unwrap();
        assert!(record.coords.is_some());
        assert!(geocoder.queries.lock().unwrap().is_empty());
    }

    #[test]
    fn geocodes_location_label_when_venue_has_no_coordinates() {
        let geocoder = RecordingGeocoder {
            answer: Some(Coordinates::new(52.52, 13.40).unwrap()),
            ..Default::default()
        };
        let mut event = raw("2024-05-01T19:00:00", "Germany", None);
        event.venue.city = "Berlin".into();

        let record = RecordNormalizer::new(&geocoder).normalize(&event).unwrap();
        assert_eq!(record.coords, geocoder.answer);
        assert_eq!(*geocoder.queries.lock().unwrap(), vec!["Berlin, Germany"]);
    }

    #[test]
    fn unlocatable_and_failed_lookups_yield_no_coordinates() {
        let missing = RecordingGeocoder::default();
        let failing = RecordingGeocoder {
            fail: true,
            ..Default::default()
        };
        let event = raw("2024-05-01T19:00:00", "United States", None);

        for geocoder in [&missing, &failing] {
            let record = RecordNormalizer::new(geocoder).normalize(&event).unwrap();
            assert_eq!(record.coords, None);
        }
    }

    #[test]
    fn normalize_all_skips_only_malformed_records() {
        let geocoder = RecordingGeocoder::default();
        let events = vec![
            raw("2024-05-01T19:00:00", "United States", Some(30.27)),
            raw("2024-05-02", "United States", Some(30.27)),
            raw("2024-05-03T19:00:00", "United States", Some(30.27)),
        ];

        let records = RecordNormalizer::new(&geocoder).normalize_all(&events);
        let dates: Vec<String> = records.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-05-01", "2024-05-03"]);
    }
}
