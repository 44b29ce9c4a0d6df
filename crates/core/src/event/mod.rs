use serde::{Deserialize, Deserializer, Serialize};

use crate::Coordinates;

/// One tour date as returned by the event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub lineup: Vec<String>,
    pub datetime: String,
    pub venue: Venue,
}

/// Venue descriptor attached to a [`RawEvent`].
///
/// The event API reports coordinates as strings, sometimes empty, so both
/// fields accept a JSON number, a numeric string or nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, deserialize_with = "loose_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "loose_f64")]
    pub longitude: Option<f64>,
}

impl Venue {
    /// Returns the venue position when both halves are present and in range.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude).ok(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseNumber {
    Number(f64),
    Text(String),
}

fn loose_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<LooseNumber>::deserialize(deserializer)?;
    Ok(match value {
        Some(LooseNumber::Number(n)) => Some(n),
        Some(LooseNumber::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_coordinates() {
        let json = r#"{
            "datetime": "2024-05-01T19:30:00",
            "lineup": ["Alpha", "Beta"],
            "venue": {
                "name": "Bowery Ballroom",
                "city": "New York",
                "region": "NY",
                "country": "United States",
                "latitude": "40.7204",
                "longitude": "-73.9934"
            }
        }"#;

        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.lineup, vec!["Alpha", "Beta"]);
        let coords = event.venue.coordinates().unwrap();
        assert!((coords.latitude - 40.7204).abs() < 1e-9);
        assert!((coords.longitude + 73.9934).abs() < 1e-9);
    }

    #[test]
    fn tolerates_missing_and_empty_coordinates() {
        let json = r#"{
            "datetime": "2024-05-01T19:30:00",
            "venue": {"name": "Club", "city": "Berlin", "country": "Germany", "latitude": ""}
        }"#;

        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert!(event.lineup.is_empty());
        assert_eq!(event.venue.region, "");
        assert_eq!(event.venue.coordinates(), None);
    }

    #[test]
    fn numeric_coordinates_are_accepted() {
        let json = r#"{"datetime": "2024-05-01T19:30:00",
            "venue": {"name": "Hall", "latitude": 52.5, "longitude": 13.4}}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert!(event.venue.coordinates().is_some());
    }

    #[test]
    fn out_of_range_coordinates_are_ignored() {
        let venue = Venue {
            latitude: Some(123.0),
            longitude: Some(10.0),
            ..Default::default()
        };
        assert_eq!(venue.coordinates(), None);
    }
}
