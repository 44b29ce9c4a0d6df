use std::time::Duration;

use serde::Deserialize;

use crate::{ConcertError, Coordinates, Result};

const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Resolves a free-form place name to a point.
///
/// `Ok(None)` is the normal "no match" outcome; `Err` is reserved for
/// transport failures.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, place: &str) -> Result<Option<Coordinates>>;
}

/// Resolves the home location once per run.
pub fn resolve_origin(geocoder: &dyn Geocoder, location: &str) -> Result<Coordinates> {
    match geocoder.geocode(location)? {
        Some(origin) => {
            tracing::info!(
                location,
                latitude = origin.latitude,
                longitude = origin.longitude,
                "resolved origin"
            );
            Ok(origin)
        }
        None => Err(ConcertError::OriginNotFound(location.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by the OpenStreetMap Nominatim search API.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_base_url(user_agent, NOMINATIM_SEARCH_URL)
    }

    pub fn with_base_url(user_agent: &str, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, place: &str) -> Result<Option<Coordinates>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(ConcertError::Transport(format!(
                "geocoder returned {} for `{place}`",
                response.status()
            )));
        }

        let body = response.text()?;
        parse_places(&body)
    }
}

fn parse_places(body: &str) -> Result<Option<Coordinates>> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)
        .map_err(|e| ConcertError::Transport(format!("unreadable geocoder response: {e}")))?;

    let Some(first) = places.into_iter().next() else {
        return Ok(None);
    };

    let latitude = first.lat.trim().parse::<f64>();
    let longitude = first.lon.trim().parse::<f64>();
    match (latitude, longitude) {
        (Ok(latitude), Ok(longitude)) => Coordinates::new(latitude, longitude).map(Some),
        _ => Err(ConcertError::Transport(format!(
            "geocoder returned non-numeric coordinates ({}, {})",
            first.lat, first.lon
        ))),
    }
}
