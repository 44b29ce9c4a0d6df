use std::time::Duration;

use reqwest::Url;
use serde_json::Value;

use crate::{ConcertError, RawEvent, Result};

const BANDSINTOWN_ARTISTS_URL: &str = "https://rest.bandsintown.com/artists";

/// Supplies upcoming events for a band.
pub trait EventSource: Send + Sync {
    fn fetch_events(&self, band: &str) -> Result<Vec<RawEvent>>;
}

/// Client for the Bandsintown public events API.
#[derive(Debug, Clone)]
pub struct BandsintownClient {
    client: reqwest::blocking::Client,
    base_url: String,
    app_id: String,
}

impl BandsintownClient {
    pub fn new(app_id: impl Into<String>) -> Result<Self> {
        Self::with_base_url(app_id, BANDSINTOWN_ARTISTS_URL)
    }

    pub fn with_base_url(app_id: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            app_id: app_id.into(),
        })
    }
}

impl EventSource for BandsintownClient {
    fn fetch_events(&self, band: &str) -> Result<Vec<RawEvent>> {
        let url = events_url(&self.base_url, band)?;

        let response = self
            .client
            .get(url)
            .query(&[("app_id", self.app_id.as_str())])
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(ConcertError::Transport(format!(
                "event API returned {} for `{band}`",
                response.status()
            )));
        }

        let body = response.text()?;
        parse_events(band, &body)
    }
}

/// `{base}/{band}/events` with the band name percent-encoded as one segment.
pub fn events_url(base_url: &str, band: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ConcertError::Config(format!("invalid event API url `{base_url}`: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ConcertError::Config(format!("event API url `{base_url}` cannot take a path")))?
        .pop_if_empty()
        .push(band)
        .push("events");
    Ok(url)
}

/// Decodes an events response. Anything other than a JSON array (unknown
/// artist, API warnings) means the band has no events; array entries that do
/// not look like events are skipped.
pub fn parse_events(band: &str, body: &str) -> Result<Vec<RawEvent>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ConcertError::Transport(format!("unreadable event response for `{band}`: {e}")))?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            tracing::debug!(band, response = %other, "no event list returned");
            return Ok(Vec::new());
        }
    };

    let mut events = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<RawEvent>(entry) {
            Ok(event) => events.push(event),
            Err(err) => tracing::warn!(band, error = %err, "skipping unreadable event"),
        }
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_band_name_as_single_segment() {
        let url = events_url(BANDSINTOWN_ARTISTS_URL, "AC/DC & Friends").unwrap();
        assert_eq!(
            url.as_str(),
            "https://rest.bandsintown.com/artists/AC%2FDC%20&%20Friends/events"
        );
    }

    #[test]
    fn tolerates_trailing_slash_in_base_url() {
        let url = events_url("http://localhost:8080/artists/", "Alpha").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/artists/Alpha/events");
    }

    #[test]
    fn parses_event_array() {
        let body = r#"[
            {"datetime": "2024-05-01T19:00:00", "lineup": ["Alpha"],
             "venue": {"name": "Mohawk", "city": "Austin", "region": "TX",
                       "country": "United States", "latitude": "30.27", "longitude": "-97.74"}},
            {"lineup": ["Broken"]}
        ]"#;
        let events = parse_events("Alpha", body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].venue.name, "Mohawk");
    }

    #[test]
    fn non_array_body_means_no_events() {
        assert!(parse_events("Nobody", r#"{"errorMessage": "[NotFound]"}"#)
            .unwrap()
            .is_empty());
        assert!(parse_events("Nobody", r#""{warn=Not found}""#).unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_a_transport_error() {
        let err = parse_events("Alpha", "<html>").unwrap_err();
        assert!(matches!(err, ConcertError::Transport(_)));
    }
}
