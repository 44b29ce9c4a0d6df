//! Core library for the Concert Finder application.
//!
//! Turns tour dates for a list of bands into a report of the shows near a
//! home location. Each module owns one stage of that pipeline (normalising
//! raw events, distance filtering, ordering and merging, report assembly)
//! or one of the adapters the pipeline talks to (event API, geocoder,
//! renderer, batch files).

pub mod batch;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod geo;
pub mod geocode;
pub mod merge;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod report;
pub mod source;

pub use batch::{Batch, BatchEntry, BatchSource, GlobBatchSource, StaticBatchSource};
pub use config::FinderConfig;
pub use error::{ConcertError, Result};
pub use event::{RawEvent, Venue};
pub use filter::ProximityFilter;
pub use geo::{distance_miles, Coordinates};
pub use geocode::{resolve_origin, Geocoder, NominatimGeocoder};
pub use merge::{ChronoMerger, MergeMode};
pub use pipeline::{BatchOutcome, Pipeline, PipelineSettings, RunSummary};
pub use record::{CanonicalRecord, RecordNormalizer};
pub use render::{HtmlRenderer, RenderContext, Renderer};
pub use report::{Report, ReportAssembler, ReportRow};
pub use source::{BandsintownClient, EventSource};
