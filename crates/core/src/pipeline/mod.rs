//! Drives batches through fetch, normalise, filter, sort, merge and render.
//!
//! Fetching is the only concurrent step: bands are pulled off a shared index
//! by a bounded set of scoped threads, and the results are reassembled in the
//! batch's band order before anything else runs. Everything after fetching is
//! sequential, since merging depends on order.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use crate::{
    render::default_header, Batch, BatchSource, CanonicalRecord, ChronoMerger, Coordinates,
    EventSource, FinderConfig, Geocoder, MergeMode, ProximityFilter, RawEvent, RecordNormalizer,
    RenderContext, Renderer, Report, ReportAssembler, Result,
};

/// Per-run values shared read-only by every stage.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub origin: Coordinates,
    pub location: String,
    pub radius_miles: f64,
    pub merge_eps_miles: f64,
    pub merge_mode: MergeMode,
    pub workers: usize,
    pub title: String,
}

impl PipelineSettings {
    pub fn from_config(config: &FinderConfig, origin: Coordinates) -> Self {
        Self {
            origin,
            location: config.location.clone(),
            radius_miles: config.radius_miles,
            merge_eps_miles: config.merge_eps_miles,
            merge_mode: config.merge_mode,
            workers: config.workers,
            title: config.title.clone(),
        }
    }
}

/// What happened to a single batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Rendered { path: PathBuf, rows: usize },
    /// No record survived filtering; the renderer was not called.
    Empty,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub rendered: Vec<PathBuf>,
    pub empty: Vec<String>,
    /// Batch name and error message for every batch that failed.
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.rendered.len() + self.empty.len() + self.failed.len()
    }
}

pub struct Pipeline<'a> {
    settings: PipelineSettings,
    source: &'a dyn EventSource,
    geocoder: &'a dyn Geocoder,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: PipelineSettings,
        source: &'a dyn EventSource,
        geocoder: &'a dyn Geocoder,
    ) -> Self {
        Self {
            settings,
            source,
            geocoder,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Processes every batch independently. A batch that cannot be loaded or
    /// fails later is logged and recorded; the remaining batches still run.
    pub fn run(&self, batches: &dyn BatchSource, renderer: &dyn Renderer) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for entry in batches.entries()? {
            let name = entry.name();
            let outcome = entry
                .load()
                .and_then(|batch| self.run_batch(&batch, renderer));
            match outcome {
                Ok(BatchOutcome::Rendered { path, .. }) => summary.rendered.push(path),
                Ok(BatchOutcome::Empty) => {
                    tracing::info!(batch = %name, "no concerts in range, skipping report");
                    summary.empty.push(name);
                }
                Err(err) => {
                    tracing::error!(batch = %name, error = %err, "batch failed");
                    summary.failed.push((name, err.to_string()));
                }
            }
        }

        tracing::info!(
            rendered = summary.rendered.len(),
            empty = summary.empty.len(),
            failed = summary.failed.len(),
            "run complete"
        );
        Ok(summary)
    }

    pub fn run_batch(&self, batch: &Batch, renderer: &dyn Renderer) -> Result<BatchOutcome> {
        tracing::info!(batch = %batch.name, bands = batch.bands.len(), "processing batch");

        let Some(report) = self.build_report(&batch.bands) else {
            return Ok(BatchOutcome::Empty);
        };

        let context = RenderContext::new(
            batch.name.clone(),
            self.settings.title.clone(),
            default_header(&self.settings.location, self.settings.radius_miles),
        );
        let path = renderer.render(&report, &context)?;
        Ok(BatchOutcome::Rendered {
            path,
            rows: report.len(),
        })
    }

    /// Fetches and processes a band list; `None` when nothing is left to show.
    pub fn build_report(&self, bands: &[String]) -> Option<Report> {
        let raws = self.fetch_all(bands);
        let merged = self.process(&raws);
        ReportAssembler::new().assemble(&merged)
    }

    /// Normalises, filters, sorts and merges one batch of raw events.
    pub fn process(&self, raws: &[RawEvent]) -> Vec<CanonicalRecord> {
        let records = RecordNormalizer::new(self.geocoder).normalize_all(raws);
        let nearby = ProximityFilter::new(self.settings.origin, self.settings.radius_miles)
            .apply(records);
        let merger = ChronoMerger::with_mode(self.settings.merge_eps_miles, self.settings.merge_mode);
        let merged = merger.sort_and_merge(nearby);

        tracing::debug!(raw = raws.len(), merged = merged.len(), "processed batch records");
        merged
    }

    /// Fetches events for every band, concatenated in band order.
    pub fn fetch_all(&self, bands: &[String]) -> Vec<RawEvent> {
        if bands.is_empty() {
            return Vec::new();
        }

        let workers = self.settings.workers.clamp(1, bands.len());
        let next = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(band) = bands.get(index) else {
                        break;
                    };
                    if tx.send((index, self.fetch_band(band))).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Vec<RawEvent>> = vec![Vec::new(); bands.len()];
        for (index, events) in rx {
            slots[index] = events;
        }
        slots.into_iter().flatten().collect()
    }

    fn fetch_band(&self, band: &str) -> Vec<RawEvent> {
        match self.source.fetch_events(band) {
            Ok(events) => {
                tracing::debug!(band, count = events.len(), "fetched events");
                events
            }
            Err(err) => {
                tracing::warn!(band, error = %err, "could not fetch events, skipping band");
                Vec::new()
            }
        }
    }
}
