// File: src/pipeline.rs
//! End-to-end run: acquire windows, parse, aggregate, emit, persist.
//!
//! Failure policy:
//! - the primary (first) window must be acquired, otherwise the run aborts;
//! - supplementary windows that cannot be acquired are logged and left out;
//! - windows that do not parse are logged and left out, counters untouched;
//! - the output file is replaced atomically, never partially written.
use crate::aggregate::{AggregateResult, Aggregator, Counters};
use crate::calendar::CalendarEmitter;
use crate::client::FeedClient;
use crate::config::Config;
use crate::error::{FeedError, FeedResult};
use crate::model::{Classifier, IdentityResolver, WindowBatch, parse_window};
use crate::storage::LocalStorage;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Where the windows come from.
#[derive(Debug, Clone)]
pub enum Source {
    Remote(Vec<String>),
    Files(Vec<PathBuf>),
}

/// Unparsed text of one window.
#[derive(Debug, Clone)]
pub struct RawWindow {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub counters: Counters,
    pub windows_acquired: usize,
    pub windows_parsed: usize,
}

/// Keep the primary result or abort; drop failed supplementary windows.
fn keep_available(
    labels: &[String],
    results: Vec<FeedResult<String>>,
) -> FeedResult<Vec<RawWindow>> {
    let mut windows = Vec::with_capacity(results.len());
    for (i, (label, result)) in labels.iter().zip(results).enumerate() {
        match result {
            Ok(text) => windows.push(RawWindow {
                label: label.clone(),
                text,
            }),
            Err(e) if i == 0 => {
                log::error!("Failed to fetch primary window: {}", e);
                return Err(e);
            }
            Err(e) => {
                log::warn!(
                    "Window {} not available ({}), continuing with available data",
                    i + 1,
                    e
                );
            }
        }
    }
    log::info!("Acquired {} of {} windows", windows.len(), labels.len());
    Ok(windows)
}

pub async fn fetch_windows(client: &FeedClient, urls: &[String]) -> FeedResult<Vec<RawWindow>> {
    let results = client.fetch_all(urls).await;
    keep_available(urls, results)
}

pub fn read_windows(paths: &[PathBuf]) -> FeedResult<Vec<RawWindow>> {
    let labels: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    let results = paths
        .iter()
        .zip(&labels)
        .map(|(p, label)| fs::read_to_string(p).map_err(|e| FeedError::fetch(label, e)))
        .collect();
    keep_available(&labels, results)
}

/// Parse every window, skipping the ones that fail.
pub fn parse_windows(raw: &[RawWindow]) -> Vec<WindowBatch> {
    raw.iter()
        .filter_map(|w| match parse_window(&w.label, &w.text) {
            Ok(batch) => {
                log::info!(
                    "Successfully parsed window '{}' ({} events)",
                    w.label,
                    batch.len()
                );
                Some(batch)
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        })
        .collect()
}

pub struct Pipeline {
    config: Config,
    classifier: Classifier,
    resolver: IdentityResolver,
    emitter: CalendarEmitter,
}

impl Pipeline {
    pub fn new(config: Config) -> FeedResult<Self> {
        let classifier = config.classifier()?;
        let resolver = config.resolver();
        let emitter = config.emitter();
        Ok(Self {
            config,
            classifier,
            resolver,
            emitter,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parse and aggregate already acquired windows.
    pub fn aggregate(&self, raw: &[RawWindow]) -> AggregateResult {
        let batches = parse_windows(raw);
        Aggregator::new(&self.classifier, &self.resolver).run(batches)
    }

    pub fn render(&self, result: &AggregateResult) -> String {
        self.emitter.to_ics_string(&result.events)
    }

    pub async fn acquire(&self, source: &Source) -> FeedResult<Vec<RawWindow>> {
        match source {
            Source::Remote(urls) => {
                if urls.is_empty() {
                    return Err(FeedError::Config("no feed windows configured".to_string()));
                }
                let client = FeedClient::new(Duration::from_secs(self.config.timeout_secs));
                fetch_windows(&client, urls).await
            }
            Source::Files(paths) => {
                if paths.is_empty() {
                    return Err(FeedError::Config("no input files given".to_string()));
                }
                read_windows(paths)
            }
        }
    }

    pub async fn run(&self, source: &Source) -> FeedResult<RunSummary> {
        let raw = self.acquire(source).await?;
        let result = self.aggregate(&raw);
        let ics = self.render(&result);
        LocalStorage::save_calendar(&self.config.output_path, &ics)?;

        Ok(RunSummary {
            output_path: self.config.output_path.clone(),
            counters: result.counters,
            windows_acquired: raw.len(),
            windows_parsed: result.windows,
        })
    }
}
