use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use tracing_error::SpanTrace;

use crate::company::Company;
use crate::domain::{DirectoryConfig, FetchError};

const BUNDLED_COMPANIES: &str = include_str!("../data/companies.json");

#[derive(Debug, Clone, PartialEq)]
enum DataSource {
    Bundled,
    File(PathBuf),
}

/// Source of the company collection. Every fetch waits the configured delay
/// and may fail on purpose with the configured probability.
#[derive(Debug, Clone)]
pub struct CompanyStore {
    source: DataSource,
    delay: Duration,
    failure_rate: f64,
}

pub type FetchResult = Result<Vec<Company>, FetchError>;

impl CompanyStore {
    pub fn new(cfg: &DirectoryConfig) -> Self {
        Self {
            source: match &cfg.data_path {
                Some(path) => DataSource::File(path.clone()),
                None => DataSource::Bundled,
            },
            delay: cfg.fetch_delay,
            failure_rate: cfg.failure_rate,
        }
    }

    #[instrument(skip(self), fields(source = ?self.source))]
    pub async fn fetch(&self) -> FetchResult {
        tokio::time::sleep(self.delay).await;

        let result = self.read().await;
        match &result {
            Ok(companies) => info!("Fetched {} companies", companies.len()),
            Err(e) => {
                let span_trace = SpanTrace::capture();
                error!(error = %e, "Fetching companies failed\n{span_trace}");
            }
        }
        result
    }

    async fn read(&self) -> FetchResult {
        if self.failure_rate > 0.0 {
            let roll: f64 = rand::rng().random();
            if roll < self.failure_rate {
                return Err(FetchError::Simulated);
            }
        }
        let raw = match &self.source {
            DataSource::Bundled => BUNDLED_COMPANIES.to_string(),
            DataSource::File(path) => tokio::fs::read_to_string(path).await?,
        };
        parse_companies(&raw)
    }

    /// Run [`CompanyStore::fetch`] in the background. Needs a running tokio runtime.
    pub fn spawn_fetch(&self) -> FetchHandle {
        let (tx, rx) = oneshot::channel();
        let store = self.clone();
        let task = tokio::spawn(async move {
            let result = store.fetch().await;
            // Receiver is gone when the owner was dropped; nothing to deliver to.
            let _ = tx.send(result);
        });
        FetchHandle { rx, task }
    }
}

/// Parse a json array of companies.
///
/// Entries that are not valid companies, and entries repeating an earlier id,
/// are skipped. Only a document that is not an array is an error.
pub fn parse_companies(raw: &str) -> FetchResult {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let mut ids = HashSet::new();
    let mut companies = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<Company>(entry) {
            Ok(c) if ids.contains(&c.id) => {
                warn!(index = idx, id = %c.id, "Skipping company with duplicate id");
            }
            Ok(c) => {
                ids.insert(c.id.clone());
                companies.push(c);
            }
            Err(e) => warn!(index = idx, error = %e, "Skipping malformed company entry"),
        }
    }
    Ok(companies)
}

/// An in-flight fetch. Dropping it aborts the fetch, so a result can never
/// reach an owner that no longer exists.
pub struct FetchHandle {
    rx: oneshot::Receiver<FetchResult>,
    task: JoinHandle<()>,
}

impl FetchHandle {
    /// Non blocking. Returns the outcome once it is available; the handle is
    /// spent afterwards.
    pub fn poll(&mut self) -> Option<FetchResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(FetchError::Io(
                "fetch ended without a result".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
impl FetchHandle {
    pub fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.task.abort_handle()
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
