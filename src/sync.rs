use crate::date_key::DateKey;
use crate::errors::FetchError;
use crate::models::Record;
use crate::selection::EnabledRange;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// How far past today (or the configured default upper bound, if later) a record
/// may lie and still extend the enabled range.
pub const FUTURE_MARGIN_DAYS: i64 = 1;

/// Delivered at least once per committed upstream insert. Carries no payload:
/// a notice only ever triggers a full refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertNotice;

/// Boundary to the remote datastore.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// All records on or after `min_date`, ascending by day.
    async fn fetch_range(&self, min_date: DateKey) -> Result<Vec<Record>, FetchError>;

    fn subscribe_inserts(&self, table: &str) -> broadcast::Receiver<InsertNotice>;
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub min_date: DateKey,
    pub default_upper: DateKey,
    pub table: String,
}

/// A fetch detached from the engine, so it can run without holding the session.
pub struct PendingFetch {
    source: Arc<dyn DataSource>,
    min_date: DateKey,
    generation: u64,
}

pub struct Fetched {
    generation: u64,
    result: Result<Vec<Record>, FetchError>,
}

impl PendingFetch {
    pub async fn run(self) -> Fetched {
        let result = self.source.fetch_range(self.min_date).await;
        Fetched {
            generation: self.generation,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Loaded { records: usize },
    Failed(String),
}

/// Owns the record cache. The cache is only ever replaced wholesale.
pub struct SyncEngine {
    source: Arc<dyn DataSource>,
    config: SyncConfig,
    cache: Vec<Record>,
    observed_upper: Option<DateKey>,
    last_error: Option<String>,
    last_updated: Option<DateTime<Local>>,
    issued: u64,
    applied: u64,
}

impl SyncEngine {
    pub fn new(source: Arc<dyn DataSource>, config: SyncConfig) -> Self {
        Self {
            source,
            config,
            cache: Vec::new(),
            observed_upper: None,
            last_error: None,
            last_updated: None,
            issued: 0,
            applied: 0,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.cache
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.last_updated
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InsertNotice> {
        self.source.subscribe_inserts(&self.config.table)
    }

    /// Enabled days: from the fixed cutoff to the newest day seen so far.
    pub fn enabled(&self) -> EnabledRange {
        match self.observed_upper {
            Some(upper) => EnabledRange::new(self.config.min_date, upper),
            None => EnabledRange::empty_from(self.config.min_date),
        }
    }

    /// Newest day that can ever be enabled. Records past it stay cached but are not selectable.
    pub fn horizon(&self) -> DateKey {
        self.config
            .default_upper
            .max(DateKey::today())
            .offset_days(FUTURE_MARGIN_DAYS)
    }

    /// Last day the selector draws; the configured default until data arrives.
    pub fn window_end(&self) -> DateKey {
        self.observed_upper.unwrap_or(self.config.default_upper)
    }

    pub fn begin_fetch(&mut self) -> PendingFetch {
        self.issued += 1;
        PendingFetch {
            source: Arc::clone(&self.source),
            min_date: self.config.min_date,
            generation: self.issued,
        }
    }

    pub fn apply(&mut self, fetched: Fetched) -> SyncOutcome {
        match fetched.result {
            Ok(mut records) => {
                if fetched.generation < self.applied {
                    // last completion wins, even if it was issued earlier
                    warn!(
                        generation = fetched.generation,
                        applied = self.applied,
                        "applying a fetch that was overtaken by a newer one"
                    );
                }
                self.applied = self.applied.max(fetched.generation);
                records.sort_by_key(|record| record.day);
                let horizon = self.horizon();
                self.observed_upper = records.last().map(|record| {
                    if record.day > horizon {
                        warn!(day = %record.day, %horizon, "newest record lies past the horizon");
                    }
                    record.day.min(horizon)
                });
                self.cache = records;
                self.last_error = None;
                self.last_updated = Some(Local::now());
                info!(
                    records = self.cache.len(),
                    upper = ?self.observed_upper.map(|day| day.to_string()),
                    "record cache replaced"
                );
                SyncOutcome::Loaded {
                    records: self.cache.len(),
                }
            }
            Err(err) => {
                warn!("failed to fetch records: {err}");
                let message = format!("Could not load data: {err}");
                self.last_error = Some(message.clone());
                SyncOutcome::Failed(message)
            }
        }
    }

    pub async fn load(&mut self) -> SyncOutcome {
        let fetched = self.begin_fetch().run().await;
        self.apply(fetched)
    }
}
