use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::source::DatasetSource;

pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

struct Snapshot {
    dataset: Arc<Dataset>,
    fetched_at: Instant,
}

/// Holds one dataset snapshot for a bounded time window.
///
/// Within the window `get` hands out the same snapshot without touching the
/// source; after it (or on `refresh`) the source is fetched again. A failed
/// fetch leaves the cache empty, so stale data is never served after an error.
pub struct DatasetCache {
    source: Box<dyn DatasetSource>,
    ttl: Duration,
    workers: Option<usize>,
    snapshot: Option<Snapshot>,
}

impl DatasetCache {
    pub fn new(source: Box<dyn DatasetSource>, ttl: Duration, workers: Option<usize>) -> Self {
        DatasetCache {
            source,
            ttl,
            workers,
            snapshot: None,
        }
    }

    pub fn get(&mut self) -> Result<Arc<Dataset>> {
        self.get_at(Instant::now())
    }

    pub fn get_at(&mut self, now: Instant) -> Result<Arc<Dataset>> {
        if let Some(snapshot) = &self.snapshot {
            if self.fresh(snapshot, now) {
                return Ok(Arc::clone(&snapshot.dataset));
            }
        }
        self.refresh_at(now)
    }

    pub fn refresh(&mut self) -> Result<Arc<Dataset>> {
        self.refresh_at(Instant::now())
    }

    fn refresh_at(&mut self, now: Instant) -> Result<Arc<Dataset>> {
        self.snapshot = None;
        info!(
            action = "fetch",
            component = "dataset_cache",
            source = %self.source.describe(),
            ttl_secs = self.ttl.as_secs(),
            "Loading dataset snapshot"
        );

        let rows = self.source.fetch()?;
        let dataset = Arc::new(Dataset::from_raw(rows, self.workers)?);
        self.snapshot = Some(Snapshot {
            dataset: Arc::clone(&dataset),
            fetched_at: now,
        });
        Ok(dataset)
    }

    fn fresh(&self, snapshot: &Snapshot, now: Instant) -> bool {
        now.saturating_duration_since(snapshot.fetched_at) < self.ttl
    }

    pub fn is_fresh_at(&self, now: Instant) -> bool {
        self.snapshot
            .as_ref()
            .is_some_and(|snapshot| self.fresh(snapshot, now))
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Instant::now())
    }

    /// Time left at `now` before the current snapshot expires.
    pub fn expires_in_at(&self, now: Instant) -> Option<Duration> {
        let snapshot = self.snapshot.as_ref()?;
        self.ttl
            .checked_sub(now.saturating_duration_since(snapshot.fetched_at))
            .filter(|left| !left.is_zero())
    }

    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in_at(Instant::now())
    }

    pub fn source(&self) -> &dyn DatasetSource {
        self.source.as_ref()
    }
}
