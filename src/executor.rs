use crate::model::{BuildUnit, RenderResult};
use crate::traits::UnitProcessor;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, instrument};

/// Bounded worker pool over an unordered queue of units.
///
/// At most `concurrency_limit` units are in flight. Results are collected in
/// completion order. A failing or panicking unit never affects its siblings.
/// In-flight units cannot be cancelled.
pub struct BatchExecutor {
    semaphore: Arc<Semaphore>,
    width: usize,
}

impl BatchExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        let width = concurrency_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Runs every unit, spawning a worker only once a pool slot is free so
    /// at most `width` unit tasks exist at a time.
    #[instrument(skip_all, fields(units = units.len(), width = self.width))]
    pub async fn run_all<P>(&self, processor: Arc<P>, units: Vec<BuildUnit>) -> BatchReport
    where
        P: UnitProcessor + 'static,
    {
        let total = units.len();
        info!("Processing {} units using {} workers...", total, self.width);

        let completed = Arc::new(AtomicUsize::new(0));
        let mut results = Vec::with_capacity(total);
        let mut workers = JoinSet::new();
        for unit in units {
            let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    let result = RenderResult::failed(unit.name, format!("Semaphore error: {}", e), 0);
                    report_progress(completed.fetch_add(1, Ordering::SeqCst) + 1, total, &result);
                    results.push(result);
                    continue;
                }
            };

            // Finished workers are drained as the pool turns over
            while let Some(joined) = workers.try_join_next() {
                results.push(joined_result(joined));
            }

            let processor = Arc::clone(&processor);
            let completed = Arc::clone(&completed);
            workers.spawn(async move {
                let name = unit.name.clone();
                // Run in a separate task so a panic becomes this unit's failure
                let result = match tokio::spawn(async move { processor.process(unit).await }).await {
                    Ok(result) => result,
                    Err(e) => RenderResult::failed(name, format!("Task join error: {}", e), 0),
                };
                drop(permit);
                report_progress(completed.fetch_add(1, Ordering::SeqCst) + 1, total, &result);
                result
            });
        }

        while let Some(joined) = workers.join_next().await {
            results.push(joined_result(joined));
        }

        BatchReport {
            total,
            skipped: 0,
            results,
        }
    }
}

fn joined_result(joined: Result<RenderResult, JoinError>) -> RenderResult {
    joined.unwrap_or_else(|e| RenderResult::failed("<unknown>", format!("Task join error: {}", e), 0))
}

fn report_progress(completed: usize, total: usize, result: &RenderResult) {
    if result.success {
        info!("[{}/{}] Success: {}", completed, total, result.unit);
    } else {
        error!("[{}/{}] FAILED: {}", completed, total, result.unit);
        if let Some(detail) = &result.error {
            error!("{}", detail);
        }
    }
}

/// Aggregated outcome of one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Units submitted, plus units rejected before submission
    pub total: usize,

    /// Units dropped by the idempotent filter before submission
    pub skipped: usize,

    /// One entry per submitted unit, in completion order
    pub results: Vec<RenderResult>,
}

impl BatchReport {
    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.skipped = skipped;
        self
    }

    /// Counts units refused before submission as failures.
    pub fn with_rejected(mut self, rejected: Vec<RenderResult>) -> Self {
        self.total += rejected.len();
        self.results.extend(rejected);
        self
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RenderResult> {
        self.results.iter().filter(|r| !r.success)
    }

    /// True when every submitted unit succeeded.
    pub fn is_success(&self) -> bool {
        self.succeeded() == self.total
    }

    pub fn summary(&self) -> String {
        if self.total == 0 && self.skipped > 0 {
            return format!("All {} units skipped; outputs already exist.", self.skipped);
        }
        format!("Successfully processed {}/{} units", self.succeeded(), self.total)
    }
}
