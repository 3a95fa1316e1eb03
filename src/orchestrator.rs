//! Runs the per-day collection pipeline over a date range with a bounded
//! pool of workers.
//!
//! Days are pre-queued; each worker pops a day, collects it, writes its
//! output file and reports a [`DayResult`]. A failed day never stops the
//! other workers, and nothing is cancelled once started.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::collector::{collect_day, DayResult, ListOptions};
use crate::daterange::output_path;
use crate::fetch::Fetcher;
use crate::output::write_json;
use crate::{AppError, Result};

/// Collect every day with at most `parallel` days in flight.
///
/// Results are returned sorted by date once all days have completed. A day
/// whose worker died before reporting is returned as failed.
pub async fn run_days(
    fetcher: &Fetcher,
    options: &ListOptions,
    days: Vec<NaiveDate>,
    parallel: usize,
    output_dir: &Path,
) -> Result<Vec<DayResult>> {
    let workers = parallel.max(1).min(days.len().max(1));
    let queued = days.clone();
    let queue = Arc::new(Mutex::new(VecDeque::from(days)));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut pool = JoinSet::new();
    for worker in 0..workers {
        let queue = Arc::clone(&queue);
        let tx = tx.clone();
        let fetcher = fetcher.clone();
        let options = options.clone();
        let output_dir = output_dir.to_path_buf();

        pool.spawn(async move {
            loop {
                let Some(day) = queue.lock().await.pop_front() else {
                    break;
                };
                debug!("worker {} collecting {}", worker, day);
                let result = process_day(&fetcher, &options, day, &output_dir).await;
                if tx.send(result).is_err() {
                    break;
                }
            }
        });
    }
    drop(tx);

    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    let mut worker_error = None;
    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            error!("collection worker stopped: {}", e);
            worker_error = Some(e.to_string());
        }
    }

    if let Some(reason) = worker_error {
        let reported: HashSet<NaiveDate> = results.iter().map(|r| r.date).collect();
        results.extend(
            queued
                .into_iter()
                .filter(|day| !reported.contains(day))
                .map(|date| DayResult {
                    date,
                    outcome: Err(AppError::Worker(reason.clone())),
                }),
        );
    }

    results.sort_by_key(|r| r.date);
    Ok(results)
}

async fn process_day(
    fetcher: &Fetcher,
    options: &ListOptions,
    day: NaiveDate,
    output_dir: &Path,
) -> DayResult {
    let outcome = match collect_day(fetcher, options, day).await {
        Ok(threads) => write_json(&output_path(output_dir, day), &threads).map(|_| threads),
        Err(e) => Err(e),
    };
    DayResult { date: day, outcome }
}

/// Aggregate outcome of a date-range run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    pub threads: usize,
}

impl RunSummary {
    /// Log one line per day and tally the results.
    pub fn report(results: &[DayResult], output_dir: &Path) -> Self {
        let mut summary = RunSummary {
            total: results.len(),
            failed: 0,
            threads: 0,
        };

        for result in results {
            match &result.outcome {
                Ok(threads) => {
                    summary.threads += threads.len();
                    info!(
                        "{}: {} threads collected, saved to {}",
                        result.date.format("%Y-%m-%d"),
                        threads.len(),
                        output_path(output_dir, result.date).display()
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    error!("{}: {}", result.date.format("%Y-%m-%d"), e);
                }
            }
        }

        summary
    }

    /// Fails only when no day could be collected.
    pub fn into_result(self) -> Result<Self> {
        if self.total > 0 && self.failed == self.total {
            return Err(AppError::PartialDayFailure {
                failed: self.failed,
                total: self.total,
            });
        }
        if self.failed > 0 {
            error!("{} of {} day(s) failed", self.failed, self.total);
        }
        Ok(self)
    }
}
