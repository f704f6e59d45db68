//! Acquisition scheduler: retry passes over a bounded worker pool
//!
//! One pass spawns a worker task per queued filing, gated by a semaphore so
//! at most `concurrency` fetches are in flight. Workers report through an
//! mpsc channel and the scheduler loop is the single collector — the only
//! place that touches the shared success/error collections, so no worker
//! ever appends concurrently. After a pass drains, failed identifiers (and
//! only those) are queued for the next pass until the error set is empty or
//! the attempt budget runs out.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tracing::{error, info, warn};

use crate::downloader::FilingDownloader;
use crate::fetch;
use crate::types::{BatchReport, Event, FailedFetch, FetchOutcome, FilingReference, RawContainer};

impl FilingDownloader {
    /// Download one batch of filings with bounded retry
    ///
    /// Runs up to `max_attempts` fetch passes; each pass re-dispatches
    /// exactly the identifiers that failed the previous one, so retry queues
    /// never grow. Completion order within a pass is unspecified. Exhausting
    /// the attempt budget is not fatal: remaining identifiers are reported in
    /// [`BatchReport::failures`] and disposition is the caller's decision.
    ///
    /// Once the scheduler terminates, `containers ∪ failures` covers the
    /// submitted set exactly, with no duplicates.
    pub async fn download_batch(&self, filings: Vec<FilingReference>) -> BatchReport {
        let total = filings.len();
        let max_attempts = self.config.batch.max_attempts.max(1);

        let mut queue = filings;
        let mut containers: Vec<RawContainer> = Vec::with_capacity(total);
        let mut errors: Vec<FailedFetch> = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            let outcomes = self.run_pass(queue).await;

            // Sole aggregation point: outcomes merge into the shared
            // collections only here, after the workers have handed them off.
            for outcome in outcomes {
                match outcome.result {
                    Ok(container) => {
                        self.emit_event(Event::FetchComplete {
                            identifier: container.filing.identifier.clone(),
                        });
                        containers.push(container);
                    }
                    Err(e) => {
                        self.emit_event(Event::FetchFailed {
                            identifier: outcome.filing.identifier.clone(),
                            error: e.to_string(),
                        });
                        errors.push(FailedFetch {
                            filing: outcome.filing,
                            error: e,
                        });
                    }
                }
            }

            attempt += 1;
            self.emit_event(Event::PassComplete {
                attempt,
                fetched: containers.len(),
                failed: errors.len(),
            });

            if errors.is_empty() || attempt >= max_attempts {
                break;
            }

            let delay = self.retry_delay();
            warn!(
                attempt,
                failed = errors.len(),
                total,
                delay_ms = delay.as_millis(),
                "pass left failures, retrying after backoff"
            );
            self.emit_event(Event::Retrying {
                attempt,
                remaining: errors.len(),
                delay_secs: delay.as_secs(),
            });
            tokio::time::sleep(delay).await;

            // Only identifiers that failed this pass enter the next queue
            queue = errors.drain(..).map(|f| f.filing).collect();
        }

        if !errors.is_empty() {
            error!(
                failed = errors.len(),
                total,
                passes = attempt,
                "batch exhausted its retry attempts"
            );
        } else if attempt > 1 {
            info!(passes = attempt, total, "batch recovered after retries");
        }

        self.emit_event(Event::BatchComplete {
            succeeded: containers.len(),
            failed: errors.len(),
        });

        BatchReport {
            containers,
            failures: errors,
            passes: attempt,
        }
    }

    /// Dispatch one pass over the queue and collect every outcome
    async fn run_pass(&self, queue: Vec<FilingReference>) -> Vec<FetchOutcome> {
        let expected = queue.len();
        let semaphore = Arc::new(Semaphore::new(self.config.batch.concurrency.max(1)));
        let (tx, mut rx) = mpsc::channel::<FetchOutcome>(expected.max(1));

        let cache_dir = self.config.fetch_cache_dir();
        let base_url = self.config.network.archive_base_url.clone();

        for filing in queue {
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let client = self.client.clone();
            let cache_dir = cache_dir.clone();
            let base_url = base_url.clone();
            tokio::spawn(async move {
                // The semaphore is never closed while workers run
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result = fetch::fetch_one(&client, &filing, &base_url, &cache_dir).await;
                // The collector may be gone only if the batch was dropped
                let _ = tx.send(FetchOutcome { filing, result }).await;
            });
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(expected);
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Inter-pass sleep, with uniform jitter when configured
    fn retry_delay(&self) -> Duration {
        let base = self.config.batch.backoff;
        if !self.config.batch.jitter {
            return base;
        }
        // Uniform between base and 2x base to avoid a thundering herd
        let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
        Duration::from_secs_f64(base.as_secs_f64() * (1.0 + factor))
    }
}
