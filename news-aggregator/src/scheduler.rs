use crate::aggregator::{merge, Aggregator};
use crate::traits::EntryStore;
use crate::types::CycleReport;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

/// Drives fetch + persist cycles on a fixed interval. One cycle at a time;
/// a slow cycle pushes the next one back.
pub struct Scheduler {
    aggregator: Aggregator,
    store: Arc<dyn EntryStore>,
    urls: Vec<String>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(
        aggregator: Aggregator,
        store: Arc<dyn EntryStore>,
        urls: Vec<String>,
        interval: Duration,
    ) -> Self {
        Self {
            aggregator,
            store,
            urls,
            interval,
        }
    }

    /// Run one cycle: fetch every feed, merge, upsert. Store failures are
    /// logged and reported, never propagated.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle_id = Uuid::new_v4();
        let span = info_span!("cycle", %cycle_id);

        async move {
            let start_time = Instant::now();
            let started_at = Utc::now();

            let outcomes = self.aggregator.collect(&self.urls).await;
            let feeds_failed = outcomes.iter().filter(|o| !o.is_success()).count();
            let entries_dropped = outcomes
                .iter()
                .filter_map(|o| o.result.as_ref().ok())
                .map(|c| c.dropped)
                .sum();

            let entries = merge(outcomes);
            let upsert = match self.store.upsert_all(&entries).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    error!("Error saving posts: {}", e);
                    None
                }
            };

            let report = CycleReport {
                cycle_id,
                started_at,
                feeds_total: self.urls.len(),
                feeds_failed,
                entries_fetched: entries.len(),
                entries_dropped,
                upsert,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
            };

            info!(
                "Cycle finished in {}ms: {}/{} feeds ok, {} entries, {} dropped, {} new",
                report.elapsed_ms,
                report.feeds_total - report.feeds_failed,
                report.feeds_total,
                report.entries_fetched,
                report.entries_dropped,
                report.upsert.map(|u| u.inserted).unwrap_or(0)
            );
            report
        }
        .instrument(span)
        .await
    }

    /// Loop until `shutdown` flips to `true` or its sender is dropped. The
    /// signal is observed between cycles; an in-flight cycle runs to the end.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Scheduler started: {} feeds every {}s",
            self.urls.len(),
            self.interval.as_secs()
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// Run the loop as an owned background task.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, receiver) = watch::channel(false);
        let join = tokio::spawn(self.run(receiver));
        SchedulerHandle { shutdown, join }
    }
}

pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for the current cycle to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            error!("Scheduler task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
