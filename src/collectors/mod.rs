// Scraper adapter: wraps a listing source and drives a run handler through
// the lifecycle events of one scraping run.

pub mod linkedin;
pub mod runner;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, ListingError, ScrapeError};
use crate::models::collector_run::{CollectorRun, RunStatus};
use crate::models::event::{RunMetrics, ScrapeEvent};
use crate::models::job::PostingRecord;
use crate::models::query::QuerySpec;

/// Trait that all listing sources must implement.
/// A source performs the actual fetching and reports what it finds through
/// the sink. Returning `Err` means the engine itself failed.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    async fn scrape(&self, query: &QuerySpec, sink: &mut EventSink<'_>) -> Result<(), ScrapeError>;
}

/// Receives run events one at a time. Each call completes before the next
/// event is delivered.
#[async_trait]
pub trait RunHandler: Send {
    async fn on_event(&mut self, event: ScrapeEvent);
}

/// Handle given to a source for emitting events during a run.
pub struct EventSink<'a> {
    handler: &'a mut dyn RunHandler,
    run: &'a mut CollectorRun,
    last_processed: usize,
}

impl EventSink<'_> {
    pub async fn data(&mut self, record: PostingRecord) {
        self.run.jobs_found += 1;
        self.handler.on_event(ScrapeEvent::Data(record)).await;
    }

    /// Processed counts never go backwards within a run.
    pub async fn metrics(&mut self, mut metrics: RunMetrics) {
        if metrics.processed < self.last_processed {
            tracing::debug!(
                reported = metrics.processed,
                last = self.last_processed,
                "Clamping regressed processed count"
            );
            metrics.processed = self.last_processed;
        }
        self.last_processed = metrics.processed;
        self.handler.on_event(ScrapeEvent::Metrics(metrics)).await;
    }

    pub async fn error(&mut self, error: ListingError) {
        self.run.listing_errors += 1;
        self.handler.on_event(ScrapeEvent::Error(error)).await;
    }
}

/// One-shot adapter around a source: `Idle -> Running -> Completed | Failed`.
pub struct ScraperAdapter {
    source: Box<dyn JobSource>,
    run: CollectorRun,
    run_timeout: Duration,
}

impl ScraperAdapter {
    pub fn new(source: Box<dyn JobSource>, run_timeout: Duration) -> Self {
        let run = CollectorRun::new(source.name());
        Self {
            source,
            run,
            run_timeout,
        }
    }

    #[allow(dead_code)]
    pub fn status(&self) -> RunStatus {
        self.run.status
    }

    #[allow(dead_code)]
    pub fn run_record(&self) -> &CollectorRun {
        &self.run
    }

    /// Perform the run, delivering every event to `handler`.
    /// On success `End` has been delivered exactly once; on engine failure
    /// `Failed` has been delivered instead and the error is returned.
    pub async fn run(
        &mut self,
        query: &QuerySpec,
        handler: &mut dyn RunHandler,
    ) -> Result<&CollectorRun, AppError> {
        self.run.mark_running()?;
        tracing::info!(
            "Starting '{}' run for '{}' in {:?}",
            self.source.name(),
            query.query,
            query.locations
        );

        let outcome = {
            let mut sink = EventSink {
                handler: &mut *handler,
                run: &mut self.run,
                last_processed: 0,
            };
            match tokio::time::timeout(self.run_timeout, self.source.scrape(query, &mut sink)).await
            {
                Ok(result) => result,
                Err(_) => Err(ScrapeError::Timeout(self.run_timeout)),
            }
        };

        match outcome {
            Ok(()) => {
                self.run.mark_completed()?;
                handler.on_event(ScrapeEvent::End).await;
                Ok(&self.run)
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!("Run for '{}' failed: {reason}", self.source.name());
                self.run.mark_failed(&reason)?;
                handler.on_event(ScrapeEvent::Failed(reason)).await;
                Err(AppError::ScrapeRun(e))
            }
        }
    }
}
