use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::collectors::{JobSource, RunHandler, ScraperAdapter};
use crate::error::AppError;
use crate::models::collector::Collector;
use crate::models::event::ScrapeEvent;
use crate::models::job::PostingRecord;
use crate::models::query::QuerySpec;
use crate::notify::metrics::MetricsReporter;
use crate::notify::{Notifier, NotifyReport, Transport};
use crate::store;

/// Run-scoped state fed by scrape events.
struct RunContext {
    collector: Collector,
    reporter: MetricsReporter,
}

#[async_trait]
impl RunHandler for RunContext {
    async fn on_event(&mut self, event: ScrapeEvent) {
        tracing::trace!(kind = event.kind(), "Run event");
        match event {
            ScrapeEvent::Data(record) => {
                tracing::debug!(title = %record.title, company = %record.company, "Collected posting");
                self.collector.on_data(record);
            }
            ScrapeEvent::Metrics(metrics) => {
                tracing::info!(
                    processed = metrics.processed,
                    failed = metrics.failed,
                    skipped = metrics.skipped,
                    "Scrape progress"
                );
                self.reporter.report(&metrics).await;
            }
            ScrapeEvent::Error(error) => tracing::warn!("Listing skipped: {error}"),
            ScrapeEvent::End => tracing::info!("Scrape finished with {} postings", self.collector.len()),
            ScrapeEvent::Failed(reason) => tracing::error!("Scrape aborted: {reason}"),
        }
    }
}

/// Scrape one query and append everything collected to the store.
/// Nothing is persisted when the run fails.
pub async fn scrape_and_persist(
    source: Box<dyn JobSource>,
    query: &QuerySpec,
    run_timeout: Duration,
    reporter: MetricsReporter,
    store_path: &Path,
) -> Result<Vec<PostingRecord>, AppError> {
    let mut adapter = ScraperAdapter::new(source, run_timeout);
    let mut context = RunContext {
        collector: Collector::new(),
        reporter,
    };

    let run = adapter.run(query, &mut context).await?;
    let duration = run
        .duration()
        .map(|d| format!("{:.1}s", d.num_milliseconds() as f64 / 1000.0))
        .unwrap_or_default();
    tracing::info!(
        "Run '{}' completed in {duration}: {} found, {} listing errors",
        run.source,
        run.jobs_found,
        run.listing_errors
    );

    if context.collector.is_empty() {
        tracing::warn!("No postings matched '{}'", query.query);
    }
    store::persist(store_path, context.collector.snapshot())?;
    Ok(context.collector.into_records())
}

/// Re-publish postings previously saved to the store.
pub async fn notify_from_store(
    notifier: &Notifier,
    store_path: &Path,
) -> Result<NotifyReport, AppError> {
    let records = store::load(store_path)?;
    tracing::info!("Loaded {} postings from {}", records.len(), store_path.display());
    Ok(notifier.notify_all(&records).await)
}

/// Scrape, persist, then deliver the run's postings.
pub async fn run(
    source: Box<dyn JobSource>,
    query: &QuerySpec,
    run_timeout: Duration,
    transport: Arc<dyn Transport>,
    chat_id: &str,
    max_chunk: usize,
    store_path: &Path,
) -> Result<NotifyReport, AppError> {
    let reporter = MetricsReporter::new(transport.clone(), chat_id, &query.query);
    let records = scrape_and_persist(source, query, run_timeout, reporter, store_path).await?;

    let notifier = Notifier::new(transport, chat_id).with_max_chunk(max_chunk);
    Ok(notifier.notify_all(&records).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::testing::{ScriptedSource, Step, posting};
    use crate::models::message::MessageFormat;
    use crate::notify::testing::RecordingTransport;

    #[tokio::test]
    async fn scrapes_persists_and_notifies_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let transport = Arc::new(RecordingTransport::new(4096));
        let source = ScriptedSource {
            steps: vec![
                Step::Data(posting("a")),
                Step::Error("13"),
                Step::Data(posting("b")),
                Step::Metrics(3),
            ],
        };

        let report = run(
            Box::new(source),
            &QuerySpec::new("Rust Developer", "Worldwide"),
            Duration::from_secs(5),
            transport.clone(),
            "@jobs",
            4096,
            &path,
        )
        .await
        .unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 0);

        assert_eq!(store::load(&path).unwrap(), [posting("a"), posting("b")]);

        let sent = transport.sent();
        let texts: Vec<&str> = sent.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "🔍 #rust_developer\nAvailable: 3 postings",
                "aAbout a",
                "bAbout b",
            ]
        );
        assert_eq!(sent[0].format, MessageFormat::Plain);
    }

    #[tokio::test]
    async fn failed_run_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let transport = Arc::new(RecordingTransport::new(4096));
        let reporter = MetricsReporter::new(transport.clone(), "@jobs", "rust");
        let source = ScriptedSource {
            steps: vec![Step::Data(posting("a")), Step::Fail],
        };

        let err = scrape_and_persist(
            Box::new(source),
            &QuerySpec::new("rust", "Worldwide"),
            Duration::from_secs(5),
            reporter,
            &path,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ScrapeRun(_)));
        assert!(!path.exists());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn status_failures_do_not_abort_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let transport = Arc::new(RecordingTransport::new(4096).failing_at(0));
        let reporter = MetricsReporter::new(transport.clone(), "@jobs", "rust");
        let source = ScriptedSource {
            steps: vec![Step::Metrics(1), Step::Data(posting("a"))],
        };

        let records = scrape_and_persist(
            Box::new(source),
            &QuerySpec::new("rust", "Worldwide"),
            Duration::from_secs(5),
            reporter,
            &path,
        )
        .await
        .unwrap();
        assert_eq!(records, [posting("a")]);
    }

    #[tokio::test]
    async fn consecutive_runs_append_to_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        let transport = Arc::new(RecordingTransport::new(4096));

        for batch in [vec!["a", "b"], vec!["a"]] {
            let source = ScriptedSource {
                steps: batch.iter().map(|t| Step::Data(posting(t))).collect(),
            };
            let reporter = MetricsReporter::new(transport.clone(), "@jobs", "rust");
            scrape_and_persist(
                Box::new(source),
                &QuerySpec::new("rust", "Worldwide"),
                Duration::from_secs(5),
                reporter,
                &path,
            )
            .await
            .unwrap();
        }

        let notifier = Notifier::new(transport.clone(), "@jobs");
        let report = notify_from_store(&notifier, &path).await.unwrap();
        assert_eq!(report.delivered, 3);
        let texts: Vec<String> = transport.sent().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["aAbout a", "bAbout b", "aAbout a"]);
    }
}
