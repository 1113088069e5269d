use crate::error::ListingError;
use crate::models::job::PostingRecord;

/// Progress counters of the current run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// Listings handled so far, successful or not.
    pub processed: usize,
    pub failed: usize,
    /// Listings already seen earlier in the run.
    pub skipped: usize,
}

/// Events delivered to a run handler, in emission order.
#[derive(Debug, Clone)]
pub enum ScrapeEvent {
    Data(PostingRecord),
    Metrics(RunMetrics),
    Error(ListingError),
    /// Run finished normally. Delivered exactly once, last.
    End,
    /// Engine fault. Delivered instead of `End`.
    Failed(String),
}

impl ScrapeEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeEvent::Data(_) => "data",
            ScrapeEvent::Metrics(_) => "metrics",
            ScrapeEvent::Error(_) => "error",
            ScrapeEvent::End => "end",
            ScrapeEvent::Failed(_) => "failed",
        }
    }
}
