use std::sync::Arc;

use crate::models::event::RunMetrics;
use crate::models::message::{MessageFormat, OutboundMessage};
use crate::notify::Transport;
use crate::text::slugify;

/// Posts a short progress line for every metrics event of a run.
pub struct MetricsReporter {
    transport: Arc<dyn Transport>,
    chat_id: String,
    tag: String,
}

pub fn render_status(tag: &str, processed: usize) -> String {
    format!("🔍 #{tag}\nAvailable: {processed} postings")
}

impl MetricsReporter {
    pub fn new(transport: Arc<dyn Transport>, chat_id: &str, query: &str) -> Self {
        Self {
            transport,
            chat_id: chat_id.to_string(),
            tag: slugify(query),
        }
    }

    /// Best effort: a failed send is logged and reported as `false`.
    pub async fn report(&self, metrics: &RunMetrics) -> bool {
        let message = OutboundMessage::new(
            &self.chat_id,
            render_status(&self.tag, metrics.processed),
            MessageFormat::Plain,
        );
        match self.transport.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(processed = metrics.processed, "Failed to send status: {e}");
                false
            }
        }
    }
}
