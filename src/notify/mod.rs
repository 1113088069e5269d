// Notifier: republishes postings through the messaging transport, paging
// bodies that do not fit in a single message.

pub mod metrics;
pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, TransportError};
use crate::models::job::PostingRecord;
use crate::models::message::{MessageFormat, OutboundMessage};
use crate::text::normalize;

/// Header used when a posting has no title.
const UNTITLED: &str = "Untitled";

/// Outbound messaging seam. Implementations report oversized messages as
/// `TransportError::SizeExceeded` and everything else as other variants.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hard ceiling on the visible length of one message.
    fn max_message_len(&self) -> usize;

    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError>;
}

/// How a posting was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Single,
    Paginated { pages: usize },
    /// Nothing to send: title and description were blank.
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NotifyReport {
    pub delivered: usize,
    pub paginated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Splits `text` into consecutive pieces of at most `max_chars` characters.
/// Boundaries fall purely by length and may land mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let split = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(split);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Header text for page `page` (1-based) of a paginated posting.
pub fn header_text(title: &str, page: usize) -> String {
    let title = display_title(title);
    if page > 1 {
        format!("{title} — page {page}")
    } else {
        title.to_string()
    }
}

pub fn render_header(chat_id: &str, title: &str, page: usize) -> OutboundMessage {
    OutboundMessage::new(chat_id, header_text(title, page), MessageFormat::Emphasized)
}

pub fn render_chunk(chat_id: &str, body: &str) -> OutboundMessage {
    OutboundMessage::new(chat_id, body, MessageFormat::Code)
}

/// The single-message form: bold title over the whole body.
pub fn render_posting(chat_id: &str, title: &str, body: &str) -> OutboundMessage {
    OutboundMessage::new(
        chat_id,
        body,
        MessageFormat::Titled {
            title: display_title(title).to_string(),
        },
    )
}

fn display_title(title: &str) -> &str {
    let trimmed = title.trim();
    if trimmed.is_empty() { UNTITLED } else { trimmed }
}

pub struct Notifier {
    transport: Arc<dyn Transport>,
    chat_id: String,
    max_chunk: usize,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>, chat_id: &str) -> Self {
        let max_chunk = transport.max_message_len();
        Self {
            transport,
            chat_id: chat_id.to_string(),
            max_chunk,
        }
    }

    /// Longest body sent as one message, also the page size of the fallback.
    /// Never above the transport ceiling.
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk.clamp(1, self.transport.max_message_len());
        self
    }

    /// Deliver one posting. Tries a single message first and falls back to
    /// header + body pages when the body is longer than `max_chunk` or the
    /// transport rejects it as too large.
    pub async fn send(&self, record: &PostingRecord) -> Result<Delivery, AppError> {
        let full_text = normalize(&record.message_text());
        if full_text.is_empty() {
            tracing::warn!(link = %record.link, "Skipping posting with empty text");
            return Ok(Delivery::Skipped);
        }

        let len = full_text.chars().count();
        let attempt = if len > self.max_chunk {
            Err(TransportError::SizeExceeded {
                len,
                limit: self.max_chunk,
            })
        } else {
            let single = render_posting(&self.chat_id, &record.title, &full_text);
            self.transport.send(&single).await
        };

        match attempt {
            Ok(()) => Ok(Delivery::Single),
            Err(TransportError::SizeExceeded { len, limit }) => {
                tracing::debug!(
                    title = %record.title,
                    len,
                    limit,
                    "Posting too long for one message, paginating"
                );
                let pages = self
                    .send_paginated(&record.title, &full_text)
                    .await
                    .map_err(|e| delivery_error(record, e))?;
                Ok(Delivery::Paginated { pages })
            }
            Err(e) => Err(delivery_error(record, e)),
        }
    }

    async fn send_paginated(&self, title: &str, full_text: &str) -> Result<usize, TransportError> {
        let chunks = chunk_text(full_text, self.max_chunk);
        for (i, chunk) in chunks.iter().enumerate() {
            self.transport
                .send(&render_header(&self.chat_id, title, i + 1))
                .await?;
            self.transport.send(&render_chunk(&self.chat_id, chunk)).await?;
        }
        Ok(chunks.len())
    }

    /// Deliver every posting in order. A failed posting is logged and the
    /// next one is attempted.
    pub async fn notify_all(&self, records: &[PostingRecord]) -> NotifyReport {
        let mut report = NotifyReport::default();

        for record in records {
            match self.send(record).await {
                Ok(Delivery::Single) => report.delivered += 1,
                Ok(Delivery::Paginated { pages }) => {
                    tracing::info!(title = %record.title, pages, "Delivered posting in pages");
                    report.delivered += 1;
                    report.paginated += 1;
                }
                Ok(Delivery::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!("{e}");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Notified {} postings: {} delivered ({} paginated), {} skipped, {} failed",
            records.len(),
            report.delivered,
            report.paginated,
            report.skipped,
            report.failed
        );
        report
    }
}

fn delivery_error(record: &PostingRecord, source: TransportError) -> AppError {
    AppError::Delivery {
        title: record.title.clone(),
        link: record.link.clone(),
        source,
    }
}


#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::testing::RecordingTransport;
    use super::*;

    const CHAT: &str = "@jobs";

    fn record(title: &str, description: &str) -> PostingRecord {
        PostingRecord {
            title: title.to_string(),
            company: "Acme".to_string(),
            description: description.to_string(),
            date: "2024-05-01".to_string(),
            link: "https://example.test/1".to_string(),
        }
    }

    fn notifier(transport: &Arc<RecordingTransport>) -> Notifier {
        Notifier::new(transport.clone(), CHAT)
    }

    #[test]
    fn chunks_5000_chars_into_4096_and_904() {
        let text = "x".repeat(5000);
        let chunks = chunk_text(&text, 4096);
        let lens: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lens, [4096, 904]);
    }

    #[test]
    fn chunks_cover_text_within_bound() {
        let text = "Grüße, naïve café — ünïcödé text with 🚀 emoji ".repeat(97);
        for max in [1, 7, 64, 4096] {
            let chunks = chunk_text(&text, max);
            assert!(chunks.iter().all(|c| c.chars().count() <= max));
            assert!(chunks.iter().all(|c| !c.is_empty()));
            assert_eq!(chunks.concat(), text);
            assert_eq!(chunks.len(), text.chars().count().div_ceil(max));
        }
        assert!(chunk_text("", 10).is_empty());
        assert_eq!(chunk_text("short", 10), ["short"]);
    }

    proptest! {
        #[test]
        fn chunks_are_bounded_and_cover_any_text(text in any::<String>(), max in 1usize..64) {
            let chunks = chunk_text(&text, max);
            prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.chars().count() <= max));
            prop_assert_eq!(chunks.concat(), text.as_str());
            prop_assert_eq!(chunks.len(), text.chars().count().div_ceil(max));
        }
    }

    #[test]
    fn headers_number_later_pages() {
        assert_eq!(header_text("Title", 1), "Title");
        assert_eq!(header_text("Title", 2), "Title — page 2");
        assert_eq!(header_text("  ", 3), "Untitled — page 3");

        let header = render_header(CHAT, "Title", 2);
        assert_eq!(header.format, MessageFormat::Emphasized);
        assert_eq!(render_chunk(CHAT, "body").format, MessageFormat::Code);
    }

    #[tokio::test]
    async fn short_posting_is_one_message() {
        let transport = Arc::new(RecordingTransport::new(4096));
        let delivery = notifier(&transport)
            .send(&record("Engineer", "Remote   role\n\nGreat   team"))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Single);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "EngineerRemote role\nGreat team");
        assert_eq!(sent[0].chat_id, CHAT);
        assert_eq!(
            sent[0].format,
            MessageFormat::Titled {
                title: "Engineer".to_string()
            }
        );
    }

    #[tokio::test]
    async fn text_at_the_limit_is_not_paginated() {
        let transport = Arc::new(RecordingTransport::new(100));
        let description = "d".repeat(95);
        let delivery = notifier(&transport)
            .send(&record("Title", &description))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Single);
        assert!(transport.sent().iter().all(|m| !m.text.contains("page")));
    }

    #[tokio::test]
    async fn long_posting_falls_back_to_pages() {
        let transport = Arc::new(RecordingTransport::new(4096));
        let description = "y".repeat(4995);
        let delivery = notifier(&transport)
            .send(&record("Title", &description))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Paginated { pages: 2 });

        let sent = transport.sent();
        let shape: Vec<(&str, usize)> = sent
            .iter()
            .map(|m| {
                let kind = match m.format {
                    MessageFormat::Emphasized => "header",
                    MessageFormat::Code => "chunk",
                    _ => "other",
                };
                (kind, m.text.chars().count())
            })
            .collect();
        assert_eq!(
            shape,
            [("header", 5), ("chunk", 4096), ("header", 14), ("chunk", 904)]
        );
        assert_eq!(sent[0].text, "Title");
        assert_eq!(sent[2].text, "Title — page 2");

        let rebuilt: String = sent
            .iter()
            .filter(|m| m.format == MessageFormat::Code)
            .map(|m| m.text.as_str())
            .collect();
        assert_eq!(rebuilt, normalize(&format!("Title{description}")));
    }

    #[tokio::test]
    async fn configured_chunk_size_triggers_pagination() {
        let transport = Arc::new(RecordingTransport::new(4096));
        let delivery = notifier(&transport)
            .with_max_chunk(100)
            .send(&record("T", &"r".repeat(499)))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Paginated { pages: 5 });

        let sent = transport.sent();
        assert!(sent.iter().all(|m| !matches!(m.format, MessageFormat::Titled { .. })));
        let chunks: Vec<usize> = sent
            .iter()
            .filter(|m| m.format == MessageFormat::Code)
            .map(|m| m.text.chars().count())
            .collect();
        assert_eq!(chunks, [100, 100, 100, 100, 100]);
    }

    #[tokio::test]
    async fn transport_rejection_within_chunk_size_still_paginates() {
        // body fits in 20 characters, the title pushes the single message over
        let transport = Arc::new(RecordingTransport::new(20).counting_titles());
        let delivery = notifier(&transport)
            .send(&record("Long title", &"b".repeat(8)))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Paginated { pages: 1 });

        let texts: Vec<String> = transport.sent().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["Long title", "Long titlebbbbbbbb"]);
    }

    #[tokio::test]
    async fn page_count_is_ceiling_of_length() {
        let transport = Arc::new(RecordingTransport::new(10));
        let delivery = notifier(&transport)
            .send(&record("T", &"z".repeat(30)))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Paginated { pages: 4 });

        let sent = transport.sent();
        assert_eq!(sent.len(), 8);
        let headers: Vec<&str> = sent.iter().step_by(2).map(|m| m.text.as_str()).collect();
        assert_eq!(headers, ["T", "T — page 2", "T — page 3", "T — page 4"]);
    }

    #[tokio::test]
    async fn blank_posting_sends_nothing() {
        let transport = Arc::new(RecordingTransport::new(4096));
        let delivery = notifier(&transport)
            .send(&record(" ", "\n\n \t"))
            .await
            .unwrap();
        assert_eq!(delivery, Delivery::Skipped);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn other_errors_propagate_without_chunking() {
        let transport = Arc::new(RecordingTransport::new(4096).failing_at(0));
        let err = notifier(&transport)
            .send(&record("Title", "short body"))
            .await
            .unwrap_err();

        match err {
            AppError::Delivery { title, link, source } => {
                assert_eq!(title, "Title");
                assert_eq!(link, "https://example.test/1");
                assert!(matches!(source, TransportError::Api { status: 429, .. }));
            }
            other => panic!("expected delivery error, got {other:?}"),
        }
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn failure_during_pagination_is_fatal_for_the_record() {
        // attempt 0: header, 1: chunk, 2: header (fails)
        let transport = Arc::new(RecordingTransport::new(10).failing_at(2));
        let err = notifier(&transport)
            .send(&record("T", &"z".repeat(30)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Delivery { .. }));
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn notify_all_continues_after_a_failed_record() {
        let transport = Arc::new(RecordingTransport::new(4096).failing_at(1));
        let records = [
            record("First", "one"),
            record("Second", "two"),
            record("", ""),
            record("Fourth", "four"),
        ];

        let report = notifier(&transport).notify_all(&records).await;
        assert_eq!(
            report,
            NotifyReport {
                delivered: 2,
                paginated: 0,
                skipped: 1,
                failed: 1,
            }
        );
        let texts: Vec<String> = transport.sent().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, ["Firstone", "Fourthfour"]);
    }

    #[tokio::test]
    async fn smaller_page_size_is_honoured() {
        let transport = Arc::new(RecordingTransport::new(20));
        let notifier = notifier(&transport).with_max_chunk(8);
        let delivery = notifier.send(&record("T", &"q".repeat(30))).await.unwrap();
        assert_eq!(delivery, Delivery::Paginated { pages: 4 });
        assert!(
            transport
                .sent()
                .iter()
                .filter(|m| m.format == MessageFormat::Code)
                .all(|m| m.text.chars().count() <= 8)
        );
    }
}
