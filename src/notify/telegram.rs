use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::models::message::{MessageFormat, OutboundMessage};
use crate::notify::Transport;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Bot API limit on the text of one message, after entity parsing. The API
/// measures it in UTF-16 code units.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Characters MarkdownV2 requires escaping outside code entities.
const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramTransport {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl TelegramTransport {
    pub fn new(token: &str, api_url: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn max_message_len(&self) -> usize {
        MAX_MESSAGE_LEN
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), TransportError> {
        let len = message.visible_len();
        if len > MAX_MESSAGE_LEN {
            return Err(TransportError::SizeExceeded {
                len,
                limit: MAX_MESSAGE_LEN,
            });
        }

        let (text, parse_mode) = render(message);
        let body = SendMessage {
            chat_id: &message.chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        };

        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        let raw = resp.text().await?;
        let parsed: Option<ApiResponse> = serde_json::from_str(&raw).ok();

        match parsed {
            Some(api) if api.ok && status.is_success() => Ok(()),
            Some(api) => Err(classify(
                status.as_u16(),
                api.description.unwrap_or_default(),
                len,
            )),
            None => Err(classify(status.as_u16(), raw, len)),
        }
    }
}

/// Map a rejected request onto the transport error taxonomy.
fn classify(status: u16, description: String, len: usize) -> TransportError {
    let lowered = description.to_lowercase();
    if lowered.contains("message is too long") || lowered.contains("text is too long") {
        return TransportError::SizeExceeded {
            len,
            limit: MAX_MESSAGE_LEN,
        };
    }
    TransportError::Api {
        status,
        description,
    }
}

/// Message text and `parse_mode` for the Bot API.
fn render(message: &OutboundMessage) -> (String, Option<&'static str>) {
    match &message.format {
        MessageFormat::Plain => (message.text.clone(), None),
        MessageFormat::Emphasized => (
            format!("*{}*", escape_markdown(&message.text)),
            Some("MarkdownV2"),
        ),
        MessageFormat::Code => (
            format!("```\n{}\n```", escape_code(&message.text)),
            Some("MarkdownV2"),
        ),
        MessageFormat::Titled { title } => (
            format!(
                "*{}*\n```\n{}\n```",
                escape_markdown(title),
                escape_code(&message.text)
            ),
            Some("MarkdownV2"),
        ),
    }
}

fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
