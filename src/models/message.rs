/// How the transport should render a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFormat {
    Plain,
    /// Bold text, used for headers.
    Emphasized,
    /// Literal block, used for posting bodies.
    Code,
    /// Bold title line followed by a literal block holding `text`.
    Titled { title: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: String,
    pub text: String,
    pub format: MessageFormat,
}

impl OutboundMessage {
    pub fn new(chat_id: &str, text: impl Into<String>, format: MessageFormat) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            text: text.into(),
            format,
        }
    }

    /// Length of the text the recipient will see, markup excluded, in UTF-16
    /// code units. Characters outside the BMP count twice.
    pub fn visible_len(&self) -> usize {
        let body = self.text.encode_utf16().count();
        match &self.format {
            MessageFormat::Titled { title } => title.encode_utf16().count() + 1 + body,
            _ => body,
        }
    }
}
