use serde::{Deserialize, Serialize};

/// Column order of the store, also used as its header row.
pub const POSTING_COLUMNS: [&str; 5] = ["title", "company", "description", "date", "link"];

/// One job listing as yielded by a source. Fields are kept as the source
/// provided them; `date` is not parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRecord {
    pub title: String,
    pub company: String,
    pub description: String,
    pub date: String,
    pub link: String,
}

impl PostingRecord {
    /// Raw text handed to the notifier: title and description, no separator.
    pub fn message_text(&self) -> String {
        format!("{}{}", self.title, self.description)
    }
}
