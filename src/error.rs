use std::time::Duration;

/// Errors surfaced to the caller of a run or a delivery.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Scrape run failed: {0}")]
    ScrapeRun(#[from] ScrapeError),

    #[error("Failed to deliver '{title}' ({link}): {source}")]
    Delivery {
        title: String,
        link: String,
        #[source]
        source: TransportError,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid run state: {0}")]
    InvalidState(String),
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

/// Unrecoverable fault of the scraping engine. Aborts the run without an `End` event.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("search page request failed: {0}")]
    Fetch(String),

    #[error("search page returned {status}")]
    Status { status: u16 },

    #[error("run exceeded its budget of {0:?}")]
    Timeout(Duration),
}

/// One listing failed to load or parse. Reported through `Error` events only.
#[derive(Debug, Clone, thiserror::Error)]
#[error("listing {listing}: {message}")]
pub struct ListingError {
    pub listing: String,
    pub message: String,
}

impl ListingError {
    pub fn new(listing: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            listing: listing.into(),
            message: message.into(),
        }
    }
}

/// Failure reported by the messaging transport for a single message.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("message of {len} characters exceeds the limit of {limit}")]
    SizeExceeded { len: usize, limit: usize },

    #[error("API error (status {status}): {description}")]
    Api { status: u16, description: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}
