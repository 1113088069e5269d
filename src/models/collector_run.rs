use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Lifecycle of a single scraping run: `Idle -> Running -> Completed | Failed`.
#[derive(Debug)]
pub struct CollectorRun {
    pub source: String,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub jobs_found: usize,
    pub listing_errors: usize,
    #[allow(dead_code)]
    pub error: Option<String>,
}

impl CollectorRun {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            status: RunStatus::Idle,
            started_at: None,
            finished_at: None,
            jobs_found: 0,
            listing_errors: 0,
            error: None,
        }
    }

    pub fn mark_running(&mut self) -> Result<(), AppError> {
        self.transition(RunStatus::Idle, RunStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_completed(&mut self) -> Result<(), AppError> {
        self.transition(RunStatus::Running, RunStatus::Completed)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub fn mark_failed(&mut self, error: &str) -> Result<(), AppError> {
        self.transition(RunStatus::Running, RunStatus::Failed)?;
        self.finished_at = Some(Utc::now());
        self.error = Some(error.to_string());
        Ok(())
    }

    /// Wall-clock duration, available once the run has finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }

    fn transition(&mut self, from: RunStatus, to: RunStatus) -> Result<(), AppError> {
        if self.status != from {
            return Err(AppError::InvalidState(format!(
                "run for '{}' cannot move from {} to {to}",
                self.source, self.status
            )));
        }
        self.status = to;
        Ok(())
    }
}
