use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ValidationError;

/// Identifier assigned by the gateway when a job is submitted.
pub type JobId = u64;

const FALLBACK_FAILURE_MESSAGE: &str = "analysis failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    General,
    Analyze,
    Backtest,
}

impl JobKind {
    /// Whether requests of this kind must name a target instrument.
    pub fn requires_ticker(self) -> bool {
        matches!(self, JobKind::Analyze | JobKind::Backtest)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobKind::General => "general",
            JobKind::Analyze => "analyze",
            JobKind::Backtest => "backtest",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(JobKind::General),
            "analyze" | "analysis" => Ok(JobKind::Analyze),
            "backtest" => Ok(JobKind::Backtest),
            _ => Err(ValidationError::UnknownKind(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl JobState {
    /// `Completed` and `Failed` are absorbing.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted analysis request and its outcome.
///
/// `result` is only present when `state` is `Completed`, `error_message` only
/// when it is `Failed`. Both are absent while `Pending`. [`Job::apply_patch`]
/// is the only mutation path and keeps that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub request_text: String,
    pub kind: JobKind,
    pub ticker: Option<String>,
    pub state: JobState,
    /// Payload owned by the analysis backend; never interpreted here.
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn pending(
        id: JobId,
        request_text: impl Into<String>,
        kind: JobKind,
        ticker: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            request_text: request_text.into(),
            kind,
            ticker,
            state: JobState::Pending,
            result: None,
            error_message: None,
            created_at,
            completed_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Merges the outcome fields of `patch` into this job.
    ///
    /// A terminal job only accepts patches carrying the same terminal state, so
    /// a late `Pending` observation can never roll it back. Returns whether
    /// anything changed.
    pub fn apply_patch(&mut self, patch: &JobPatch) -> bool {
        if self.state.is_terminal() && patch.state != self.state {
            return false;
        }

        let (result, error_message) = match patch.state {
            JobState::Pending => (None, None),
            JobState::Completed => (Some(patch.result.clone().unwrap_or(Value::Null)), None),
            JobState::Failed => (
                None,
                Some(
                    patch
                        .error_message
                        .clone()
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| FALLBACK_FAILURE_MESSAGE.to_string()),
                ),
            ),
        };
        let completed_at = if patch.state.is_terminal() {
            patch.completed_at.or(self.completed_at)
        } else {
            None
        };

        let changed = self.state != patch.state
            || self.result != result
            || self.error_message != error_message
            || self.completed_at != completed_at;

        self.state = patch.state;
        self.result = result;
        self.error_message = error_message;
        self.completed_at = completed_at;
        changed
    }
}

/// The mutable part of a [`Job`], as observed by a later fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobPatch {
    pub state: JobState,
    pub result: Option<Value>,
    pub error_message: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobPatch {
    pub fn completed(result: Value, completed_at: DateTime<Utc>) -> Self {
        Self {
            state: JobState::Completed,
            result: Some(result),
            error_message: None,
            completed_at: Some(completed_at),
        }
    }

    pub fn failed(message: impl Into<String>, completed_at: DateTime<Utc>) -> Self {
        Self {
            state: JobState::Failed,
            result: None,
            error_message: Some(message.into()),
            completed_at: Some(completed_at),
        }
    }
}

impl From<&Job> for JobPatch {
    fn from(job: &Job) -> Self {
        Self {
            state: job.state,
            result: job.result.clone(),
            error_message: job.error_message.clone(),
            completed_at: job.completed_at,
        }
    }
}

/// One page of history as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobPage {
    pub items: Vec<Job>,
    /// Server-side count; may exceed `items.len()` under pagination.
    pub total: u64,
}

/// A multi-ticker comparison occupying the result slot instead of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub tickers: Vec<String>,
    pub period: String,
    pub payload: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn pending_job() -> Job {
        Job::pending(1, "What is RSI?", JobKind::General, None, at(0))
    }

    #[test]
    fn completed_patch_sets_result_and_timestamp() {
        let mut job = pending_job();
        assert!(job.apply_patch(&JobPatch::completed(json!({"response": "ok"}), at(5))));
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.result, Some(json!({"response": "ok"})));
        assert_eq!(job.error_message, None);
        assert_eq!(job.completed_at, Some(at(5)));
    }

    #[test]
    fn terminal_state_is_absorbing() {
        let mut job = pending_job();
        job.apply_patch(&JobPatch::failed("boom", at(3)));

        assert!(!job.apply_patch(&JobPatch::default()));
        assert!(!job.apply_patch(&JobPatch::completed(json!(1), at(4))));
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn same_patch_twice_reports_no_change() {
        let mut job = pending_job();
        let patch = JobPatch::completed(json!([1, 2]), at(9));
        assert!(job.apply_patch(&patch));
        let once = job.clone();
        assert!(!job.apply_patch(&patch));
        assert_eq!(job, once);
    }

    #[test]
    fn failed_patch_without_message_gets_fallback() {
        let mut job = pending_job();
        job.apply_patch(&JobPatch {
            state: JobState::Failed,
            error_message: Some("  ".to_string()),
            ..JobPatch::default()
        });
        assert_eq!(job.error_message.as_deref(), Some(FALLBACK_FAILURE_MESSAGE));
        assert_eq!(job.result, None);
    }

    #[test]
    fn kind_parsing_accepts_aliases() {
        assert_eq!("Analyze".parse::<JobKind>().unwrap(), JobKind::Analyze);
        assert_eq!("analysis".parse::<JobKind>().unwrap(), JobKind::Analyze);
        assert!("chart".parse::<JobKind>().is_err());
        assert!(JobKind::Backtest.requires_ticker());
        assert!(!JobKind::General.requires_ticker());
    }
}
