use chrono::{DateTime, Utc};

use crate::{ComparisonResult, Job, JobId, JobKind, JobState, SortOrder};

/// Read-only snapshot handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    /// History rows after search and sort.
    pub rows: Vec<JobRowView>,
    /// Rows known locally, before search.
    pub job_count: usize,
    pub total: u64,
    pub page_offset: u64,
    pub page_limit: u64,
    pub focused_job: Option<Job>,
    pub comparison: Option<ComparisonResult>,
    pub is_busy: bool,
    pub last_error: Option<String>,
    pub watching: Option<JobId>,
    pub pending_delete: Option<JobId>,
    pub search: String,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: JobId,
    pub request_text: String,
    pub kind: JobKind,
    pub ticker: Option<String>,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub focused: bool,
    pub watched: bool,
}
