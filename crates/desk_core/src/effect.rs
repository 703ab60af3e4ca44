use std::time::Duration;

use crate::{AnalysisRequest, ComparisonRequest, JobId, TimerId};

/// I/O requested by [`crate::update`]; executed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob(AnalysisRequest),
    FetchHistory {
        seq: u64,
        offset: u64,
        limit: u64,
        origin: RefreshOrigin,
    },
    /// One-off fetch outside the watch.
    FetchJob { job_id: JobId },
    /// Status check issued by the active watch.
    PollJob { job_id: JobId, timer: TimerId },
    RemoveJob { job_id: JobId },
    CompareTickers(ComparisonRequest),
    ScheduleTick { timer: TimerId, after: Duration },
    CancelTick { timer: TimerId },
}

/// Who asked for a history refresh; decides whether a failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOrigin {
    User,
    Background,
}
