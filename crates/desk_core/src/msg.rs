use crate::{
    ComparisonDraft, ComparisonResult, GatewayError, Job, JobDraft, JobId, JobPage, RefreshOrigin,
    SortOrder, TimerId,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted a new analysis request.
    SubmitRequested(JobDraft),
    /// Gateway answered a submission.
    SubmitCompleted(Result<Job, GatewayError>),
    /// User asked for the history list to be reloaded.
    RefreshRequested,
    /// User moved to another history page.
    PageRequested { offset: u64 },
    /// Gateway answered a history fetch.
    HistoryLoaded {
        seq: u64,
        origin: RefreshOrigin,
        result: Result<JobPage, GatewayError>,
    },
    /// User picked a row from the history list.
    JobSelected { job_id: JobId },
    /// User asked for a fresh copy of one job.
    ReloadRequested { job_id: JobId },
    /// Gateway answered a one-off fetch.
    JobFetched {
        job_id: JobId,
        result: Result<Job, GatewayError>,
    },
    /// A scheduled poll timer fired.
    PollTickDue { timer: TimerId },
    /// Gateway answered a status check issued by the watch.
    PollFetched {
        job_id: JobId,
        timer: TimerId,
        result: Result<Job, GatewayError>,
    },
    /// User asked to delete a job; awaits confirmation.
    DeleteRequested { job_id: JobId },
    DeleteConfirmed,
    DeleteCancelled,
    /// Gateway answered a delete.
    DeleteCompleted {
        job_id: JobId,
        result: Result<(), GatewayError>,
    },
    /// User asked for a multi-ticker comparison.
    CompareRequested(ComparisonDraft),
    /// Gateway answered a comparison.
    CompareCompleted(Result<ComparisonResult, GatewayError>),
    /// Put an already available comparison into the result slot.
    ComparisonFocused(ComparisonResult),
    /// Empty the result slot.
    FocusCleared,
    /// User edited the history search box.
    SearchChanged(String),
    /// User picked a history sort order.
    SortChanged(SortOrder),
    /// User dismissed the error banner.
    ErrorDismissed,
    /// UI session is over; stop watching.
    SessionEnded,
}
