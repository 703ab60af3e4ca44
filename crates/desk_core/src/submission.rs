//! Submission and comparison requests.
use desk_logging::{desk_info, desk_warn};

use crate::{
    history, AppState, ComparisonDraft, ComparisonResult, Effect, GatewayError, Job, JobDraft,
};

/// Validates locally; only valid input reaches the gateway.
pub(crate) fn submit(state: &mut AppState, draft: JobDraft) -> Vec<Effect> {
    match draft.validate() {
        Ok(request) => {
            desk_info!(
                "submitting {} request ticker={:?} text_len={}",
                request.kind(),
                request.ticker(),
                request.request_text().len()
            );
            state.store.begin_submission();
            vec![Effect::SubmitJob(request)]
        }
        Err(err) => {
            desk_warn!("submission rejected locally: {}", err);
            state.store.submission_failed(err.to_string());
            Vec::new()
        }
    }
}

/// The job becomes visible before the watch is armed, so the first tick can
/// only ever patch a row that exists.
pub(crate) fn on_submit_completed(
    state: &mut AppState,
    result: Result<Job, GatewayError>,
) -> Vec<Effect> {
    match result {
        Ok(job) => {
            let job_id = job.id;
            desk_info!("job {} accepted in state {}", job_id, job.state);
            state.store.submission_succeeded(job);
            let mut effects = state.poll.arm(job_id);
            effects.extend(history::refresh_first_page(state));
            effects
        }
        Err(err) => {
            desk_warn!("submission failed: {}", err);
            state.store.submission_failed(err.user_message());
            Vec::new()
        }
    }
}

pub(crate) fn compare(state: &mut AppState, draft: ComparisonDraft) -> Vec<Effect> {
    match draft.validate() {
        Ok(request) => {
            desk_info!(
                "comparing {:?} over {}",
                request.tickers(),
                request.period()
            );
            state.store.begin_comparison();
            vec![Effect::CompareTickers(request)]
        }
        Err(err) => {
            desk_warn!("comparison rejected locally: {}", err);
            state.store.comparison_failed(err.to_string());
            Vec::new()
        }
    }
}

pub(crate) fn on_compare_completed(
    state: &mut AppState,
    result: Result<ComparisonResult, GatewayError>,
) -> Vec<Effect> {
    match result {
        Ok(payload) => state.store.comparison_succeeded(payload),
        Err(err) => {
            desk_warn!("comparison failed: {}", err);
            state.store.comparison_failed(err.user_message());
        }
    }
    Vec::new()
}
