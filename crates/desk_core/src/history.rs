//! History list: refresh, selection, one-off reloads and deletion.
use desk_logging::{desk_debug, desk_info, desk_warn};

use crate::{
    AppState, Effect, GatewayError, Job, JobId, JobPage, JobPatch, RefreshOrigin, SortOrder,
};

/// Background reconciliation; never touches the result slot.
pub(crate) fn refresh(state: &mut AppState, origin: RefreshOrigin) -> Vec<Effect> {
    let seq = state.history.next_seq;
    state.history.next_seq += 1;
    state.store.begin_refresh();
    vec![Effect::FetchHistory {
        seq,
        offset: state.history.offset,
        limit: state.history.limit,
        origin,
    }]
}

/// Reconciles from the newest page, where a freshly submitted or finished
/// job is listed.
pub(crate) fn refresh_first_page(state: &mut AppState) -> Vec<Effect> {
    state.history.offset = 0;
    refresh(state, RefreshOrigin::Background)
}

pub(crate) fn request_page(state: &mut AppState, offset: u64) -> Vec<Effect> {
    state.history.offset = offset;
    refresh(state, RefreshOrigin::User)
}

pub(crate) fn on_history_loaded(
    state: &mut AppState,
    seq: u64,
    origin: RefreshOrigin,
    result: Result<JobPage, GatewayError>,
) -> Vec<Effect> {
    state.store.refresh_finished();
    if seq <= state.history.applied_seq {
        desk_debug!(
            "discarding history page {} (already applied {})",
            seq,
            state.history.applied_seq
        );
        return Vec::new();
    }

    match result {
        Ok(page) => {
            state.history.applied_seq = seq;
            state.store.replace_list(page.items, page.total);
        }
        Err(err) => match origin {
            RefreshOrigin::User => {
                desk_warn!("history refresh failed: {}", err);
                state.store.set_error(err.user_message());
            }
            RefreshOrigin::Background => {
                desk_warn!("background history refresh failed: {}", err);
            }
        },
    }
    Vec::new()
}

/// Focuses the row as listed; no re-fetch.
pub(crate) fn select(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    match state.store.find(job_id).cloned() {
        Some(job) => state.store.focus(job),
        None => desk_debug!("ignoring selection of unknown job {}", job_id),
    }
    Vec::new()
}

pub(crate) fn reload(job_id: JobId) -> Vec<Effect> {
    vec![Effect::FetchJob { job_id }]
}

pub(crate) fn on_job_fetched(
    state: &mut AppState,
    job_id: JobId,
    result: Result<Job, GatewayError>,
) -> Vec<Effect> {
    match result {
        Ok(job) => {
            state.store.patch_job(job_id, &JobPatch::from(&job));
        }
        Err(err) => {
            desk_warn!("reload of job {} failed: {}", job_id, err);
            state.store.set_error(err.user_message());
        }
    }
    Vec::new()
}

pub(crate) fn request_delete(state: &mut AppState, job_id: JobId) -> Vec<Effect> {
    state.pending_delete = Some(job_id);
    state.mark_dirty();
    Vec::new()
}

pub(crate) fn confirm_delete(state: &mut AppState) -> Vec<Effect> {
    match state.pending_delete.take() {
        Some(job_id) => {
            desk_info!("deleting job {}", job_id);
            state.mark_dirty();
            vec![Effect::RemoveJob { job_id }]
        }
        None => Vec::new(),
    }
}

pub(crate) fn cancel_delete(state: &mut AppState) -> Vec<Effect> {
    if state.pending_delete.take().is_some() {
        state.mark_dirty();
    }
    Vec::new()
}

pub(crate) fn on_delete_completed(
    state: &mut AppState,
    job_id: JobId,
    result: Result<(), GatewayError>,
) -> Vec<Effect> {
    match result {
        Ok(()) => {
            state.store.remove_job(job_id);
            if state.poll.watching() == Some(job_id) {
                desk_debug!("deleted job {} was being watched; disarming", job_id);
                return state.poll.disarm();
            }
            Vec::new()
        }
        Err(err) => {
            desk_warn!("delete of job {} failed: {}", job_id, err);
            state.store.set_error(err.user_message());
            Vec::new()
        }
    }
}

pub(crate) fn set_search(state: &mut AppState, search: String) -> Vec<Effect> {
    if state.history.query.search != search {
        state.history.query.search = search;
        state.mark_dirty();
    }
    Vec::new()
}

pub(crate) fn set_sort(state: &mut AppState, sort: SortOrder) -> Vec<Effect> {
    if state.history.query.sort != sort {
        state.history.query.sort = sort;
        state.mark_dirty();
    }
    Vec::new()
}
