use crate::{history, poll, submission, AppState, Effect, Msg, RefreshOrigin};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SubmitRequested(draft) => submission::submit(&mut state, draft),
        Msg::SubmitCompleted(result) => submission::on_submit_completed(&mut state, result),
        Msg::RefreshRequested => history::refresh(&mut state, RefreshOrigin::User),
        Msg::PageRequested { offset } => history::request_page(&mut state, offset),
        Msg::HistoryLoaded {
            seq,
            origin,
            result,
        } => history::on_history_loaded(&mut state, seq, origin, result),
        Msg::JobSelected { job_id } => history::select(&mut state, job_id),
        Msg::ReloadRequested { job_id } => history::reload(job_id),
        Msg::JobFetched { job_id, result } => history::on_job_fetched(&mut state, job_id, result),
        Msg::PollTickDue { timer } => poll::on_tick_due(&mut state, timer),
        Msg::PollFetched {
            job_id,
            timer,
            result,
        } => poll::on_poll_fetched(&mut state, job_id, timer, result),
        Msg::DeleteRequested { job_id } => history::request_delete(&mut state, job_id),
        Msg::DeleteConfirmed => history::confirm_delete(&mut state),
        Msg::DeleteCancelled => history::cancel_delete(&mut state),
        Msg::DeleteCompleted { job_id, result } => {
            history::on_delete_completed(&mut state, job_id, result)
        }
        Msg::CompareRequested(draft) => submission::compare(&mut state, draft),
        Msg::CompareCompleted(result) => submission::on_compare_completed(&mut state, result),
        Msg::ComparisonFocused(payload) => {
            state.store.focus_comparison(payload);
            Vec::new()
        }
        Msg::FocusCleared => {
            state.store.clear_focus();
            Vec::new()
        }
        Msg::SearchChanged(search) => history::set_search(&mut state, search),
        Msg::SortChanged(sort) => history::set_sort(&mut state, sort),
        Msg::ErrorDismissed => {
            state.store.clear_error();
            Vec::new()
        }
        Msg::SessionEnded => {
            state.pending_delete = None;
            state.poll.disarm()
        }
    };

    (state, effects)
}
