use std::mem;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use desk_core::{
    update, AppState, AppViewModel, ComparisonDraft, ComparisonResult, JobDraft, JobId, Msg,
    TimerId,
};
use desk_logging::{desk_debug, desk_trace};
use tokio::runtime::Handle;

use crate::{EffectRunner, JobGateway, Scheduler};

/// Single owner of the application state. Messages are applied one at a time on the
/// caller's thread; gateway answers and timer ticks arrive through an internal channel.
///
/// Blocking helpers (`wait_next`, `run_until`) must not be called from inside the
/// runtime the gateway runs on.
pub struct Coordinator {
    state: AppState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl Coordinator {
    pub fn new(
        state: AppState,
        gateway: Arc<dyn JobGateway>,
        scheduler: Arc<dyn Scheduler>,
        handle: Handle,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        Self {
            state,
            runner: EffectRunner::new(gateway, scheduler, handle, msg_tx),
            msg_rx,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    /// Timers currently held by the runner.
    pub fn live_timers(&self) -> Vec<TimerId> {
        self.runner.live_timers()
    }

    pub fn dispatch(&mut self, msg: Msg) {
        if let Msg::PollTickDue { timer } = &msg {
            self.runner.timer_fired(*timer);
        }
        desk_trace!("dispatch {msg:?}");
        let (state, effects) = update(mem::take(&mut self.state), msg);
        self.state = state;
        if !effects.is_empty() {
            desk_debug!("running {} effect(s)", effects.len());
        }
        self.runner.run(effects);
    }

    /// Applies every message already waiting. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.dispatch(msg);
            applied += 1;
        }
        applied
    }

    /// Waits up to `timeout` for one message and applies it.
    pub fn wait_next(&mut self, timeout: Duration) -> bool {
        match self.msg_rx.recv_timeout(timeout) {
            Ok(msg) => {
                self.dispatch(msg);
                true
            }
            Err(_) => false,
        }
    }

    /// Applies messages until `done` holds or `timeout` elapses.
    pub fn run_until<F>(&mut self, timeout: Duration, done: F) -> bool
    where
        F: Fn(&AppState) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if done(&self.state) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            self.wait_next(deadline - now);
        }
    }

    pub fn submit_job(&mut self, draft: JobDraft) {
        self.dispatch(Msg::SubmitRequested(draft));
    }

    pub fn select_job(&mut self, job_id: JobId) {
        self.dispatch(Msg::JobSelected { job_id });
    }

    pub fn request_delete(&mut self, job_id: JobId) {
        self.dispatch(Msg::DeleteRequested { job_id });
    }

    pub fn confirm_delete(&mut self) {
        self.dispatch(Msg::DeleteConfirmed);
    }

    pub fn cancel_delete(&mut self) {
        self.dispatch(Msg::DeleteCancelled);
    }

    pub fn refresh_history(&mut self) {
        self.dispatch(Msg::RefreshRequested);
    }

    pub fn request_page(&mut self, offset: u64) {
        self.dispatch(Msg::PageRequested { offset });
    }

    pub fn reload_job(&mut self, job_id: JobId) {
        self.dispatch(Msg::ReloadRequested { job_id });
    }

    pub fn compare(&mut self, draft: ComparisonDraft) {
        self.dispatch(Msg::CompareRequested(draft));
    }

    pub fn focus_comparison(&mut self, payload: ComparisonResult) {
        self.dispatch(Msg::ComparisonFocused(payload));
    }

    pub fn clear_focus(&mut self) {
        self.dispatch(Msg::FocusCleared);
    }

    /// Disarms the watch and cancels any outstanding timer.
    pub fn end_session(&mut self) {
        self.dispatch(Msg::SessionEnded);
        self.runner.cancel_all_timers();
    }
}
