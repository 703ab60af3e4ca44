use std::collections::HashMap;
use std::future::Future;
use std::sync::{mpsc, Arc};

use desk_core::{Effect, Msg, TimerId};
use desk_logging::{desk_debug, desk_trace};
use tokio::runtime::Handle;

use crate::{CancelHandle, JobGateway, Scheduler};

/// Executes effects: gateway calls run on the runtime and report back as messages,
/// timers go through the scheduler.
pub struct EffectRunner {
    gateway: Arc<dyn JobGateway>,
    scheduler: Arc<dyn Scheduler>,
    handle: Handle,
    msg_tx: mpsc::Sender<Msg>,
    timers: HashMap<TimerId, CancelHandle>,
}

impl EffectRunner {
    pub fn new(
        gateway: Arc<dyn JobGateway>,
        scheduler: Arc<dyn Scheduler>,
        handle: Handle,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        Self {
            gateway,
            scheduler,
            handle,
            msg_tx,
            timers: HashMap::new(),
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.run_one(effect);
        }
    }

    /// Timers that are scheduled and not yet fired or cancelled.
    pub fn live_timers(&self) -> Vec<TimerId> {
        let mut timers = self.timers.keys().copied().collect::<Vec<_>>();
        timers.sort_unstable();
        timers
    }

    /// Forgets a timer whose tick has been delivered.
    pub fn timer_fired(&mut self, timer: TimerId) {
        self.timers.remove(&timer);
    }

    pub fn cancel_all_timers(&mut self) {
        for (timer, handle) in self.timers.drain() {
            desk_trace!("cancelling timer {timer}");
            handle.cancel();
        }
    }

    fn run_one(&mut self, effect: Effect) {
        let gateway = self.gateway.clone();
        match effect {
            Effect::SubmitJob(request) => self.spawn(async move {
                Msg::SubmitCompleted(gateway.submit(&request).await)
            }),
            Effect::FetchHistory {
                seq,
                offset,
                limit,
                origin,
            } => self.spawn(async move {
                Msg::HistoryLoaded {
                    seq,
                    origin,
                    result: gateway.fetch_all(offset, limit).await,
                }
            }),
            Effect::FetchJob { job_id } => self.spawn(async move {
                Msg::JobFetched {
                    job_id,
                    result: gateway.fetch_one(job_id).await,
                }
            }),
            Effect::PollJob { job_id, timer } => self.spawn(async move {
                Msg::PollFetched {
                    job_id,
                    timer,
                    result: gateway.fetch_one(job_id).await,
                }
            }),
            Effect::RemoveJob { job_id } => self.spawn(async move {
                Msg::DeleteCompleted {
                    job_id,
                    result: gateway.remove(job_id).await,
                }
            }),
            Effect::CompareTickers(request) => self.spawn(async move {
                Msg::CompareCompleted(gateway.compare(&request).await)
            }),
            Effect::ScheduleTick { timer, after } => {
                let msg_tx = self.msg_tx.clone();
                let handle = self.scheduler.schedule_after(
                    after,
                    Box::new(move || {
                        let _ = msg_tx.send(Msg::PollTickDue { timer });
                    }),
                );
                if let Some(previous) = self.timers.insert(timer, handle) {
                    previous.cancel();
                }
            }
            Effect::CancelTick { timer } => match self.timers.remove(&timer) {
                Some(handle) => handle.cancel(),
                None => desk_debug!("cancel for unknown timer {timer}"),
            },
        }
    }

    fn spawn<F>(&self, call: F)
    where
        F: Future<Output = Msg> + Send + 'static,
    {
        let msg_tx = self.msg_tx.clone();
        self.handle.spawn(async move {
            let _ = msg_tx.send(call.await);
        });
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.cancel_all_timers();
    }
}
