//! Single-job watch: periodic status checks against the most recently
//! submitted job until it reaches a terminal state.
use std::time::Duration;

use desk_logging::{desk_debug, desk_info, desk_trace, desk_warn};

use crate::{history, AppState, Effect, GatewayError, Job, JobId, JobPatch};

/// Identifies one scheduled tick. Allocated by the core, never reused.
pub type TimerId = u64;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` keeps retrying until a terminal state or supersession.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_failures: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    /// `timer` names the current tick. `in_flight` is set from the moment it
    /// fires until its status check answers; no timer is pending meanwhile.
    Watching {
        job_id: JobId,
        timer: TimerId,
        in_flight: bool,
    },
}

/// What a status-check answer meant for the watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    /// Answer belongs to a superseded watch or tick.
    Stale,
    Rescheduled(Effect),
    Finished,
    GaveUp { failures: u32 },
}

/// At most one watch exists at any time; arming always tears the previous one
/// down first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollLoop {
    settings: PollSettings,
    state: PollState,
    next_timer: TimerId,
    consecutive_failures: u32,
}

impl Default for PollLoop {
    fn default() -> Self {
        Self::new(PollSettings::default())
    }
}

impl PollLoop {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            state: PollState::Idle,
            next_timer: 1,
            consecutive_failures: 0,
        }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn watching(&self) -> Option<JobId> {
        match self.state {
            PollState::Watching { job_id, .. } => Some(job_id),
            PollState::Idle => None,
        }
    }

    /// The timer the runner should currently be holding, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        match self.state {
            PollState::Watching {
                timer,
                in_flight: false,
                ..
            } => Some(timer),
            _ => None,
        }
    }

    /// Starts watching `job_id`, cancelling any previous watch first.
    pub fn arm(&mut self, job_id: JobId) -> Vec<Effect> {
        let mut effects = self.disarm();
        let timer = self.allocate_timer();
        self.state = PollState::Watching {
            job_id,
            timer,
            in_flight: false,
        };
        effects.push(Effect::ScheduleTick {
            timer,
            after: self.settings.interval,
        });
        effects
    }

    /// Stops watching. Idempotent.
    pub fn disarm(&mut self) -> Vec<Effect> {
        self.consecutive_failures = 0;
        match std::mem::take(&mut self.state) {
            PollState::Watching {
                timer,
                in_flight: false,
                ..
            } => vec![Effect::CancelTick { timer }],
            _ => Vec::new(),
        }
    }

    /// A timer fired. Returns the status check to issue, or `None` when the
    /// timer is not the current one.
    pub(crate) fn tick_due(&mut self, fired: TimerId) -> Option<Effect> {
        match &mut self.state {
            PollState::Watching {
                job_id,
                timer,
                in_flight,
            } if *timer == fired && !*in_flight => {
                *in_flight = true;
                Some(Effect::PollJob {
                    job_id: *job_id,
                    timer: fired,
                })
            }
            _ => None,
        }
    }

    pub(crate) fn fetch_answered(
        &mut self,
        timer: TimerId,
        result: &Result<Job, GatewayError>,
    ) -> TickOutcome {
        let is_current = matches!(
            self.state,
            PollState::Watching { timer: current, in_flight: true, .. } if current == timer
        );
        if !is_current {
            return TickOutcome::Stale;
        }

        match result {
            Ok(job) if job.is_terminal() => {
                self.state = PollState::Idle;
                self.consecutive_failures = 0;
                TickOutcome::Finished
            }
            Ok(_) => {
                self.consecutive_failures = 0;
                TickOutcome::Rescheduled(self.schedule_next())
            }
            Err(_) => {
                self.consecutive_failures += 1;
                let failures = self.consecutive_failures;
                if self
                    .settings
                    .max_consecutive_failures
                    .is_some_and(|max| failures >= max)
                {
                    self.state = PollState::Idle;
                    self.consecutive_failures = 0;
                    return TickOutcome::GaveUp { failures };
                }
                TickOutcome::Rescheduled(self.schedule_next())
            }
        }
    }

    fn schedule_next(&mut self) -> Effect {
        let next = self.allocate_timer();
        if let PollState::Watching {
            timer, in_flight, ..
        } = &mut self.state
        {
            *timer = next;
            *in_flight = false;
        }
        Effect::ScheduleTick {
            timer: next,
            after: self.settings.interval,
        }
    }

    fn allocate_timer(&mut self) -> TimerId {
        let timer = self.next_timer;
        self.next_timer += 1;
        timer
    }
}

pub(crate) fn on_tick_due(state: &mut AppState, timer: TimerId) -> Vec<Effect> {
    match state.poll.tick_due(timer) {
        Some(effect) => vec![effect],
        None => {
            desk_trace!("ignoring stale poll timer {}", timer);
            Vec::new()
        }
    }
}

pub(crate) fn on_poll_fetched(
    state: &mut AppState,
    job_id: JobId,
    timer: TimerId,
    result: Result<Job, GatewayError>,
) -> Vec<Effect> {
    // Late answers from a superseded watch still refresh their own row.
    if let Ok(job) = &result {
        state.store.patch_job(job_id, &JobPatch::from(job));
    }

    match state.poll.fetch_answered(timer, &result) {
        TickOutcome::Stale => Vec::new(),
        TickOutcome::Rescheduled(next) => {
            if let Err(err) = &result {
                desk_debug!("status check for job {} failed, retrying: {}", job_id, err);
            }
            vec![next]
        }
        TickOutcome::Finished => {
            if let Ok(job) = &result {
                desk_info!("job {} is {}; watch disarmed", job_id, job.state);
            }
            history::refresh_first_page(state)
        }
        TickOutcome::GaveUp { failures } => {
            desk_warn!(
                "giving up on job {} after {} failed status checks",
                job_id,
                failures
            );
            state.store.set_error(format!(
                "Stopped checking job {job_id} after {failures} failed status checks"
            ));
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobKind, JobState};
    use chrono::Utc;

    fn job(id: JobId, state: JobState) -> Job {
        let mut job = Job::pending(id, "q", JobKind::General, None, Utc::now());
        job.state = state;
        job
    }

    #[test]
    fn arm_schedules_first_tick_after_interval() {
        let mut poll = PollLoop::default();
        let effects = poll.arm(7);
        assert_eq!(
            effects,
            vec![Effect::ScheduleTick {
                timer: 1,
                after: DEFAULT_POLL_INTERVAL
            }]
        );
        assert_eq!(poll.watching(), Some(7));
        assert_eq!(poll.pending_timer(), Some(1));
    }

    #[test]
    fn rearm_cancels_previous_timer_first() {
        let mut poll = PollLoop::default();
        poll.arm(1);
        let effects = poll.arm(2);
        assert_eq!(
            effects,
            vec![
                Effect::CancelTick { timer: 1 },
                Effect::ScheduleTick {
                    timer: 2,
                    after: DEFAULT_POLL_INTERVAL
                },
            ]
        );
        assert_eq!(poll.watching(), Some(2));
    }

    #[test]
    fn rearm_during_in_flight_check_has_nothing_to_cancel() {
        let mut poll = PollLoop::default();
        poll.arm(1);
        assert!(poll.tick_due(1).is_some());
        let effects = poll.arm(2);
        assert_eq!(effects.len(), 1);
        assert_eq!(
            poll.fetch_answered(1, &Ok(job(1, JobState::Completed))),
            TickOutcome::Stale
        );
        assert_eq!(poll.watching(), Some(2));
    }

    #[test]
    fn stale_timer_is_ignored() {
        let mut poll = PollLoop::default();
        poll.arm(1);
        poll.arm(2);
        assert_eq!(poll.tick_due(1), None);
        assert_eq!(
            poll.tick_due(2),
            Some(Effect::PollJob { job_id: 2, timer: 2 })
        );
        // A second firing of the same timer does not issue a second check.
        assert_eq!(poll.tick_due(2), None);
    }

    #[test]
    fn failures_keep_watching_without_ceiling() {
        let mut poll = PollLoop::default();
        poll.arm(3);
        let mut timer = 1;
        for _ in 0..50 {
            poll.tick_due(timer).unwrap();
            let outcome = poll.fetch_answered(timer, &Err(GatewayError::NotFound("gone".into())));
            match outcome {
                TickOutcome::Rescheduled(Effect::ScheduleTick { timer: next, .. }) => timer = next,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(poll.watching(), Some(3));
    }

    #[test]
    fn failure_ceiling_disarms() {
        let mut poll = PollLoop::new(PollSettings {
            interval: Duration::from_millis(10),
            max_consecutive_failures: Some(2),
        });
        poll.arm(3);
        poll.tick_due(1).unwrap();
        let err = Err(GatewayError::Transport("down".into()));
        assert!(matches!(
            poll.fetch_answered(1, &err),
            TickOutcome::Rescheduled(_)
        ));
        poll.tick_due(2).unwrap();
        assert_eq!(
            poll.fetch_answered(2, &err),
            TickOutcome::GaveUp { failures: 2 }
        );
        assert_eq!(poll.state(), PollState::Idle);
    }

    #[test]
    fn disarm_is_idempotent() {
        let mut poll = PollLoop::default();
        poll.arm(1);
        assert_eq!(poll.disarm(), vec![Effect::CancelTick { timer: 1 }]);
        assert!(poll.disarm().is_empty());
        assert_eq!(poll.state(), PollState::Idle);
    }
}
