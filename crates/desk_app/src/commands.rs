use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use desk_core::{AppState, ComparisonDraft, JobDraft, JobId, Msg, SortOrder};
use desk_engine::{Coordinator, JobGateway, ReqwestGateway, TokioScheduler};
use desk_logging::{desk_info, desk_warn};
use tokio::runtime::Runtime;

use crate::config::DeskConfig;
use crate::render;

/// Upper bound for a single request/answer round trip driven from the CLI.
const ROUND_TRIP: Duration = Duration::from_secs(60);

/// One CLI invocation. Field order matters: the runtime is dropped last.
pub struct Session {
    coordinator: Coordinator,
    gateway: Arc<ReqwestGateway>,
    runtime: Runtime,
}

impl Session {
    pub fn start(config: &DeskConfig) -> Result<Self> {
        let runtime = Runtime::new().context("failed to start async runtime")?;
        let gateway = Arc::new(
            ReqwestGateway::new(config.gateway_settings())
                .map_err(|err| anyhow!(err.user_message()))?,
        );
        desk_info!("using analysis service at {}", gateway.base_url());

        let coordinator = Coordinator::new(
            AppState::with_settings(config.coordinator_settings()),
            gateway.clone(),
            Arc::new(TokioScheduler::new(runtime.handle().clone())),
            runtime.handle().clone(),
        );
        Ok(Self {
            coordinator,
            gateway,
            runtime,
        })
    }

    fn take_error(&mut self) -> Result<()> {
        let error = self.coordinator.view().last_error;
        match error {
            Some(message) => {
                self.coordinator.dispatch(Msg::ErrorDismissed);
                bail!(message)
            }
            None => Ok(()),
        }
    }

    fn wait_until<F>(&mut self, timeout: Duration, what: &str, done: F) -> Result<()>
    where
        F: Fn(&AppState) -> bool,
    {
        if self.coordinator.run_until(timeout, done) {
            Ok(())
        } else {
            bail!("timed out waiting for {what}")
        }
    }

    pub fn ask(&mut self, draft: JobDraft, wait: bool, timeout: Duration) -> Result<String> {
        self.coordinator.submit_job(draft);
        self.wait_until(ROUND_TRIP, "the submission", |s| {
            s.store().focused_job().is_some() || s.store().last_error().is_some()
        })?;
        self.take_error()?;

        let job_id = self
            .coordinator
            .state()
            .store()
            .focused_job()
            .map(|job| job.id)
            .ok_or_else(|| anyhow!("the service did not return a job"))?;
        if !wait {
            return Ok(format!("Submitted job #{job_id}\n"));
        }

        let finished = self.coordinator.run_until(timeout, |s| {
            s.watching().is_none() || s.store().last_error().is_some()
        });
        self.take_error()?;
        if !finished {
            desk_warn!("job {job_id} still pending after {timeout:?}");
        }

        let job = self
            .coordinator
            .state()
            .store()
            .find(job_id)
            .cloned()
            .ok_or_else(|| anyhow!("job #{job_id} disappeared"))?;
        Ok(render::render_job(&job))
    }

    pub fn history(&mut self, page: u64, search: Option<String>, sort: SortOrder) -> Result<String> {
        let limit = self.coordinator.view().page_limit;
        self.coordinator.dispatch(Msg::SortChanged(sort));
        if let Some(search) = search {
            self.coordinator.dispatch(Msg::SearchChanged(search));
        }
        self.coordinator
            .request_page(page.saturating_sub(1).saturating_mul(limit));
        self.wait_until(ROUND_TRIP, "the history page", |s| !s.store().is_busy())?;
        self.take_error()?;
        Ok(render::render_history(&self.coordinator.view()))
    }

    pub fn show(&mut self, job_id: JobId) -> Result<String> {
        let job = self
            .runtime
            .block_on(self.gateway.fetch_one(job_id))
            .map_err(|err| anyhow!(err.user_message()))?;
        Ok(render::render_job(&job))
    }

    pub fn delete(&mut self, job_id: JobId, confirmed: bool) -> Result<String> {
        self.coordinator.request_delete(job_id);
        if !(confirmed || confirm(&format!("Delete job #{job_id}?"))?) {
            self.coordinator.cancel_delete();
            return Ok("Cancelled.\n".to_string());
        }

        self.coordinator.confirm_delete();
        if !self.coordinator.wait_next(ROUND_TRIP) {
            bail!("timed out waiting for the delete");
        }
        self.take_error()?;
        Ok(format!("Deleted job #{job_id}\n"))
    }

    pub fn compare(&mut self, tickers: Vec<String>, period: Option<String>) -> Result<String> {
        let mut draft = ComparisonDraft::new(tickers);
        if let Some(period) = period {
            draft = draft.with_period(period);
        }
        self.coordinator.compare(draft);
        self.wait_until(ROUND_TRIP, "the comparison", |s| !s.store().is_busy())?;
        self.take_error()?;

        let view = self.coordinator.view();
        let comparison = view
            .comparison
            .ok_or_else(|| anyhow!("the service returned no comparison"))?;
        Ok(render::render_comparison(&comparison))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.coordinator.end_session();
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
