use crate::view_model::{AppViewModel, JobRowView};
use crate::{project, HistoryQuery, JobId, JobStore, PollLoop, PollSettings, PollState};

/// Page size used by history refreshes unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    pub poll: PollSettings,
    pub page_size: u64,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            poll: PollSettings::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HistoryState {
    pub(crate) query: HistoryQuery,
    pub(crate) offset: u64,
    pub(crate) limit: u64,
    pub(crate) next_seq: u64,
    /// Newest refresh whose page has been applied; older pages are discarded.
    pub(crate) applied_seq: u64,
}

impl HistoryState {
    fn new(limit: u64) -> Self {
        Self {
            query: HistoryQuery::default(),
            offset: 0,
            limit: limit.max(1),
            next_seq: 1,
            applied_seq: 0,
        }
    }
}

/// Everything the coordinator owns for one UI session.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) store: JobStore,
    pub(crate) poll: PollLoop,
    pub(crate) history: HistoryState,
    pub(crate) pending_delete: Option<JobId>,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_settings(CoordinatorSettings::default())
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: CoordinatorSettings) -> Self {
        Self {
            store: JobStore::new(),
            poll: PollLoop::new(settings.poll),
            history: HistoryState::new(settings.page_size),
            pending_delete: None,
            dirty: false,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    pub fn poll_state(&self) -> PollState {
        self.poll.state()
    }

    pub fn watching(&self) -> Option<JobId> {
        self.poll.watching()
    }

    pub fn pending_delete(&self) -> Option<JobId> {
        self.pending_delete
    }

    pub fn history_query(&self) -> &HistoryQuery {
        &self.history.query
    }

    pub fn view(&self) -> AppViewModel {
        let focused_id = self.store.focused_job().map(|job| job.id);
        let watching = self.poll.watching();
        let rows = project(self.store.jobs(), &self.history.query)
            .into_iter()
            .map(|job| JobRowView {
                job_id: job.id,
                request_text: job.request_text.clone(),
                kind: job.kind,
                ticker: job.ticker.clone(),
                state: job.state,
                created_at: job.created_at,
                focused: focused_id == Some(job.id),
                watched: watching == Some(job.id),
            })
            .collect();

        AppViewModel {
            rows,
            job_count: self.store.jobs().len(),
            total: self.store.total(),
            page_offset: self.history.offset,
            page_limit: self.history.limit,
            focused_job: self.store.focused_job().cloned(),
            comparison: self.store.comparison().cloned(),
            is_busy: self.store.is_busy(),
            last_error: self.store.last_error().map(str::to_string),
            watching,
            pending_delete: self.pending_delete,
            search: self.history.query.search.clone(),
            sort: self.history.query.sort,
        }
    }

    /// Returns whether a re-render is due and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let store_dirty = self.store.consume_dirty();
        let own_dirty = std::mem::take(&mut self.dirty);
        store_dirty || own_dirty
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
