use crate::{ComparisonResult, Job, JobId, JobPatch};

/// Canonical client-side view of the user's jobs and the result slot.
///
/// Pure state and mutation rules; no I/O. Every operation leaves at most one of
/// `focused_job` and `comparison` populated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobStore {
    /// Newest first, unique by id.
    jobs: Vec<Job>,
    total: u64,
    focused_job: Option<Job>,
    comparison: Option<ComparisonResult>,
    submitting: bool,
    comparing: bool,
    refreshes_in_flight: u32,
    last_error: Option<String>,
    dirty: bool,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn focused_job(&self) -> Option<&Job> {
        self.focused_job.as_ref()
    }

    pub fn comparison(&self) -> Option<&ComparisonResult> {
        self.comparison.as_ref()
    }

    /// True while a submission, a comparison or any list refresh is outstanding.
    pub fn is_busy(&self) -> bool {
        self.submitting || self.comparing || self.refreshes_in_flight > 0
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn find(&self, id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    pub fn begin_submission(&mut self) {
        self.submitting = true;
        self.last_error = None;
        self.mark_dirty();
    }

    pub fn submission_succeeded(&mut self, job: Job) {
        self.submitting = false;
        self.comparison = None;
        let already_listed = self.jobs.iter().any(|existing| existing.id == job.id);
        self.jobs.retain(|existing| existing.id != job.id);
        if !already_listed {
            self.total += 1;
        }
        self.jobs.insert(0, job.clone());
        self.focused_job = Some(job);
        self.mark_dirty();
    }

    pub fn submission_failed(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.last_error = Some(message.into());
        self.mark_dirty();
    }

    pub fn begin_comparison(&mut self) {
        self.comparing = true;
        self.last_error = None;
        self.mark_dirty();
    }

    pub fn comparison_succeeded(&mut self, payload: ComparisonResult) {
        self.comparing = false;
        self.focus_comparison(payload);
    }

    pub fn comparison_failed(&mut self, message: impl Into<String>) {
        self.comparing = false;
        self.last_error = Some(message.into());
        self.mark_dirty();
    }

    pub fn begin_refresh(&mut self) {
        self.refreshes_in_flight += 1;
        self.mark_dirty();
    }

    pub fn refresh_finished(&mut self) {
        self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);
        self.mark_dirty();
    }

    /// Replaces the list wholesale; the focused job and comparison are untouched.
    ///
    /// A row the store already knows as terminal is kept when the incoming copy
    /// still reports it pending.
    pub fn replace_list(&mut self, items: Vec<Job>, total: u64) {
        let mut next: Vec<Job> = Vec::with_capacity(items.len());
        for mut incoming in items {
            if next.iter().any(|job| job.id == incoming.id) {
                continue;
            }
            if let Some(known) = self.find(incoming.id) {
                if known.is_terminal() && !incoming.is_terminal() {
                    incoming = known.clone();
                }
            }
            next.push(incoming);
        }
        self.jobs = next;
        self.total = total.max(self.jobs.len() as u64);
        self.mark_dirty();
    }

    /// Merges `patch` into the row with `id`, and into the focused job when it
    /// has the same id. The focused job is patched even when the current page
    /// does not list it.
    ///
    /// No row is inserted for an unlisted id: a poll answer landing after a
    /// delete must not resurrect the row. Returns whether anything changed.
    pub fn patch_job(&mut self, id: JobId, patch: &JobPatch) -> bool {
        let mut changed = false;
        if let Some(row) = self.jobs.iter_mut().find(|job| job.id == id) {
            changed |= row.apply_patch(patch);
        }
        if let Some(focused) = self.focused_job.as_mut().filter(|job| job.id == id) {
            changed |= focused.apply_patch(patch);
        }
        if changed {
            self.mark_dirty();
        }
        changed
    }

    pub fn focus(&mut self, job: Job) {
        self.focused_job = Some(job);
        self.comparison = None;
        self.mark_dirty();
    }

    pub fn focus_comparison(&mut self, payload: ComparisonResult) {
        self.comparison = Some(payload);
        self.focused_job = None;
        self.mark_dirty();
    }

    pub fn clear_focus(&mut self) {
        self.focused_job = None;
        self.comparison = None;
        self.mark_dirty();
    }

    /// Drops the row after a confirmed server-side delete.
    pub fn remove_job(&mut self, id: JobId) {
        self.jobs.retain(|job| job.id != id);
        self.total = self.total.saturating_sub(1);
        if self.focused_job.as_ref().is_some_and(|job| job.id == id) {
            self.focused_job = None;
        }
        self.mark_dirty();
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
        self.mark_dirty();
    }

    pub fn clear_error(&mut self) {
        if self.last_error.take().is_some() {
            self.mark_dirty();
        }
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobKind, JobState};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn job(id: JobId) -> Job {
        Job::pending(
            id,
            format!("query {id}"),
            JobKind::General,
            None,
            Utc.timestamp_opt(id as i64 * 60, 0).unwrap(),
        )
    }

    fn comparison() -> ComparisonResult {
        ComparisonResult {
            tickers: vec!["AAPL".into(), "MSFT".into()],
            period: "6mo".into(),
            payload: json!({"comparison": []}),
        }
    }

    #[test]
    fn submission_success_prepends_and_focuses() {
        let mut store = JobStore::new();
        store.replace_list(vec![job(1)], 1);
        store.focus_comparison(comparison());

        store.begin_submission();
        assert!(store.is_busy());
        store.submission_succeeded(job(2));

        assert!(!store.is_busy());
        assert_eq!(store.jobs().iter().map(|j| j.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(store.total(), 2);
        assert_eq!(store.focused_job().map(|j| j.id), Some(2));
        assert!(store.comparison().is_none());
    }

    #[test]
    fn begin_submission_clears_previous_error() {
        let mut store = JobStore::new();
        store.submission_failed("nope");
        assert_eq!(store.last_error(), Some("nope"));
        store.begin_submission();
        assert_eq!(store.last_error(), None);
    }

    #[test]
    fn patch_for_unknown_id_is_a_no_op() {
        let mut store = JobStore::new();
        store.replace_list(vec![job(1)], 1);
        store.consume_dirty();

        let patch = JobPatch::completed(json!({}), Utc::now());
        assert!(!store.patch_job(9, &patch));
        assert!(!store.consume_dirty());
        assert_eq!(store.jobs()[0].state, JobState::Pending);
    }

    #[test]
    fn patch_reaches_focused_copy_only_for_same_id() {
        let mut store = JobStore::new();
        store.replace_list(vec![job(2), job(1)], 2);
        store.focus(job(2));

        store.patch_job(1, &JobPatch::failed("bad ticker", Utc::now()));
        assert_eq!(store.find(1).unwrap().state, JobState::Failed);
        assert_eq!(store.focused_job().unwrap().state, JobState::Pending);

        store.patch_job(2, &JobPatch::completed(json!({"ok": true}), Utc::now()));
        assert_eq!(store.focused_job().unwrap().state, JobState::Completed);
    }

    #[test]
    fn patch_reaches_focused_job_missing_from_the_list() {
        let mut store = JobStore::new();
        store.focus(job(4));
        store.replace_list(vec![job(1)], 1);
        store.consume_dirty();

        assert!(store.patch_job(4, &JobPatch::completed(json!("done"), Utc::now())));
        assert!(store.consume_dirty());
        assert_eq!(store.focused_job().unwrap().state, JobState::Completed);
        assert!(store.find(4).is_none());
    }

    #[test]
    fn replace_list_keeps_known_terminal_rows() {
        let mut store = JobStore::new();
        store.replace_list(vec![job(1)], 1);
        store.patch_job(1, &JobPatch::completed(json!("done"), Utc::now()));

        store.replace_list(vec![job(3), job(1)], 7);
        assert_eq!(store.total(), 7);
        assert_eq!(store.find(1).unwrap().state, JobState::Completed);
        assert_eq!(store.find(3).unwrap().state, JobState::Pending);
    }

    #[test]
    fn replace_list_leaves_focus_alone() {
        let mut store = JobStore::new();
        store.focus(job(5));
        store.replace_list(Vec::new(), 0);
        assert_eq!(store.focused_job().map(|j| j.id), Some(5));
    }

    #[test]
    fn remove_clears_focus_and_decrements_total() {
        let mut store = JobStore::new();
        store.replace_list(vec![job(2), job(1)], 2);
        store.focus(job(1));

        store.remove_job(1);
        assert!(store.find(1).is_none());
        assert!(store.focused_job().is_none());
        assert_eq!(store.total(), 1);
    }

    #[test]
    fn refresh_counter_drives_busy_flag() {
        let mut store = JobStore::new();
        store.begin_refresh();
        store.begin_refresh();
        store.refresh_finished();
        assert!(store.is_busy());
        store.refresh_finished();
        store.refresh_finished();
        assert!(!store.is_busy());
    }
}
