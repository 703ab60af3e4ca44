//! Query desk core: job model, job store and the pure coordinator state machine.
mod effect;
mod error;
mod history;
mod job;
mod msg;
mod poll;
mod projection;
mod request;
mod state;
mod store;
mod submission;
mod update;
mod view_model;

pub use effect::{Effect, RefreshOrigin};
pub use error::{GatewayError, ValidationError};
pub use job::{ComparisonResult, Job, JobId, JobKind, JobPage, JobPatch, JobState};
pub use msg::Msg;
pub use poll::{PollLoop, PollSettings, PollState, TimerId, DEFAULT_POLL_INTERVAL};
pub use projection::{project, HistoryQuery, SortOrder};
pub use request::{
    AnalysisRequest, ComparisonDraft, ComparisonRequest, JobDraft, DEFAULT_COMPARISON_PERIOD,
    MAX_COMPARISON_TICKERS, MAX_REQUEST_CHARS, MIN_COMPARISON_TICKERS,
};
pub use state::{AppState, CoordinatorSettings, DEFAULT_PAGE_SIZE};
pub use store::JobStore;
pub use update::update;
pub use view_model::{AppViewModel, JobRowView};
