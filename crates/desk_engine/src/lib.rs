//! Query desk engine: gateway I/O, timers and the single-worker coordinator.
mod coordinator;
mod gateway;
mod runner;
mod scheduler;
mod wire;

pub use coordinator::Coordinator;
pub use gateway::{GatewaySettings, JobGateway, ReqwestGateway};
pub use runner::EffectRunner;
pub use scheduler::{CancelHandle, ScheduledTask, Scheduler, TokioScheduler};
