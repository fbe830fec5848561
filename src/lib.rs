pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod execution;
pub mod jobs;
pub mod orchestrator;
pub mod output;
pub mod workspace;

pub use crate::config::BuildConfig;
pub use crate::core::{BuildOutcome, HostPlatform, RunSummary, Target};
pub use crate::execution::{Invocation, ProcessInvoker, StreamMode, ToolInvoker};
pub use crate::orchestrator::{BuildReporter, Orchestrator, RunReport};
