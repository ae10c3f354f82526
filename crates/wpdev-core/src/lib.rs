//! Start orchestration for wpdev environments.
//!
//! This crate ties together configuration loading, change detection, and the
//! runtime collaborators into the `Orchestrator`, which drives the start cycle
//! described by the pure `StartState` machine. It also provides the bounded
//! retry primitive, the legacy-install check, generated-file handling, and
//! Ctrl-C handling.

pub mod files;
pub mod legacy;
pub mod orchestrator;
pub mod retry;
pub mod signal;
pub mod start;

pub use legacy::{check_legacy_install, FixedAnswer, LegacyOutcome, Prompt};
pub use orchestrator::{
    write_compose_project, Orchestrator, StartOptions, StartPolicy, StartReport,
};
pub use retry::{retry, RecordingSleeper, RetryPolicy, Sleeper, ThreadSleeper};
pub use signal::{install_signal_handler, shutdown_requested};
pub use start::{transition, Effect, Facts, StartState, Transition};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("config error: {0}")]
    Config(#[from] wpdev_schema::ConfigError),
    #[error("store error: {0}")]
    Store(#[from] wpdev_store::StoreError),
    #[error("runtime error: {0}")]
    Runtime(#[from] wpdev_runtime::RuntimeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("interrupted")]
    Interrupted,
    #[error("start step ran out of order: {0} is not available yet")]
    OutOfOrder(&'static str),
}

/// A start cycle that halted. Work done by earlier states is not rolled back.
#[derive(Debug, Error)]
#[error("start failed while {state}: {source}")]
pub struct StartFailure {
    pub state: StartState,
    #[source]
    pub source: CoreError,
}
