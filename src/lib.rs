pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{LocalCourseStore, RemoteVerifier, TracingNotifier};
pub use crate::core::{
    engine::{ProgressEngine, ProgressPolicy},
    progression::{CompletionOutcome, SiblingPolicy},
    verification::{CheckTimings, DebouncedCheck},
};
pub use utils::error::{ProgressError, Result};
