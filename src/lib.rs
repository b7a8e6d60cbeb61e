pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::storage::{FileStore, MemoryStore};
pub use crate::config::AppConfig;
pub use crate::core::{
    coordinator::{CoordinatorSettings, RequestCoordinator},
    fetcher::DualClientFetcher,
    timing::TimingRecorder,
    view::PresentationAdapter,
};
pub use crate::utils::error::{AppError, Result};
