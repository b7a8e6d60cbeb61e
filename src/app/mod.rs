pub mod session;

use crate::adapters::http::{build_client, DirectoryClient};
use crate::adapters::storage::FileStore;
use crate::core::coordinator::{CoordinatorSettings, RequestCoordinator};
use crate::core::fetcher::DualClientFetcher;
use crate::core::timing::TimingRecorder;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use std::sync::Arc;

/// Wires transports, the timing store and the coordinator from resolved settings, and
/// loads the persisted timing samples.
pub async fn build_coordinator<C: ConfigProvider>(
    config: &C,
) -> Result<RequestCoordinator<FileStore>> {
    let timeout = config.request_timeout();

    // transports: each strategy gets its own connection pool so neither warms up the other
    let fetcher = DualClientFetcher::for_endpoint(
        config.people_endpoint(),
        build_client(timeout)?,
        build_client(timeout)?,
    );
    // auxiliary directory
    let directory = Arc::new(DirectoryClient::with_client(
        build_client(timeout)?,
        config.users_endpoint(),
    ));

    // timing store
    let store = Arc::new(FileStore::new(config.storage_path()));
    let store_path = store.path().display().to_string();

    let coordinator = RequestCoordinator::new(
        fetcher,
        directory,
        TimingRecorder::new(store),
        CoordinatorSettings {
            settle_delay: config.settle_delay(),
            time_single_runs: config.time_single_runs(),
        },
    );

    // restore samples from earlier sessions
    coordinator.load_timings().await;

    tracing::debug!(
        "Coordinator ready (people: {}, users: {}, store: {})",
        config.people_endpoint(),
        config.users_endpoint(),
        store_path
    );
    Ok(coordinator)
}
