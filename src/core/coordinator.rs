use crate::core::fetcher::DualClientFetcher;
use crate::core::timing::TimingRecorder;
use crate::domain::model::{CoordinatorState, OperationMode, RequestParameters, StrategyId};
use crate::domain::ports::{KeyValueStore, UserDirectory};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Pause between the last transport settling and the busy flag clearing.
    pub settle_delay: Duration,
    /// Time strategy A / strategy B runs too, not only comparisons.
    pub time_single_runs: bool,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            time_single_runs: false,
        }
    }
}

/// Single point of control for "is an operation running".
///
/// At most one operation is in flight; a start request that arrives while busy is
/// dropped. Clones share the same state.
pub struct RequestCoordinator<S: KeyValueStore + 'static> {
    inner: Arc<Inner<S>>,
}

impl<S: KeyValueStore + 'static> Clone for RequestCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S: KeyValueStore> {
    fetcher: DualClientFetcher,
    directory: Arc<dyn UserDirectory>,
    recorder: TimingRecorder<S>,
    settings: CoordinatorSettings,
    state: Mutex<CoordinatorState>,
}

impl<S: KeyValueStore + 'static> RequestCoordinator<S> {
    pub fn new(
        fetcher: DualClientFetcher,
        directory: Arc<dyn UserDirectory>,
        recorder: TimingRecorder<S>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                directory,
                recorder,
                settings,
                state: Mutex::new(CoordinatorState::default()),
            }),
        }
    }

    /// Pulls the persisted timing samples into the state.
    pub async fn load_timings(&self) {
        let samples = self.inner.recorder.load_samples().await;
        let mut state = self.inner.lock_state();
        for sample in samples {
            state.timings.insert(sample.strategy, sample.duration_millis);
        }
    }

    pub fn snapshot(&self) -> CoordinatorState {
        self.inner.lock_state().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.inner.lock_state().is_busy
    }

    pub fn active_mode(&self) -> Option<OperationMode> {
        self.inner.lock_state().active_mode
    }

    /// Starts `mode` with its own copy of `params`.
    ///
    /// Returns `None` without touching any state when another operation is in flight.
    /// The returned handle resolves once the operation settled and the coordinator is
    /// idle again.
    pub fn start_operation(
        &self,
        mode: OperationMode,
        params: RequestParameters,
    ) -> Option<JoinHandle<()>> {
        {
            let mut state = self.inner.lock_state();
            if state.is_busy {
                tracing::debug!(
                    "Dropping {} request: {:?} is still running",
                    mode,
                    state.active_mode
                );
                return None;
            }
            state.begin(mode);
        }

        tracing::debug!("Starting {} operation with {:?}", mode, params);
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(inner.run(mode, params)))
    }
}

/// Returns the coordinator to idle when dropped, whether the operation finished or
/// its task unwound.
struct SettleGuard<S: KeyValueStore> {
    inner: Arc<Inner<S>>,
}

impl<S: KeyValueStore> Drop for SettleGuard<S> {
    fn drop(&mut self) {
        self.inner.lock_state().settle();
    }
}

impl<S: KeyValueStore> Inner<S> {
    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(self: Arc<Self>, mode: OperationMode, params: RequestParameters) {
        // busy until this guard drops, even if a transport panics
        let guard = SettleGuard {
            inner: Arc::clone(&self),
        };

        match mode {
            OperationMode::AuxiliaryFetch => self.run_directory().await,
            OperationMode::Comparison => {
                // both strategies in flight together, each merging on its own
                tokio::join!(
                    self.run_strategy(mode, StrategyId::Typed, &params, true),
                    self.run_strategy(mode, StrategyId::Raw, &params, true)
                );
            }
            OperationMode::StrategyA | OperationMode::StrategyB => {
                // timed only when configured
                for strategy in mode.strategies() {
                    self.run_strategy(mode, *strategy, &params, self.settings.time_single_runs)
                        .await;
                }
            }
        }

        // settle before accepting the next operation
        tokio::time::sleep(self.settings.settle_delay).await;
        drop(guard);
        tracing::debug!("{} operation settled", mode);
    }

    async fn run_strategy(
        &self,
        mode: OperationMode,
        strategy: StrategyId,
        params: &RequestParameters,
        timed: bool,
    ) {
        let fetch = self.fetcher.fetch(strategy, params);
        // a failed call is never measured, so the previous sample stays
        let outcome = if timed {
            self.recorder
                .measure(strategy, fetch)
                .await
                .map(|(people, elapsed)| (people, Some(elapsed)))
        } else {
            fetch.await.map(|people| (people, None))
        };

        match outcome {
            Ok((people, elapsed)) => {
                match elapsed {
                    Some(ms) => tracing::info!(
                        "✅ {} returned {} people in {} ms",
                        strategy,
                        people.len(),
                        ms
                    ),
                    None => tracing::info!("✅ {} returned {} people", strategy, people.len()),
                }

                let mut state = self.lock_state();
                if let Some(ms) = elapsed {
                    state.timings.insert(strategy, ms);
                }
                state.results_by_strategy.insert(strategy, people);
            }
            // slot was cleared when the operation began and stays empty
            Err(e) if e.is_transport_failure() => {
                tracing::error!("❌ Error in {} request ({}): {}", strategy, mode, e);
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ {} request ({}) failed before reaching the service: {}",
                    strategy,
                    mode,
                    e
                );
            }
        }
    }

    async fn run_directory(&self) {
        match self.directory.fetch_users().await {
            Ok(users) => {
                tracing::info!("✅ user directory returned {} users", users.len());
                self.lock_state().auxiliary_users = users;
            }
            Err(e) => tracing::error!("❌ Error in user directory request: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStore;
    use crate::domain::model::{Address, Person, User};
    use crate::domain::ports::PeopleTransport;
    use crate::utils::error::{AppError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    const SETTLE: Duration = Duration::from_millis(60);

    struct MockTransport {
        strategy: StrategyId,
        count: usize,
        delay: Duration,
        fail_with: Option<u16>,
        misconfigured: bool,
        calls: AtomicUsize,
        last_params: Mutex<Option<RequestParameters>>,
    }

    impl MockTransport {
        fn new(strategy: StrategyId, count: usize) -> Self {
            Self {
                strategy,
                count,
                delay: Duration::ZERO,
                fail_with: None,
                misconfigured: false,
                calls: AtomicUsize::new(0),
                last_params: Mutex::new(None),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn failing(mut self, status: u16) -> Self {
            self.fail_with = Some(status);
            self
        }

        fn misconfigured(mut self) -> Self {
            self.misconfigured = true;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PeopleTransport for MockTransport {
        fn strategy(&self) -> StrategyId {
            self.strategy
        }

        async fn fetch_people(&self, params: &RequestParameters) -> Result<Vec<Person>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_params.lock().unwrap() = Some(params.clone());
            tokio::time::sleep(self.delay).await;

            if self.misconfigured {
                return Err(AppError::ConfigError {
                    message: "no endpoint".to_string(),
                });
            }
            if let Some(status) = self.fail_with {
                return Err(AppError::HttpStatusError {
                    status,
                    status_text: "Internal Server Error".to_string(),
                });
            }

            Ok((0..self.count)
                .map(|i| Person(json!({"login": {"uuid": format!("{:?}-{}", self.strategy, i)}})))
                .collect())
        }
    }

    enum DirectoryBehaviour {
        Users(Vec<User>),
        Fail,
        Panic,
    }

    struct MockDirectory(DirectoryBehaviour);

    #[async_trait]
    impl UserDirectory for MockDirectory {
        async fn fetch_users(&self) -> Result<Vec<User>> {
            match &self.0 {
                DirectoryBehaviour::Users(users) => Ok(users.clone()),
                DirectoryBehaviour::Fail => Err(AppError::HttpStatusError {
                    status: 502,
                    status_text: "Bad Gateway".to_string(),
                }),
                DirectoryBehaviour::Panic => panic!("directory exploded"),
            }
        }
    }

    fn sample_user(id: u64) -> User {
        User {
            id,
            first_name: "Emily".to_string(),
            last_name: "Johnson".to_string(),
            email: "emily.johnson@x.dummyjson.com".to_string(),
            phone: "+81 965-431-3024".to_string(),
            image: "https://dummyjson.com/icon/emilys/128".to_string(),
            address: Address {
                country: "United States".to_string(),
            },
        }
    }

    struct Fixture {
        coordinator: RequestCoordinator<MemoryStore>,
        typed: Arc<MockTransport>,
        raw: Arc<MockTransport>,
        store: MemoryStore,
    }

    fn fixture_with(
        typed: MockTransport,
        raw: MockTransport,
        directory: DirectoryBehaviour,
        store: MemoryStore,
        time_single_runs: bool,
    ) -> Fixture {
        let typed = Arc::new(typed);
        let raw = Arc::new(raw);
        let fetcher = DualClientFetcher::new(typed.clone(), raw.clone());
        let coordinator = RequestCoordinator::new(
            fetcher,
            Arc::new(MockDirectory(directory)),
            TimingRecorder::new(Arc::new(store.clone())),
            CoordinatorSettings {
                settle_delay: SETTLE,
                time_single_runs,
            },
        );
        Fixture {
            coordinator,
            typed,
            raw,
            store,
        }
    }

    fn fixture(typed: MockTransport, raw: MockTransport) -> Fixture {
        fixture_with(
            typed,
            raw,
            DirectoryBehaviour::Users(vec![]),
            MemoryStore::new(),
            false,
        )
    }

    #[tokio::test]
    async fn test_comparison_fills_both_slots_and_records_timings() {
        let f = fixture(
            MockTransport::new(StrategyId::Typed, 12),
            MockTransport::new(StrategyId::Raw, 12),
        );

        let handle = f
            .coordinator
            .start_operation(OperationMode::Comparison, RequestParameters::default())
            .expect("idle coordinator accepts");
        assert!(f.coordinator.is_busy());
        assert_eq!(f.coordinator.active_mode(), Some(OperationMode::Comparison));

        handle.await.unwrap();

        let state = f.coordinator.snapshot();
        assert!(!state.is_busy);
        assert_eq!(state.active_mode, None);
        assert_eq!(state.people(StrategyId::Typed).len(), 12);
        assert_eq!(state.people(StrategyId::Raw).len(), 12);

        for strategy in StrategyId::ALL {
            let stored = f.store.get(strategy.storage_key()).await.unwrap().unwrap();
            let ms: f64 = stored.parse().unwrap();
            assert!(ms >= 0.0);
            assert_eq!(state.timing(strategy), ms);
        }
    }

    #[tokio::test]
    async fn test_start_while_busy_is_dropped() {
        let f = fixture(
            MockTransport::new(StrategyId::Typed, 3).with_delay(Duration::from_millis(50)),
            MockTransport::new(StrategyId::Raw, 3).with_delay(Duration::from_millis(50)),
        );

        let handle = f
            .coordinator
            .start_operation(OperationMode::StrategyA, RequestParameters::default())
            .unwrap();
        let before = f.coordinator.snapshot();

        for mode in [
            OperationMode::StrategyA,
            OperationMode::StrategyB,
            OperationMode::Comparison,
            OperationMode::AuxiliaryFetch,
        ] {
            assert!(f
                .coordinator
                .start_operation(mode, RequestParameters::with_country("FR"))
                .is_none());
            assert_eq!(f.coordinator.snapshot(), before);
        }

        handle.await.unwrap();
        assert_eq!(f.typed.calls(), 1);
        assert_eq!(f.raw.calls(), 0);
        assert_eq!(
            f.typed.last_params.lock().unwrap().as_ref().unwrap().country_code,
            "US"
        );
    }

    #[tokio::test]
    async fn test_busy_clears_only_after_settle_delay() {
        let transport_delay = Duration::from_millis(30);
        let f = fixture(
            MockTransport::new(StrategyId::Typed, 1).with_delay(transport_delay),
            MockTransport::new(StrategyId::Raw, 1),
        );

        let started = Instant::now();
        let handle = f
            .coordinator
            .start_operation(OperationMode::StrategyA, RequestParameters::default())
            .unwrap();

        // transport is done, settle delay still running
        tokio::time::sleep(transport_delay + Duration::from_millis(15)).await;
        let mid = f.coordinator.snapshot();
        assert_eq!(mid.people(StrategyId::Typed).len(), 1);
        assert!(mid.is_busy);

        handle.await.unwrap();
        assert!(started.elapsed() >= transport_delay + SETTLE);
        assert!(!f.coordinator.is_busy());

        // idle again, so the next start is accepted
        let next = f
            .coordinator
            .start_operation(OperationMode::StrategyB, RequestParameters::default());
        assert!(next.is_some());
        next.unwrap().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_strategy_does_not_abort_sibling() {
        let store = MemoryStore::with_entries([("fetchTime", "42.5")]);
        let f = fixture_with(
            MockTransport::new(StrategyId::Typed, 12),
            MockTransport::new(StrategyId::Raw, 12).failing(500),
            DirectoryBehaviour::Users(vec![]),
            store,
            false,
        );
        f.coordinator.load_timings().await;

        f.coordinator
            .start_operation(OperationMode::Comparison, RequestParameters::default())
            .unwrap()
            .await
            .unwrap();

        let state = f.coordinator.snapshot();
        assert!(!state.is_busy);
        assert_eq!(state.people(StrategyId::Typed).len(), 12);
        assert!(state.people(StrategyId::Raw).is_empty());
        assert_eq!(state.timing(StrategyId::Raw), 42.5);
        assert_eq!(
            f.store.get("fetchTime").await.unwrap().as_deref(),
            Some("42.5")
        );
        assert!(f.store.get("axiosTime").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_completions_merge_independently() {
        let f = fixture(
            MockTransport::new(StrategyId::Typed, 2).with_delay(Duration::from_millis(10)),
            MockTransport::new(StrategyId::Raw, 5).with_delay(Duration::from_millis(200)),
        );

        let handle = f
            .coordinator
            .start_operation(OperationMode::Comparison, RequestParameters::default())
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        let partial = f.coordinator.snapshot();
        assert!(partial.is_busy);
        assert_eq!(partial.people(StrategyId::Typed).len(), 2);
        assert!(partial.people(StrategyId::Raw).is_empty());
        assert!(partial.timing(StrategyId::Typed) > 0.0);

        handle.await.unwrap();
        let done = f.coordinator.snapshot();
        assert_eq!(done.people(StrategyId::Raw).len(), 5);
        assert!(done.timing(StrategyId::Raw) >= done.timing(StrategyId::Typed));
    }

    #[tokio::test]
    async fn test_single_runs_are_untimed_by_default() {
        let f = fixture(
            MockTransport::new(StrategyId::Typed, 4),
            MockTransport::new(StrategyId::Raw, 4),
        );

        f.coordinator
            .start_operation(OperationMode::StrategyB, RequestParameters::default())
            .unwrap()
            .await
            .unwrap();

        assert_eq!(f.coordinator.snapshot().people(StrategyId::Raw).len(), 4);
        assert_eq!(f.store.get("fetchTime").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_single_runs_timed_when_enabled() {
        let f = fixture_with(
            MockTransport::new(StrategyId::Typed, 4),
            MockTransport::new(StrategyId::Raw, 4),
            DirectoryBehaviour::Users(vec![]),
            MemoryStore::new(),
            true,
        );

        f.coordinator
            .start_operation(OperationMode::StrategyA, RequestParameters::default())
            .unwrap()
            .await
            .unwrap();

        assert!(f.store.get("axiosTime").await.unwrap().is_some());
        assert_eq!(f.store.get("fetchTime").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_single_strategy_clears_only_its_own_slot() {
        let f = fixture(
            MockTransport::new(StrategyId::Typed, 3),
            MockTransport::new(StrategyId::Raw, 0).failing(500),
        );

        f.coordinator
            .start_operation(OperationMode::StrategyA, RequestParameters::default())
            .unwrap()
            .await
            .unwrap();
        f.coordinator
            .start_operation(OperationMode::StrategyB, RequestParameters::default())
            .unwrap()
            .await
            .unwrap();

        let state = f.coordinator.snapshot();
        assert_eq!(state.people(StrategyId::Typed).len(), 3);
        assert!(state.people(StrategyId::Raw).is_empty());
    }

    #[tokio::test]
    async fn test_auxiliary_fetch_uses_its_own_slot() {
        let f = fixture_with(
            MockTransport::new(StrategyId::Typed, 3),
            MockTransport::new(StrategyId::Raw, 3),
            DirectoryBehaviour::Users(vec![sample_user(1), sample_user(2)]),
            MemoryStore::new(),
            false,
        );

        let handle = f
            .coordinator
            .start_operation(OperationMode::AuxiliaryFetch, RequestParameters::default())
            .unwrap();
        assert!(f
            .coordinator
            .start_operation(OperationMode::Comparison, RequestParameters::default())
            .is_none());
        handle.await.unwrap();

        let state = f.coordinator.snapshot();
        assert_eq!(state.auxiliary_users.len(), 2);
        assert!(state.results_by_strategy.is_empty());
        assert_eq!(f.typed.calls() + f.raw.calls(), 0);
        assert_eq!(f.store.get("axiosTime").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_auxiliary_failure_leaves_empty_slot() {
        let f = fixture_with(
            MockTransport::new(StrategyId::Typed, 0),
            MockTransport::new(StrategyId::Raw, 0),
            DirectoryBehaviour::Fail,
            MemoryStore::new(),
            false,
        );

        f.coordinator
            .start_operation(OperationMode::AuxiliaryFetch, RequestParameters::default())
            .unwrap()
            .await
            .unwrap();

        let state = f.coordinator.snapshot();
        assert!(state.auxiliary_users.is_empty());
        assert!(!state.is_busy);
    }

    #[tokio::test]
    async fn test_panicking_operation_still_returns_to_idle() {
        let f = fixture_with(
            MockTransport::new(StrategyId::Typed, 0),
            MockTransport::new(StrategyId::Raw, 0),
            DirectoryBehaviour::Panic,
            MemoryStore::new(),
            false,
        );

        let handle = f
            .coordinator
            .start_operation(OperationMode::AuxiliaryFetch, RequestParameters::default())
            .unwrap();
        assert!(handle.await.unwrap_err().is_panic());

        assert!(!f.coordinator.is_busy());
        assert_eq!(f.coordinator.active_mode(), None);
    }

    /// Log lines written while the guard returned by `capture_logs` is alive.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    #[tokio::test]
    async fn test_failure_log_level_follows_error_kind() {
        let (logs, _default) = capture_logs();
        let f = fixture(
            MockTransport::new(StrategyId::Typed, 0).failing(503),
            MockTransport::new(StrategyId::Raw, 0).misconfigured(),
        );

        f.coordinator
            .start_operation(OperationMode::Comparison, RequestParameters::default())
            .unwrap()
            .await
            .unwrap();

        let output = String::from_utf8_lossy(&logs.0.lock().unwrap()).to_string();
        let typed_line = output
            .lines()
            .find(|l| l.contains("Error in typed client request"))
            .expect("typed failure logged");
        assert!(typed_line.contains("ERROR"));
        assert!(typed_line.contains("503"));

        let raw_line = output
            .lines()
            .find(|l| l.contains("raw client request"))
            .expect("raw failure logged");
        assert!(raw_line.contains("WARN"));
        assert!(!f.coordinator.is_busy());
    }
}
