use crate::domain::model::{StrategyId, TimingSample};
use crate::domain::ports::KeyValueStore;
use crate::utils::error::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Milliseconds rounded to two decimals.
pub fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn parse_sample(raw: Option<&str>) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// Times transport calls and keeps the latest successful duration per strategy.
pub struct TimingRecorder<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> TimingRecorder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Runs `operation` and, if it succeeds, persists and returns its duration.
    /// A failed operation writes nothing and its error is returned as is.
    pub async fn measure<T, F>(&self, strategy: StrategyId, operation: F) -> Result<(T, f64)>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let value = operation.await?;
        let elapsed = round_millis(start.elapsed());

        match self
            .store
            .set(strategy.storage_key(), &elapsed.to_string())
            .await
        {
            Ok(()) => tracing::debug!("⏱️ {} took {} ms", strategy, elapsed),
            Err(e) => tracing::warn!(
                "Could not persist {} timing ({} ms): {}",
                strategy,
                elapsed,
                e
            ),
        }

        Ok((value, elapsed))
    }

    /// Last persisted duration, 0 when missing or unreadable.
    pub async fn latest(&self, strategy: StrategyId) -> f64 {
        match self.store.get(strategy.storage_key()).await {
            Ok(raw) => parse_sample(raw.as_deref()),
            Err(e) => {
                tracing::warn!("Could not read {} timing: {}", strategy, e);
                0.0
            }
        }
    }

    pub async fn load_samples(&self) -> Vec<TimingSample> {
        let mut samples = Vec::with_capacity(StrategyId::ALL.len());
        for strategy in StrategyId::ALL {
            samples.push(TimingSample {
                strategy,
                duration_millis: self.latest(strategy).await,
            });
        }
        samples
    }
}
