use crate::domain::model::{Person, RequestParameters, StrategyId, User};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Durable string key/value storage for timing samples.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str)
        -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn people_endpoint(&self) -> &str;
    fn users_endpoint(&self) -> &str;
    fn default_parameters(&self) -> RequestParameters;
    fn settle_delay(&self) -> Duration;
    fn time_single_runs(&self) -> bool;
    fn storage_path(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
}

/// One way of fetching a page of people.
#[async_trait]
pub trait PeopleTransport: Send + Sync {
    fn strategy(&self) -> StrategyId;
    async fn fetch_people(&self, params: &RequestParameters) -> Result<Vec<Person>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn fetch_users(&self) -> Result<Vec<User>>;
}
