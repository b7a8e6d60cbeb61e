use crate::domain::model::{PeoplePage, Person, RequestParameters, StrategyId, User, UserPage};
use crate::domain::ports::{PeopleTransport, UserDirectory};
use crate::utils::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Strategy A: lets the client raise status errors and decode the body.
pub struct TypedTransport {
    client: Client,
    endpoint: String,
}

impl TypedTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PeopleTransport for TypedTransport {
    fn strategy(&self) -> StrategyId {
        StrategyId::Typed
    }

    async fn fetch_people(&self, params: &RequestParameters) -> Result<Vec<Person>> {
        let url = params.to_url(&self.endpoint)?;
        tracing::debug!("[{}] GET {}", self.strategy(), url);

        let page: PeoplePage = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(AppError::from_transport)?
            .json()
            .await
            .map_err(AppError::from_transport)?;

        Ok(page.results)
    }
}

/// Strategy B: checks the status by hand and decodes the text body itself.
pub struct RawTransport {
    client: Client,
    endpoint: String,
}

impl RawTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl PeopleTransport for RawTransport {
    fn strategy(&self) -> StrategyId {
        StrategyId::Raw
    }

    async fn fetch_people(&self, params: &RequestParameters) -> Result<Vec<Person>> {
        let url = params.to_url(&self.endpoint)?;
        tracing::debug!("[{}] GET {}", self.strategy(), url);

        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status();
        tracing::debug!("[{}] response status: {}", self.strategy(), status);

        if !status.is_success() {
            return Err(AppError::from_status(status));
        }

        let body = response.text().await?;
        let page: PeoplePage = serde_json::from_str(&body)?;
        Ok(page.results)
    }
}

/// Client for the user directory endpoint (takes no parameters).
pub struct DirectoryClient {
    client: Client,
    endpoint: String,
}

impl DirectoryClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl UserDirectory for DirectoryClient {
    async fn fetch_users(&self) -> Result<Vec<User>> {
        tracing::debug!("[directory] GET {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AppError::from_status(status));
        }

        let page: UserPage = response.json().await.map_err(AppError::from_transport)?;
        Ok(page.users)
    }
}
