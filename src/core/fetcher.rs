use crate::adapters::http::{RawTransport, TypedTransport};
use crate::domain::model::{Person, RequestParameters, StrategyId};
use crate::domain::ports::PeopleTransport;
use crate::utils::error::Result;
use reqwest::Client;
use std::sync::Arc;

/// Same "page of people" request through either of two interchangeable transports.
#[derive(Clone)]
pub struct DualClientFetcher {
    typed: Arc<dyn PeopleTransport>,
    raw: Arc<dyn PeopleTransport>,
}

impl DualClientFetcher {
    pub fn new(typed: Arc<dyn PeopleTransport>, raw: Arc<dyn PeopleTransport>) -> Self {
        Self { typed, raw }
    }

    /// Both reqwest transports against one endpoint, each with its own client.
    pub fn for_endpoint(endpoint: &str, typed_client: Client, raw_client: Client) -> Self {
        Self::new(
            Arc::new(TypedTransport::with_client(typed_client, endpoint)),
            Arc::new(RawTransport::with_client(raw_client, endpoint)),
        )
    }

    pub fn transport(&self, strategy: StrategyId) -> &Arc<dyn PeopleTransport> {
        match strategy {
            StrategyId::Typed => &self.typed,
            StrategyId::Raw => &self.raw,
        }
    }

    pub async fn fetch(
        &self,
        strategy: StrategyId,
        params: &RequestParameters,
    ) -> Result<Vec<Person>> {
        self.transport(strategy).fetch_people(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_dispatches_to_matching_transport() {
        let server = MockServer::start_async().await;
        let api_mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/").query_param("nat", "DE");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({"results": [{"login": {"uuid": "x"}}]}));
            })
            .await;

        let fetcher =
            DualClientFetcher::for_endpoint(&server.url("/api/"), Client::new(), Client::new());
        assert_eq!(fetcher.transport(StrategyId::Typed).strategy(), StrategyId::Typed);
        assert_eq!(fetcher.transport(StrategyId::Raw).strategy(), StrategyId::Raw);

        let params = RequestParameters::with_country("DE");
        for strategy in StrategyId::ALL {
            let people = fetcher.fetch(strategy, &params).await.unwrap();
            assert_eq!(people.len(), 1);
            assert_eq!(people[0].uuid(), Some("x"));
        }
        api_mock.assert_hits_async(2).await;
    }
}
