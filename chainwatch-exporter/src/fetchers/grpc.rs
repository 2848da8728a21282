//! Node configuration over gRPC

use super::record;
use crate::clients::NodeConfigClient;
use async_trait::async_trait;
use chainwatch_core::{Dependencies, Fetched, Fetcher, FetcherName, QueryModule, Result};
use std::sync::Arc;

/// Absent when the node does not implement the config endpoint
pub struct NodeConfigFetcher {
    client: Option<Arc<dyn NodeConfigClient>>,
}

impl NodeConfigFetcher {
    pub fn new(client: Option<Arc<dyn NodeConfigClient>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for NodeConfigFetcher {
    fn name(&self) -> FetcherName {
        FetcherName::NodeConfig
    }

    fn enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn get(&self, _deps: Dependencies) -> Result<Fetched> {
        let Some(client) = &self.client else {
            return Ok(Fetched::absent());
        };

        let mut queries = Vec::new();
        let config = record(
            &mut queries,
            QueryModule::Grpc,
            "node_config",
            client.config().await,
        )
        .flatten();
        Ok(Fetched::new(config, queries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::FakeNodeConfig;
    use chainwatch_core::{NodeConfig, QueryInfo, StateValue};

    #[tokio::test]
    async fn test_unimplemented_config_is_successful_and_absent() {
        let fetcher = NodeConfigFetcher::new(Some(Arc::new(FakeNodeConfig(None))));

        let fetched = fetcher
            .get(Dependencies::none(FetcherName::NodeConfig))
            .await
            .unwrap();

        assert!(fetched.value.is_absent());
        assert_eq!(
            fetched.queries,
            vec![QueryInfo::succeeded(QueryModule::Grpc, "node_config")]
        );
    }

    #[tokio::test]
    async fn test_node_config() {
        let config = NodeConfig {
            minimum_gas_price: "0.0025uatom".to_string(),
            halt_height: 100,
            ..Default::default()
        };
        let fetcher = NodeConfigFetcher::new(Some(Arc::new(FakeNodeConfig(Some(config.clone())))));

        let fetched = fetcher
            .get(Dependencies::none(FetcherName::NodeConfig))
            .await
            .unwrap();
        assert_eq!(fetched.value, StateValue::NodeConfig(config));
    }
}
