//! gRPC client for the node service

use super::{ClientError, NodeConfigClient};
use async_trait::async_trait;
use chainwatch_core::NodeConfig;
use chainwatch_protocol::{ConfigRequest, ConfigResponse, NodeServiceClient};
use std::time::Duration;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::Code;
use tracing::debug;

/// Node config over gRPC
///
/// The channel connects lazily, so construction never touches the network.
pub struct GrpcNodeConfigClient {
    client: NodeServiceClient<Channel>,
}

impl GrpcNodeConfigClient {
    pub fn new(address: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut endpoint = Endpoint::from_shared(address.to_string())?
            .timeout(timeout)
            .connect_timeout(timeout);

        if address.starts_with("https://") {
            endpoint = endpoint.tls_config(ClientTlsConfig::new())?;
        }

        Ok(Self {
            client: NodeServiceClient::new(endpoint.connect_lazy()),
        })
    }
}

#[async_trait]
impl NodeConfigClient for GrpcNodeConfigClient {
    async fn config(&self) -> Result<Option<NodeConfig>, ClientError> {
        let mut client = self.client.clone();
        match client.config(ConfigRequest {}).await {
            Ok(response) => Ok(Some(into_node_config(response.into_inner()))),
            Err(status) if is_unimplemented(&status) => {
                debug!(message = %status.message(), "Node config service not available");
                Ok(None)
            }
            Err(status) => Err(status.into()),
        }
    }
}

/// Older nodes do not register the node service at all.
fn is_unimplemented(status: &tonic::Status) -> bool {
    status.code() == Code::Unimplemented || status.message().contains("unknown service")
}

fn into_node_config(response: ConfigResponse) -> NodeConfig {
    NodeConfig {
        minimum_gas_price: response.minimum_gas_price,
        pruning_keep_recent: response.pruning_keep_recent,
        pruning_interval: response.pruning_interval,
        halt_height: response.halt_height,
    }
}
