//! Tendermint JSON-RPC client
//!
//! Uses the URI-over-GET flavour of the RPC (`/status`, `/block?height=N`,
//! `/abci_query?path="..."&data=0x..`). ABCI query payloads are protobuf.

use super::{ClientError, TendermintClient};
use async_trait::async_trait;
use base64::Engine;
use chainwatch_core::{NodeStatus, UpgradePlan};
use chainwatch_protocol::{QueryCurrentPlanRequest, QueryCurrentPlanResponse, CURRENT_PLAN_PATH};
use chrono::{DateTime, Utc};
use prost::Message;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

/// Tendermint RPC over HTTP
pub struct HttpTendermintClient {
    http: Client,
    address: String,
}

impl HttpTendermintClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            address: address.into().trim_end_matches('/').to_string(),
        })
    }

    /// Run an ABCI query and return the raw response value.
    ///
    /// A non-zero response code is reported as [`ClientError::Rpc`].
    pub async fn abci_query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>, ClientError> {
        let query = [
            ("path", format!("\"{}\"", path)),
            ("data", format!("0x{}", hex::encode(data))),
        ];
        let result: AbciQueryResult = self.call("abci_query", &query).await?;
        let response = result.response;

        if response.code != 0 {
            return Err(ClientError::Rpc {
                code: response.code,
                message: response.log,
            });
        }

        match response.value {
            Some(value) => base64::engine::general_purpose::STANDARD
                .decode(value)
                .map_err(|e| ClientError::Decode(format!("abci value: {}", e))),
            None => Ok(Vec::new()),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.address, method);
        debug!(url = %url, "Tendermint RPC call");

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.bytes().await?;
        let envelope: RpcResponse<T> = serde_json::from_slice(&body)?;
        match (envelope.result, envelope.error) {
            (_, Some(error)) => Err(ClientError::Rpc {
                code: error.code,
                message: if error.data.is_empty() {
                    error.message
                } else {
                    format!("{}: {}", error.message, error.data)
                },
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(ClientError::Decode(format!(
                "{} returned neither result nor error",
                method
            ))),
        }
    }
}

#[async_trait]
impl TendermintClient for HttpTendermintClient {
    async fn status(&self) -> Result<NodeStatus, ClientError> {
        let status: StatusResult = self.call("status", &[]).await?;
        Ok(status.into())
    }

    async fn block_time(&self, height: i64) -> Result<DateTime<Utc>, ClientError> {
        let block: BlockResult = self
            .call("block", &[("height", height.to_string())])
            .await?;
        Ok(block.block.header.time)
    }

    async fn upgrade_plan(&self) -> Result<Option<UpgradePlan>, ClientError> {
        let request = QueryCurrentPlanRequest {}.encode_to_vec();
        let value = self.abci_query(CURRENT_PLAN_PATH, &request).await?;
        let response = QueryCurrentPlanResponse::decode(value.as_slice())?;

        Ok(response.plan.map(|plan| UpgradePlan {
            name: plan.name,
            height: plan.height,
            info: plan.info,
        }))
    }
}

// ===== Wire types =====

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    node_info: NodeInfo,
    sync_info: SyncInfo,
    validator_info: ValidatorInfo,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    id: String,
    network: String,
    version: String,
    moniker: String,
}

#[derive(Debug, Deserialize)]
struct SyncInfo {
    #[serde(deserialize_with = "i64_from_str")]
    latest_block_height: i64,
    latest_block_time: DateTime<Utc>,
    catching_up: bool,
}

#[derive(Debug, Deserialize)]
struct ValidatorInfo {
    #[serde(deserialize_with = "i64_from_str")]
    voting_power: i64,
}

impl From<StatusResult> for NodeStatus {
    fn from(status: StatusResult) -> Self {
        NodeStatus {
            node_id: status.node_info.id,
            moniker: status.node_info.moniker,
            chain_id: status.node_info.network,
            tendermint_version: status.node_info.version,
            latest_block_height: status.sync_info.latest_block_height,
            latest_block_time: status.sync_info.latest_block_time,
            catching_up: status.sync_info.catching_up,
            voting_power: status.validator_info.voting_power,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlockResult {
    block: Block,
}

#[derive(Debug, Deserialize)]
struct Block {
    header: BlockHeader,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct AbciQueryResult {
    response: AbciResponse,
}

#[derive(Debug, Deserialize)]
struct AbciResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    log: String,
    value: Option<String>,
}

/// Tendermint encodes 64-bit integers as JSON strings.
fn i64_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrInt {
        Str(String),
        Int(i64),
    }

    match StrOrInt::deserialize(deserializer)? {
        StrOrInt::Str(s) => s.parse().map_err(serde::de::Error::custom),
        StrOrInt::Int(i) => Ok(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const STATUS: &str = r#"{
        "jsonrpc": "2.0",
        "id": -1,
        "result": {
            "node_info": {
                "protocol_version": {"p2p": "8", "block": "11", "app": "0"},
                "id": "a1b2c3",
                "listen_addr": "tcp://0.0.0.0:26656",
                "network": "cosmoshub-4",
                "version": "0.37.4",
                "channels": "40202122233038606100",
                "moniker": "validator-1",
                "other": {"tx_index": "on", "rpc_address": "tcp://0.0.0.0:26657"}
            },
            "sync_info": {
                "latest_block_hash": "ABCDEF",
                "latest_block_height": "18000000",
                "latest_block_time": "2023-11-14T22:13:20.123456789Z",
                "catching_up": false
            },
            "validator_info": {
                "address": "0123",
                "pub_key": {"type": "tendermint/PubKeyEd25519", "value": "abc="},
                "voting_power": "42"
            }
        }
    }"#;

    #[test]
    fn test_decode_status() {
        let envelope: RpcResponse<StatusResult> = serde_json::from_str(STATUS).unwrap();
        let status: NodeStatus = envelope.result.unwrap().into();

        assert_eq!(status.moniker, "validator-1");
        assert_eq!(status.chain_id, "cosmoshub-4");
        assert_eq!(status.node_id, "a1b2c3");
        assert_eq!(status.tendermint_version, "0.37.4");
        assert_eq!(status.latest_block_height, 18_000_000);
        assert_eq!(status.latest_block_time.timestamp(), 1_700_000_000);
        assert!(!status.catching_up);
        assert_eq!(status.voting_power, 42);
    }

    #[test]
    fn test_decode_block_header_time() {
        let body = r#"{"jsonrpc":"2.0","id":-1,"result":{"block_id":{},"block":{"header":{"height":"5","time":"2023-11-14T22:13:20Z"},"data":{"txs":[]}}}}"#;
        let envelope: RpcResponse<BlockResult> = serde_json::from_str(body).unwrap();

        assert_eq!(
            envelope.result.unwrap().block.header.time,
            Utc.timestamp_opt(1_700_000_000, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_rpc_error() {
        let body = r#"{"jsonrpc":"2.0","id":-1,"error":{"code":-32603,"message":"Internal error","data":"height 1 is not available, lowest height is 100"}}"#;
        let envelope: RpcResponse<BlockResult> = serde_json::from_str(body).unwrap();

        assert!(envelope.result.is_none());
        let error = envelope.error.unwrap();
        assert_eq!(error.code, -32603);
        assert!(error.data.contains("lowest height"));
    }

    #[test]
    fn test_decode_abci_response_without_value() {
        let body = r#"{"jsonrpc":"2.0","id":-1,"result":{"response":{"code":0,"log":"","info":"","index":"0","key":null,"value":null,"height":"100","codespace":""}}}"#;
        let envelope: RpcResponse<AbciQueryResult> = serde_json::from_str(body).unwrap();
        let response = envelope.result.unwrap().response;

        assert_eq!(response.code, 0);
        assert!(response.value.is_none());
    }
}
