//! Data source clients
//!
//! Each data source is a trait with one production implementation, so
//! fetchers can be exercised against fakes:
//! - [`TendermintClient`] - node status, blocks and ABCI queries over JSON-RPC
//! - [`NodeConfigClient`] - application config over gRPC
//! - [`CosmovisorClient`] - the upgrade manager binary and its data directory
//! - [`ReleaseClient`] - latest published release of the chain binary

pub mod cosmovisor;
pub mod grpc;
pub mod release;
pub mod tendermint;

use async_trait::async_trait;
use chainwatch_core::{NodeConfig, NodeStatus, UpgradePlan, VersionInfo};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

pub use cosmovisor::ProcessCosmovisorClient;
pub use grpc::GrpcNodeConfigClient;
pub use release::GithubReleaseClient;
pub use tendermint::HttpTendermintClient;

/// Failure of a single client call
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("gRPC call failed: {0}")]
    Grpc(#[from] tonic::Status),

    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Process failed: {0}")]
    Process(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Decode failed: {0}")]
    Decode(String),
}

impl From<prost::DecodeError> for ClientError {
    fn from(e: prost::DecodeError) -> Self {
        ClientError::Decode(e.to_string())
    }
}

/// Tendermint / CometBFT RPC
#[async_trait]
pub trait TendermintClient: Send + Sync {
    async fn status(&self) -> Result<NodeStatus, ClientError>;

    /// Time of the block at `height`
    async fn block_time(&self, height: i64) -> Result<DateTime<Utc>, ClientError>;

    /// Pending governance upgrade, `None` when nothing is scheduled
    async fn upgrade_plan(&self) -> Result<Option<UpgradePlan>, ClientError>;
}

/// `cosmos.base.node.v1beta1.Service`
#[async_trait]
pub trait NodeConfigClient: Send + Sync {
    /// `None` when the node does not serve the config endpoint
    async fn config(&self) -> Result<Option<NodeConfig>, ClientError>;
}

/// Cosmovisor binary and data directory
#[async_trait]
pub trait CosmovisorClient: Send + Sync {
    async fn cosmovisor_version(&self) -> Result<String, ClientError>;

    /// Build information of the currently linked chain binary
    async fn app_version(&self) -> Result<VersionInfo, ClientError>;

    /// Contents of `upgrade-info.json`, `None` when the file does not exist
    async fn upgrade_info(&self) -> Result<Option<UpgradePlan>, ClientError>;

    /// Names of upgrades whose binary is installed
    async fn upgrades(&self) -> Result<BTreeSet<String>, ClientError>;
}

/// Release tracking
#[async_trait]
pub trait ReleaseClient: Send + Sync {
    /// Tag of the latest release, e.g. `v15.2.0`
    async fn latest_release(&self) -> Result<String, ClientError>;
}
