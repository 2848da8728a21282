//! chainwatch exporter library
//!
//! Everything between the data sources and the Prometheus endpoint:
//! - Data source clients (Tendermint RPC, gRPC, cosmovisor, GitHub releases)
//! - Fetcher and generator implementations
//! - Per-node handler and the multi-node application
//! - Configuration, logging setup and the metrics HTTP server

pub mod app;
pub mod clients;
pub mod config;
pub mod fetchers;
pub mod generators;
pub mod logging;
pub mod metrics;
pub mod node;

pub use app::App;
pub use clients::ClientError;
pub use config::{
    AppConfig, ConfigError, CosmovisorSettings, GitSettings, GithubSettings, GrpcSettings,
    LogSettings, NodeSettings, TendermintSettings,
};
pub use crate::metrics::{render, router, MetricsServer};
pub use node::{Integration, NodeClients, NodeError, NodeHandler, NodeReport};
