//! Fetcher implementations
//!
//! Every fetcher holds the client of its integration as an `Option`; it is
//! enabled exactly when that client exists. Client failures never escape a
//! fetcher: they become failed [`QueryInfo`] records and an absent value.

mod cosmovisor;
mod grpc;
mod release;
mod tendermint;
mod uptime;

pub use cosmovisor::{
    CosmovisorUpgradeInfoFetcher, CosmovisorUpgradesFetcher, CosmovisorVersionFetcher,
    LocalVersionFetcher,
};
pub use grpc::NodeConfigFetcher;
pub use release::RemoteVersionFetcher;
pub use tendermint::{BlockTimeFetcher, NodeStatusFetcher, UpgradePlanFetcher};
pub use uptime::UptimeFetcher;

use crate::clients::ClientError;
use crate::node::NodeClients;
use chainwatch_core::{Fetcher, QueryInfo, QueryModule};
use std::sync::Arc;
use tracing::warn;

/// The per-node fetcher set for the given clients
pub fn node_fetchers(clients: &NodeClients) -> Vec<Arc<dyn Fetcher>> {
    vec![
        Arc::new(NodeStatusFetcher::new(clients.tendermint.clone())),
        Arc::new(BlockTimeFetcher::new(clients.tendermint.clone())),
        Arc::new(UpgradePlanFetcher::new(clients.tendermint.clone())),
        Arc::new(CosmovisorVersionFetcher::new(clients.cosmovisor.clone())),
        Arc::new(CosmovisorUpgradeInfoFetcher::new(clients.cosmovisor.clone())),
        Arc::new(CosmovisorUpgradesFetcher::new(clients.cosmovisor.clone())),
        Arc::new(LocalVersionFetcher::new(clients.cosmovisor.clone())),
        Arc::new(RemoteVersionFetcher::new(clients.release.clone())),
        Arc::new(NodeConfigFetcher::new(clients.grpc.clone())),
    ]
}

/// Record the outcome of one client call, keeping the value on success.
pub(crate) fn record<T>(
    queries: &mut Vec<QueryInfo>,
    module: QueryModule,
    action: &'static str,
    result: Result<T, ClientError>,
) -> Option<T> {
    match result {
        Ok(value) => {
            queries.push(QueryInfo::succeeded(module, action));
            Some(value)
        }
        Err(e) => {
            warn!(module = %module, action, error = %e, "Query failed");
            queries.push(QueryInfo::failed(module, action));
            None
        }
    }
}
