//! Fetcher contract
//!
//! A fetcher wraps one data-source operation. It is enabled or not from its
//! own configuration, names the fetchers whose output it needs, and turns
//! those outputs plus one round of I/O into a single [`StateValue`].

use crate::error::Result;
use crate::query::QueryInfo;
use crate::state::{Dependencies, StateValue};
use async_trait::async_trait;

/// Every fetcher known to the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FetcherName {
    NodeStatus,
    BlockTime,
    UpgradePlan,
    CosmovisorVersion,
    CosmovisorUpgradeInfo,
    CosmovisorUpgrades,
    LocalVersion,
    RemoteVersion,
    NodeConfig,
    Uptime,
}

impl FetcherName {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetcherName::NodeStatus => "node_status",
            FetcherName::BlockTime => "block_time",
            FetcherName::UpgradePlan => "upgrade_plan",
            FetcherName::CosmovisorVersion => "cosmovisor_version",
            FetcherName::CosmovisorUpgradeInfo => "cosmovisor_upgrade_info",
            FetcherName::CosmovisorUpgrades => "cosmovisor_upgrades",
            FetcherName::LocalVersion => "local_version",
            FetcherName::RemoteVersion => "remote_version",
            FetcherName::NodeConfig => "node_config",
            FetcherName::Uptime => "uptime",
        }
    }
}

impl std::fmt::Display for FetcherName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one fetcher invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fetched {
    pub value: StateValue,
    pub queries: Vec<QueryInfo>,
}

impl Fetched {
    pub fn new(value: impl Into<StateValue>, queries: Vec<QueryInfo>) -> Self {
        Self {
            value: value.into(),
            queries,
        }
    }

    /// Nothing fetched and nothing attempted
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Named unit of work producing one state entry
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn name(&self) -> FetcherName;

    /// Whether this fetcher should run at all. Disabled fetchers produce
    /// [`StateValue::Absent`] without being invoked.
    fn enabled(&self) -> bool;

    /// Fetchers whose values are passed to [`Fetcher::get`], in this order
    fn dependencies(&self) -> &'static [FetcherName] {
        &[]
    }

    /// Perform the fetch.
    ///
    /// Client failures are not errors here: they are reported as failed
    /// [`QueryInfo`] records with an absent value. An absent dependency means
    /// there is nothing to do. `Err` is reserved for contract violations,
    /// such as a dependency of an unexpected type.
    async fn get(&self, deps: Dependencies) -> Result<Fetched>;
}
