//! Metric records emitted by generators

use std::collections::BTreeMap;

/// Every metric family the exporter can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricName {
    // Node status
    NodeInfo,
    CatchingUp,
    LatestBlockHeight,
    LatestBlockTime,
    VotingPower,
    BlockTime,

    // Versions
    CosmovisorVersion,
    LocalVersion,
    RemoteVersion,
    IsLatest,

    // Upgrades
    UpgradeInfo,
    UpgradeHeight,
    UpgradeBinaryPresent,
    UpgradeEstimatedTime,

    // Node config
    MinimumGasPrice,
    HaltHeight,

    // Exporter
    IntegrationEnabled,
    QuerySuccessful,
    AppVersion,
    StartTime,
}

impl MetricName {
    pub const ALL: [MetricName; 20] = [
        MetricName::NodeInfo,
        MetricName::CatchingUp,
        MetricName::LatestBlockHeight,
        MetricName::LatestBlockTime,
        MetricName::VotingPower,
        MetricName::BlockTime,
        MetricName::CosmovisorVersion,
        MetricName::LocalVersion,
        MetricName::RemoteVersion,
        MetricName::IsLatest,
        MetricName::UpgradeInfo,
        MetricName::UpgradeHeight,
        MetricName::UpgradeBinaryPresent,
        MetricName::UpgradeEstimatedTime,
        MetricName::MinimumGasPrice,
        MetricName::HaltHeight,
        MetricName::IntegrationEnabled,
        MetricName::QuerySuccessful,
        MetricName::AppVersion,
        MetricName::StartTime,
    ];

    /// Fully qualified Prometheus name
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::NodeInfo => "chainwatch_node_info",
            MetricName::CatchingUp => "chainwatch_catching_up",
            MetricName::LatestBlockHeight => "chainwatch_latest_block_height",
            MetricName::LatestBlockTime => "chainwatch_latest_block_time",
            MetricName::VotingPower => "chainwatch_voting_power",
            MetricName::BlockTime => "chainwatch_block_time_seconds",
            MetricName::CosmovisorVersion => "chainwatch_cosmovisor_version",
            MetricName::LocalVersion => "chainwatch_local_version",
            MetricName::RemoteVersion => "chainwatch_remote_version",
            MetricName::IsLatest => "chainwatch_is_latest",
            MetricName::UpgradeInfo => "chainwatch_upgrade_info",
            MetricName::UpgradeHeight => "chainwatch_upgrade_height",
            MetricName::UpgradeBinaryPresent => "chainwatch_upgrade_binary_present",
            MetricName::UpgradeEstimatedTime => "chainwatch_upgrade_estimated_time",
            MetricName::MinimumGasPrice => "chainwatch_minimum_gas_price",
            MetricName::HaltHeight => "chainwatch_halt_height",
            MetricName::IntegrationEnabled => "chainwatch_integration_enabled",
            MetricName::QuerySuccessful => "chainwatch_query_successful",
            MetricName::AppVersion => "chainwatch_app_version",
            MetricName::StartTime => "chainwatch_start_time",
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            MetricName::NodeInfo => "Node identity, always 1",
            MetricName::CatchingUp => "Whether the node is catching up (1) or synced (0)",
            MetricName::LatestBlockHeight => "Latest block height known to the node",
            MetricName::LatestBlockTime => "Unix timestamp of the latest block known to the node",
            MetricName::VotingPower => "Voting power of the node's validator key",
            MetricName::BlockTime => "Average block time in seconds",
            MetricName::CosmovisorVersion => "Cosmovisor version, always 1",
            MetricName::LocalVersion => "Version of the chain binary running locally, always 1",
            MetricName::RemoteVersion => "Latest released version of the chain binary, always 1",
            MetricName::IsLatest => "Whether the local version is at least the latest release",
            MetricName::UpgradeInfo => "Pending upgrade, always 1",
            MetricName::UpgradeHeight => "Block height a pending upgrade is scheduled for",
            MetricName::UpgradeBinaryPresent => {
                "Whether the binary for a pending upgrade is present locally"
            }
            MetricName::UpgradeEstimatedTime => {
                "Estimated unix timestamp a pending upgrade will happen at"
            }
            MetricName::MinimumGasPrice => "Minimum gas price per denom",
            MetricName::HaltHeight => "Height the node is configured to halt at, 0 if unset",
            MetricName::IntegrationEnabled => "Whether an integration is enabled for the node",
            MetricName::QuerySuccessful => "Whether the last query to a data source succeeded",
            MetricName::AppVersion => "Exporter version, always 1",
            MetricName::StartTime => "Unix timestamp the exporter started at",
        }
    }
}

impl std::fmt::Display for MetricName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single metric sample
#[derive(Debug, Clone, PartialEq)]
pub struct MetricInfo {
    pub name: MetricName,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

impl MetricInfo {
    pub fn new(name: MetricName, value: f64) -> Self {
        Self {
            name,
            labels: BTreeMap::new(),
            value,
        }
    }

    /// Sample whose value encodes a boolean as 1 or 0
    pub fn flag(name: MetricName, value: bool) -> Self {
        Self::new(name, if value { 1.0 } else { 0.0 })
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_metric_names_are_unique() {
        let names: HashSet<_> = MetricName::ALL.iter().map(|n| n.as_str()).collect();
        assert_eq!(names.len(), MetricName::ALL.len());
        assert!(names.iter().all(|n| n.starts_with("chainwatch_")));
    }

    #[test]
    fn test_metric_labels() {
        let metric = MetricInfo::flag(MetricName::CatchingUp, true)
            .with_label("node", "hub")
            .with_label("node", "osmosis");

        assert_eq!(metric.value, 1.0);
        assert_eq!(metric.label("node"), Some("osmosis"));
        assert_eq!(metric.labels.len(), 1);
    }
}
