//! Domain values produced by fetchers
//!
//! These are the decoded, client-independent shapes stored in [`State`](crate::State).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync and identity snapshot of a node, as reported by its status endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub node_id: String,
    pub moniker: String,
    pub chain_id: String,
    pub tendermint_version: String,
    pub latest_block_height: i64,
    pub latest_block_time: DateTime<Utc>,
    pub catching_up: bool,
    pub voting_power: i64,
}

/// A pending software upgrade
///
/// Decodes directly from cosmovisor's `upgrade-info.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradePlan {
    pub name: String,
    pub height: i64,
    #[serde(default)]
    pub info: String,
}

/// Where an upgrade plan was learned from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpgradeSource {
    /// On-chain governance, via the upgrade module query
    Governance,
    /// Cosmovisor's `upgrade-info.json`
    UpgradeInfo,
}

impl UpgradeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpgradeSource::Governance => "governance",
            UpgradeSource::UpgradeInfo => "upgrade-info",
        }
    }
}

impl std::fmt::Display for UpgradeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build information of the chain binary
///
/// Field names follow the Cosmos SDK `version --long --output json` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub server_name: String,
    pub version: String,
    #[serde(default)]
    pub commit: String,
    #[serde(default)]
    pub build_tags: String,
    #[serde(default)]
    pub go: String,
    #[serde(default)]
    pub cosmos_sdk_version: String,
}

/// Application-level node configuration served over gRPC
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub minimum_gas_price: String,
    pub pruning_keep_recent: String,
    pub pruning_interval: String,
    pub halt_height: u64,
}

/// One entry of a `minimum-gas-prices` setting, e.g. `0.025uatom`
#[derive(Debug, Clone, PartialEq)]
pub struct GasPrice {
    pub denom: String,
    pub amount: f64,
}

impl NodeConfig {
    /// Parse `minimum_gas_price` into per-denom amounts.
    ///
    /// Entries that do not start with a decimal amount are skipped.
    pub fn gas_prices(&self) -> Vec<GasPrice> {
        self.minimum_gas_price
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let split = entry
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .unwrap_or(entry.len());
                let (amount, denom) = entry.split_at(split);
                if denom.is_empty() {
                    return None;
                }
                amount.parse::<f64>().ok().map(|amount| GasPrice {
                    denom: denom.to_string(),
                    amount,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_prices_multiple_denoms() {
        let config = NodeConfig {
            minimum_gas_price: "0.025uatom, 0.1ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2".to_string(),
            ..Default::default()
        };

        let prices = config.gas_prices();
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].denom, "uatom");
        assert_eq!(prices[0].amount, 0.025);
        assert!(prices[1].denom.starts_with("ibc/"));
    }

    #[test]
    fn test_gas_prices_skips_garbage() {
        let config = NodeConfig {
            minimum_gas_price: "uatom,0.5,,1stake".to_string(),
            ..Default::default()
        };

        let prices = config.gas_prices();
        assert_eq!(
            prices,
            vec![GasPrice {
                denom: "stake".to_string(),
                amount: 1.0
            }]
        );
    }

    #[test]
    fn test_upgrade_plan_from_upgrade_info_json() {
        let json = r#"{"name":"v15","time":"0001-01-01T00:00:00Z","height":16000000}"#;
        let plan: UpgradePlan = serde_json::from_str(json).unwrap();
        assert_eq!(plan.name, "v15");
        assert_eq!(plan.height, 16_000_000);
        assert!(plan.info.is_empty());
    }
}
