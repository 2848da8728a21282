//! Sync status and block production

use super::trim_version;
use chainwatch_core::{
    FetcherName, Generator, MetricInfo, MetricName, NodeStatus, Result, State,
};
use std::time::Duration;

fn status(state: &State) -> Result<Option<&NodeStatus>> {
    state.get::<NodeStatus>(FetcherName::NodeStatus)
}

/// `node_info{moniker,chain_id,node_id,tendermint_version}`
pub struct NodeInfoGenerator;

impl Generator for NodeInfoGenerator {
    fn name(&self) -> &'static str {
        "node_info"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        Ok(status(state)?
            .map(|s| {
                MetricInfo::new(MetricName::NodeInfo, 1.0)
                    .with_label("moniker", &s.moniker)
                    .with_label("chain_id", &s.chain_id)
                    .with_label("node_id", &s.node_id)
                    .with_label("tendermint_version", trim_version(&s.tendermint_version))
            })
            .into_iter()
            .collect())
    }
}

pub struct CatchingUpGenerator;

impl Generator for CatchingUpGenerator {
    fn name(&self) -> &'static str {
        "catching_up"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        Ok(status(state)?
            .map(|s| MetricInfo::flag(MetricName::CatchingUp, s.catching_up))
            .into_iter()
            .collect())
    }
}

/// Latest block height and its unix timestamp
pub struct LatestBlockGenerator;

impl Generator for LatestBlockGenerator {
    fn name(&self) -> &'static str {
        "latest_block"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        let Some(s) = status(state)? else {
            return Ok(vec![]);
        };
        Ok(vec![
            MetricInfo::new(MetricName::LatestBlockHeight, s.latest_block_height as f64),
            MetricInfo::new(
                MetricName::LatestBlockTime,
                s.latest_block_time.timestamp() as f64,
            ),
        ])
    }
}

pub struct VotingPowerGenerator;

impl Generator for VotingPowerGenerator {
    fn name(&self) -> &'static str {
        "voting_power"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        Ok(status(state)?
            .map(|s| MetricInfo::new(MetricName::VotingPower, s.voting_power as f64))
            .into_iter()
            .collect())
    }
}

pub struct BlockTimeGenerator;

impl Generator for BlockTimeGenerator {
    fn name(&self) -> &'static str {
        "block_time"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        Ok(state
            .get::<Duration>(FetcherName::BlockTime)?
            .map(|d| MetricInfo::new(MetricName::BlockTime, d.as_secs_f64()))
            .into_iter()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::ContractViolation;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn state() -> State {
        State::new().with(
            FetcherName::NodeStatus,
            NodeStatus {
                node_id: "a1b2c3".to_string(),
                moniker: "validator-1".to_string(),
                chain_id: "cosmoshub-4".to_string(),
                tendermint_version: "v0.37.4".to_string(),
                latest_block_height: 18_000_000,
                latest_block_time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                catching_up: true,
                voting_power: 42,
            },
        )
    }

    #[test]
    fn test_node_info_labels() {
        let metrics = NodeInfoGenerator.generate(&state()).unwrap();

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].value, 1.0);
        assert_eq!(metrics[0].label("moniker"), Some("validator-1"));
        assert_eq!(metrics[0].label("chain_id"), Some("cosmoshub-4"));
        assert_eq!(metrics[0].label("node_id"), Some("a1b2c3"));
        assert_eq!(metrics[0].label("tendermint_version"), Some("0.37.4"));
    }

    #[test]
    fn test_status_values() {
        let state = state();

        assert_eq!(
            CatchingUpGenerator.generate(&state).unwrap(),
            vec![MetricInfo::new(MetricName::CatchingUp, 1.0)]
        );
        assert_eq!(
            LatestBlockGenerator.generate(&state).unwrap(),
            vec![
                MetricInfo::new(MetricName::LatestBlockHeight, 18_000_000.0),
                MetricInfo::new(MetricName::LatestBlockTime, 1_700_000_000.0),
            ]
        );
        assert_eq!(
            VotingPowerGenerator.generate(&state).unwrap(),
            vec![MetricInfo::new(MetricName::VotingPower, 42.0)]
        );
    }

    #[test]
    fn test_block_time() {
        let state = State::new().with(FetcherName::BlockTime, Duration::from_millis(6500));
        assert_eq!(
            BlockTimeGenerator.generate(&state).unwrap(),
            vec![MetricInfo::new(MetricName::BlockTime, 6.5)]
        );
    }

    #[test]
    fn test_generators_are_idempotent() {
        let state = state();
        assert_eq!(
            NodeInfoGenerator.generate(&state).unwrap(),
            NodeInfoGenerator.generate(&state).unwrap()
        );
    }

    #[test]
    fn test_wrong_type_is_a_violation() {
        let state = State::new().with(FetcherName::NodeStatus, "v1".to_string());
        assert!(matches!(
            CatchingUpGenerator.generate(&state),
            Err(ContractViolation::WrongType { .. })
        ));
    }
}
