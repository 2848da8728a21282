//! Pending upgrades
//!
//! A plan can be known from governance (`upgrade_plan`) and from cosmovisor's
//! `upgrade-info.json` (`cosmovisor_upgrade_info`). Each known plan is emitted
//! separately with a `source` label.

use chainwatch_core::{
    FetcherName, Generator, MetricInfo, MetricName, NodeStatus, Result, State, UpgradePlan,
    UpgradeSource,
};
use std::collections::BTreeSet;
use std::time::Duration;

fn plans(state: &State) -> Result<Vec<(UpgradeSource, &UpgradePlan)>> {
    let mut plans = Vec::new();
    if let Some(plan) = state.get::<UpgradePlan>(FetcherName::UpgradePlan)? {
        plans.push((UpgradeSource::Governance, plan));
    }
    if let Some(plan) = state.get::<UpgradePlan>(FetcherName::CosmovisorUpgradeInfo)? {
        plans.push((UpgradeSource::UpgradeInfo, plan));
    }
    Ok(plans)
}

fn sample(name: MetricName, value: f64, source: UpgradeSource, plan: &UpgradePlan) -> MetricInfo {
    MetricInfo::new(name, value)
        .with_label("name", &plan.name)
        .with_label("source", source.as_str())
}

/// `upgrade_info{name,info,source}` and `upgrade_height{name,source}`
pub struct UpgradeInfoGenerator;

impl Generator for UpgradeInfoGenerator {
    fn name(&self) -> &'static str {
        "upgrade_info"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        let mut metrics = Vec::new();
        for (source, plan) in plans(state)? {
            metrics.push(
                sample(MetricName::UpgradeInfo, 1.0, source, plan).with_label("info", &plan.info),
            );
            metrics.push(sample(
                MetricName::UpgradeHeight,
                plan.height as f64,
                source,
                plan,
            ));
        }
        Ok(metrics)
    }
}

/// Whether the binary for each pending upgrade is installed
pub struct UpgradeBinaryGenerator;

impl Generator for UpgradeBinaryGenerator {
    fn name(&self) -> &'static str {
        "upgrade_binary_present"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        let Some(installed) = state.get::<BTreeSet<String>>(FetcherName::CosmovisorUpgrades)? else {
            return Ok(vec![]);
        };

        Ok(plans(state)?
            .into_iter()
            .map(|(source, plan)| {
                let present = if installed.contains(&plan.name) { 1.0 } else { 0.0 };
                sample(MetricName::UpgradeBinaryPresent, present, source, plan)
            })
            .collect())
    }
}

/// Estimated upgrade time from the latest block and the average block time
pub struct UpgradeEstimatedTimeGenerator;

impl Generator for UpgradeEstimatedTimeGenerator {
    fn name(&self) -> &'static str {
        "upgrade_estimated_time"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        let status = state.get::<NodeStatus>(FetcherName::NodeStatus)?;
        let block_time = state.get::<Duration>(FetcherName::BlockTime)?;
        let (Some(status), Some(block_time)) = (status, block_time) else {
            return Ok(vec![]);
        };

        let latest = status.latest_block_time.timestamp() as f64;
        Ok(plans(state)?
            .into_iter()
            .map(|(source, plan)| {
                let blocks_left = (plan.height - status.latest_block_height) as f64;
                let estimate = latest + blocks_left * block_time.as_secs_f64();
                sample(MetricName::UpgradeEstimatedTime, estimate, source, plan)
            })
            .collect())
    }
}
