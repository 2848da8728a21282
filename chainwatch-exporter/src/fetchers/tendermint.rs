//! Fetchers backed by the Tendermint RPC

use super::record;
use crate::clients::TendermintClient;
use async_trait::async_trait;
use chainwatch_core::{
    Dependencies, Fetched, Fetcher, FetcherName, NodeStatus, QueryModule, Result,
};
use std::sync::Arc;
use std::time::Duration;

/// Number of blocks the average block time is taken over
pub const BLOCK_TIME_WINDOW: i64 = 1000;

pub struct NodeStatusFetcher {
    client: Option<Arc<dyn TendermintClient>>,
}

impl NodeStatusFetcher {
    pub fn new(client: Option<Arc<dyn TendermintClient>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for NodeStatusFetcher {
    fn name(&self) -> FetcherName {
        FetcherName::NodeStatus
    }

    fn enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn get(&self, _deps: Dependencies) -> Result<Fetched> {
        let Some(client) = &self.client else {
            return Ok(Fetched::absent());
        };

        let mut queries = Vec::new();
        let status = record(
            &mut queries,
            QueryModule::Tendermint,
            "status",
            client.status().await,
        );
        Ok(Fetched::new(status, queries))
    }
}

/// Average block time over the last [`BLOCK_TIME_WINDOW`] blocks
///
/// Reuses the latest height and time from `node_status`, so only the
/// older block is requested.
pub struct BlockTimeFetcher {
    client: Option<Arc<dyn TendermintClient>>,
}

impl BlockTimeFetcher {
    pub fn new(client: Option<Arc<dyn TendermintClient>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for BlockTimeFetcher {
    fn name(&self) -> FetcherName {
        FetcherName::BlockTime
    }

    fn enabled(&self) -> bool {
        self.client.is_some()
    }

    fn dependencies(&self) -> &'static [FetcherName] {
        &[FetcherName::NodeStatus]
    }

    async fn get(&self, deps: Dependencies) -> Result<Fetched> {
        let Some(client) = &self.client else {
            return Ok(Fetched::absent());
        };
        let Some(status) = deps.get::<NodeStatus>(0)? else {
            return Ok(Fetched::absent());
        };

        let latest = status.latest_block_height;
        let earlier = (latest - BLOCK_TIME_WINDOW).max(1);
        if earlier >= latest {
            return Ok(Fetched::absent());
        }

        let mut queries = Vec::new();
        let block_time = record(
            &mut queries,
            QueryModule::Tendermint,
            "block",
            client.block_time(earlier).await,
        )
        .and_then(|earlier_time| {
            let elapsed = (status.latest_block_time - earlier_time).to_std().ok()?;
            Some(Duration::from_secs_f64(
                elapsed.as_secs_f64() / (latest - earlier) as f64,
            ))
        });

        Ok(Fetched::new(block_time, queries))
    }
}

/// Pending governance upgrade, via the upgrade module's `CurrentPlan` query
pub struct UpgradePlanFetcher {
    client: Option<Arc<dyn TendermintClient>>,
}

impl UpgradePlanFetcher {
    pub fn new(client: Option<Arc<dyn TendermintClient>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for UpgradePlanFetcher {
    fn name(&self) -> FetcherName {
        FetcherName::UpgradePlan
    }

    fn enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn get(&self, _deps: Dependencies) -> Result<Fetched> {
        let Some(client) = &self.client else {
            return Ok(Fetched::absent());
        };

        let mut queries = Vec::new();
        let plan = record(
            &mut queries,
            QueryModule::Tendermint,
            "upgrade_plan",
            client.upgrade_plan().await,
        )
        .flatten();
        Ok(Fetched::new(plan, queries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::FakeTendermint;
    use chainwatch_core::{QueryInfo, StateValue, UpgradePlan};
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex;
    use std::sync::atomic::Ordering;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn status(height: i64, time: DateTime<Utc>) -> NodeStatus {
        NodeStatus {
            node_id: "abc".to_string(),
            moniker: "validator".to_string(),
            chain_id: "cosmoshub-4".to_string(),
            tendermint_version: "0.37.4".to_string(),
            latest_block_height: height,
            latest_block_time: time,
            catching_up: false,
            voting_power: 10,
        }
    }

    fn deps_with(value: impl Into<StateValue>) -> Dependencies {
        Dependencies::new(
            FetcherName::BlockTime,
            vec![(FetcherName::NodeStatus, value.into())],
        )
    }

    #[tokio::test]
    async fn test_block_time_average() {
        let client = Arc::new(FakeTendermint {
            block_times: Mutex::new(vec![(4000, at(1_700_000_000))]),
            ..Default::default()
        });
        let fetcher = BlockTimeFetcher::new(Some(client));

        let fetched = fetcher
            .get(deps_with(status(5000, at(1_700_006_000))))
            .await
            .unwrap();

        assert_eq!(fetched.value, StateValue::BlockTime(Duration::from_secs(6)));
        assert_eq!(
            fetched.queries,
            vec![QueryInfo::succeeded(QueryModule::Tendermint, "block")]
        );
    }

    #[tokio::test]
    async fn test_block_time_without_status_does_nothing() {
        let client = Arc::new(FakeTendermint::default());
        let fetcher = BlockTimeFetcher::new(Some(client.clone()));

        let fetched = fetcher.get(deps_with(StateValue::Absent)).await.unwrap();

        assert_eq!(fetched, Fetched::absent());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_block_time_pruned_block_fails_query() {
        let client = Arc::new(FakeTendermint::default());
        let fetcher = BlockTimeFetcher::new(Some(client));

        let fetched = fetcher
            .get(deps_with(status(5000, at(1_700_006_000))))
            .await
            .unwrap();

        assert!(fetched.value.is_absent());
        assert_eq!(
            fetched.queries,
            vec![QueryInfo::failed(QueryModule::Tendermint, "block")]
        );
    }

    #[tokio::test]
    async fn test_block_time_wrong_dependency_type() {
        let fetcher = BlockTimeFetcher::new(Some(Arc::new(FakeTendermint::default())));
        let result = fetcher.get(deps_with("v1.0.0".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upgrade_plan_none_pending_is_absent() {
        let fetcher = UpgradePlanFetcher::new(Some(Arc::new(FakeTendermint::default())));
        let fetched = fetcher
            .get(Dependencies::none(FetcherName::UpgradePlan))
            .await
            .unwrap();

        assert!(fetched.value.is_absent());
        assert!(fetched.queries[0].success);
    }

    #[tokio::test]
    async fn test_upgrade_plan_present() {
        let plan = UpgradePlan {
            name: "v16".to_string(),
            height: 18_100_000,
            info: String::new(),
        };
        let fetcher = UpgradePlanFetcher::new(Some(Arc::new(FakeTendermint {
            plan: Some(plan.clone()),
            ..Default::default()
        })));

        let fetched = fetcher
            .get(Dependencies::none(FetcherName::UpgradePlan))
            .await
            .unwrap();
        assert_eq!(fetched.value, StateValue::UpgradePlan(plan));
    }

    #[tokio::test]
    async fn test_node_status_failure() {
        let fetcher = NodeStatusFetcher::new(Some(Arc::new(FakeTendermint::default())));
        let fetched = fetcher
            .get(Dependencies::none(FetcherName::NodeStatus))
            .await
            .unwrap();

        assert!(fetched.value.is_absent());
        assert_eq!(
            fetched.queries,
            vec![QueryInfo::failed(QueryModule::Tendermint, "status")]
        );
    }
}
