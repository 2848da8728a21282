//! Exporter application
//!
//! Polls every node concurrently, each on its own task, together with the
//! global fetchers, and merges the results into one metric set. A node that
//! fails is logged and left out; the other nodes are unaffected.

use crate::config::AppConfig;
use crate::fetchers::UptimeFetcher;
use crate::generators::global_generators;
use crate::node::{NodeError, NodeHandler, NodeReport};
use chainwatch_core::{ContractViolation, Controller, Fetcher, Generator, MetricInfo, MetricName};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error};

pub struct App {
    nodes: Vec<Arc<NodeHandler>>,
    global: Controller,
    global_generators: Vec<Box<dyn Generator>>,
}

impl App {
    pub fn new(nodes: Vec<NodeHandler>, started_at: DateTime<Utc>) -> Result<Self, ContractViolation> {
        let global_fetchers: Vec<Arc<dyn Fetcher>> = vec![Arc::new(UptimeFetcher::new(started_at))];

        Ok(Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
            global: Controller::new("global", global_fetchers)?,
            global_generators: global_generators(),
        })
    }

    pub fn from_config(config: &AppConfig, started_at: DateTime<Utc>) -> Result<Self, NodeError> {
        let nodes = config
            .nodes
            .iter()
            .map(|node| NodeHandler::from_settings(node, &config.github, config.timeout()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(nodes, started_at)?)
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.name()).collect()
    }

    /// Poll every node once and return all samples.
    ///
    /// Node samples follow the declared node order. Dropping the returned
    /// future cancels every node poll still in flight.
    pub async fn collect(&self) -> Vec<MetricInfo> {
        let mut tasks = JoinSet::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let node = Arc::clone(node);
            tasks.spawn(async move {
                let outcome = AssertUnwindSafe(node.process()).catch_unwind().await;
                (index, outcome)
            });
        }

        let mut metrics = self.collect_global().await;

        let mut reports: Vec<Option<NodeReport>> = self.nodes.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(Ok(report)))) => reports[index] = Some(report),
                Ok((index, Ok(Err(violation)))) => {
                    let node = self.nodes[index].name();
                    error!(node = %node, error = %violation, "Node processing failed");
                }
                Ok((index, Err(_))) => {
                    error!(node = %self.nodes[index].name(), "Node task panicked");
                }
                Err(e) => {
                    error!(error = %e, "Node task lost");
                }
            }
        }

        for (node, report) in self.nodes.iter().zip(reports) {
            if let Some(report) = report {
                metrics.extend(node_metrics(node.name(), report));
            }
        }

        debug!(nodes = self.nodes.len(), metrics = metrics.len(), "Collection finished");
        metrics
    }

    async fn collect_global(&self) -> Vec<MetricInfo> {
        self.try_collect_global().await.unwrap_or_else(|violation| {
            error!(error = %violation, "Global metrics failed");
            Vec::new()
        })
    }

    async fn try_collect_global(&self) -> Result<Vec<MetricInfo>, ContractViolation> {
        let run = self.global.fetch_all().await?;
        let mut metrics = Vec::new();
        for generator in &self.global_generators {
            metrics.extend(generator.generate(&run.state)?);
        }
        Ok(metrics)
    }
}

/// Node samples followed by one `query_successful` sample per query.
fn node_metrics(node: &str, report: NodeReport) -> Vec<MetricInfo> {
    let queries: Vec<MetricInfo> = report
        .queries()
        .map(|query| {
            MetricInfo::flag(MetricName::QuerySuccessful, query.success)
                .with_label("node", node)
                .with_label("module", query.module.as_str())
                .with_label("action", query.action)
        })
        .collect();

    let mut metrics = report.metrics;
    metrics.extend(queries);
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::{FetcherName, QueryInfo, QueryModule};
    use std::collections::BTreeMap;

    #[test]
    fn test_query_outcomes_become_metrics() {
        let report = NodeReport {
            metrics: vec![MetricInfo::new(MetricName::CatchingUp, 0.0).with_label("node", "hub")],
            queries: BTreeMap::from([
                (
                    FetcherName::NodeStatus,
                    vec![QueryInfo::succeeded(QueryModule::Tendermint, "status")],
                ),
                (
                    FetcherName::RemoteVersion,
                    vec![QueryInfo::failed(QueryModule::Github, "latest_release")],
                ),
            ]),
        };

        let metrics = node_metrics("hub", report);

        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics[1].name, MetricName::QuerySuccessful);
        assert_eq!(metrics[1].value, 1.0);
        assert_eq!(metrics[1].label("module"), Some("tendermint"));
        assert_eq!(metrics[1].label("action"), Some("status"));
        assert_eq!(metrics[2].value, 0.0);
        assert_eq!(metrics[2].label("module"), Some("github"));
        assert_eq!(metrics[2].label("node"), Some("hub"));
    }

    #[tokio::test]
    async fn test_global_metrics_without_nodes() {
        let app = App::new(vec![], Utc::now()).unwrap();
        let metrics = app.collect().await;

        let names: Vec<_> = metrics.iter().map(|m| m.name).collect();
        assert_eq!(names, vec![MetricName::AppVersion, MetricName::StartTime]);
    }
}
