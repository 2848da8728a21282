//! Per-node processing
//!
//! A [`NodeHandler`] owns the clients of one monitored node, the fetcher set
//! derived from them and the node generators. Each call to
//! [`NodeHandler::process`] is one complete poll of the node.

use crate::clients::{
    ClientError, CosmovisorClient, GithubReleaseClient, GrpcNodeConfigClient,
    HttpTendermintClient, NodeConfigClient, ProcessCosmovisorClient, ReleaseClient,
    TendermintClient,
};
use crate::config::{GithubSettings, NodeSettings};
use crate::fetchers::node_fetchers;
use crate::generators::node_generators;
use chainwatch_core::{
    ContractViolation, Controller, FetcherName, Generator, MetricInfo, MetricName, QueryInfo,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Node setup errors
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Client setup failed for node {node}: {source}")]
    Client {
        node: String,
        #[source]
        source: ClientError,
    },

    #[error("Invalid fetcher set: {0}")]
    Contract(#[from] ContractViolation),
}

/// Integrations that can be configured for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integration {
    Tendermint,
    Cosmovisor,
    Grpc,
    Git,
}

impl Integration {
    pub fn as_str(&self) -> &'static str {
        match self {
            Integration::Tendermint => "tendermint",
            Integration::Cosmovisor => "cosmovisor",
            Integration::Grpc => "grpc",
            Integration::Git => "git",
        }
    }
}

/// Clients of one node; `None` means the integration is disabled
#[derive(Clone, Default)]
pub struct NodeClients {
    pub tendermint: Option<Arc<dyn TendermintClient>>,
    pub cosmovisor: Option<Arc<dyn CosmovisorClient>>,
    pub grpc: Option<Arc<dyn NodeConfigClient>>,
    pub release: Option<Arc<dyn ReleaseClient>>,
}

impl NodeClients {
    /// Build production clients for every enabled integration.
    pub fn from_settings(
        settings: &NodeSettings,
        github: &GithubSettings,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let mut clients = NodeClients::default();

        if settings.tendermint.enabled {
            clients.tendermint = Some(Arc::new(HttpTendermintClient::new(
                settings.tendermint.address.clone(),
                timeout,
            )?));
        }

        if settings.cosmovisor.enabled {
            clients.cosmovisor = Some(Arc::new(ProcessCosmovisorClient::new(
                &settings.cosmovisor,
                timeout,
            )));
        }

        if let Some(grpc) = settings.grpc.as_ref().filter(|g| g.enabled) {
            clients.grpc = Some(Arc::new(GrpcNodeConfigClient::new(&grpc.address, timeout)?));
        }

        if let Some(git) = settings.git.as_ref().filter(|g| g.enabled) {
            if let Some((org, repo)) = git.github_repository() {
                clients.release = Some(Arc::new(GithubReleaseClient::new(
                    github, &org, &repo, timeout,
                )?));
            }
        }

        Ok(clients)
    }

    fn is_enabled(&self, integration: Integration) -> bool {
        match integration {
            Integration::Tendermint => self.tendermint.is_some(),
            Integration::Cosmovisor => self.cosmovisor.is_some(),
            Integration::Grpc => self.grpc.is_some(),
            Integration::Git => self.release.is_some(),
        }
    }
}

/// Result of one node poll
#[derive(Debug, Clone, Default)]
pub struct NodeReport {
    /// Every sample carries a `node` label
    pub metrics: Vec<MetricInfo>,
    pub queries: BTreeMap<FetcherName, Vec<QueryInfo>>,
}

impl NodeReport {
    pub fn queries(&self) -> impl Iterator<Item = &QueryInfo> {
        self.queries.values().flatten()
    }
}

pub struct NodeHandler {
    name: String,
    clients: NodeClients,
    integrations: Vec<Integration>,
    controller: Controller,
    generators: Vec<Box<dyn Generator>>,
}

impl NodeHandler {
    /// Create a handler for `clients`.
    ///
    /// `integrations` lists the integrations configured for the node; each
    /// gets an `integration_enabled` sample on every poll.
    pub fn new(
        name: impl Into<String>,
        clients: NodeClients,
        integrations: Vec<Integration>,
    ) -> Result<Self, NodeError> {
        let name = name.into();
        let controller = Controller::new(name.clone(), node_fetchers(&clients))?;

        Ok(Self {
            name,
            clients,
            integrations,
            controller,
            generators: node_generators(),
        })
    }

    pub fn from_settings(
        settings: &NodeSettings,
        github: &GithubSettings,
        timeout: Duration,
    ) -> Result<Self, NodeError> {
        let clients =
            NodeClients::from_settings(settings, github, timeout).map_err(|source| {
                NodeError::Client {
                    node: settings.name.clone(),
                    source,
                }
            })?;

        let mut integrations = vec![Integration::Tendermint, Integration::Cosmovisor];
        if settings.grpc.is_some() {
            integrations.push(Integration::Grpc);
        }
        if settings.git.is_some() {
            integrations.push(Integration::Git);
        }

        let handler = Self::new(settings.name.clone(), clients, integrations)?;
        info!(
            node = %handler.name,
            integrations = ?handler.enabled_integrations(),
            "Node configured"
        );
        Ok(handler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enabled_integrations(&self) -> Vec<&'static str> {
        self.integrations
            .iter()
            .filter(|i| self.clients.is_enabled(**i))
            .map(Integration::as_str)
            .collect()
    }

    /// Poll the node once.
    pub async fn process(&self) -> Result<NodeReport, ContractViolation> {
        let started = Instant::now();
        let run = self.controller.fetch_all().await?;

        let mut metrics = Vec::new();
        for generator in &self.generators {
            metrics.extend(generator.generate(&run.state)?);
        }

        for integration in &self.integrations {
            metrics.push(
                MetricInfo::flag(
                    MetricName::IntegrationEnabled,
                    self.clients.is_enabled(*integration),
                )
                .with_label("integration", integration.as_str()),
            );
        }

        let metrics: Vec<MetricInfo> = metrics
            .into_iter()
            .map(|m| m.with_label("node", &self.name))
            .collect();

        debug!(
            node = %self.name,
            metrics = metrics.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Node processed"
        );

        Ok(NodeReport {
            metrics,
            queries: run.queries,
        })
    }
}
