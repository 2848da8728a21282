//! Configuration management for the chainwatch exporter
//!
//! Loaded from a TOML file with one `[[node]]` table per monitored node.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Complete exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the metrics endpoint listens on
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Timeout applied to every client call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Logging configuration
    #[serde(default)]
    pub log: LogSettings,

    /// Release lookups
    #[serde(default)]
    pub github: GithubSettings,

    /// Monitored nodes
    #[serde(default, rename = "node")]
    pub nodes: Vec<NodeSettings>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            timeout_secs: default_timeout_secs(),
            log: LogSettings::default(),
            github: GithubSettings::default(),
            nodes: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    ///
    /// The result is not validated; call [`AppConfig::validate`] once the
    /// command line overrides are applied.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_secs cannot be 0".to_string(),
            ));
        }

        if self.nodes.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one [[node]] must be configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for node in &self.nodes {
            node.validate()?;
            if !names.insert(node.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "node name {:?} is used more than once",
                    node.name
                )));
            }
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, listen_address: Option<String>, verbose: bool) -> Self {
        if let Some(addr) = listen_address {
            self.listen_address = addr;
        }
        if verbose {
            self.log.level = "debug".to_string();
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed listen address, the same check [`AppConfig::validate`] applies
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_address.parse::<SocketAddr>().map_err(|e| {
            ConfigError::ValidationError(format!(
                "listen_address {:?} is not a socket address: {}",
                self.listen_address, e
            ))
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `chainwatch_core=debug,info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// GitHub releases API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubSettings {
    #[serde(default = "default_github_api")]
    pub api_base: String,

    /// Personal access token, raises the API rate limit
    #[serde(default)]
    pub token: Option<String>,

    /// How often a cached release is re-fetched unconditionally, in seconds
    #[serde(default = "default_revalidate_interval")]
    pub revalidate_interval_secs: u64,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_base: default_github_api(),
            token: None,
            revalidate_interval_secs: default_revalidate_interval(),
        }
    }
}

impl GithubSettings {
    pub fn revalidate_interval(&self) -> Duration {
        Duration::from_secs(self.revalidate_interval_secs)
    }
}

/// One monitored node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Name used as the `node` label
    pub name: String,

    #[serde(default)]
    pub tendermint: TendermintSettings,

    #[serde(default)]
    pub cosmovisor: CosmovisorSettings,

    /// gRPC integration, only configured when the section exists
    #[serde(default)]
    pub grpc: Option<GrpcSettings>,

    /// Release tracking, only configured when the section exists
    #[serde(default)]
    pub git: Option<GitSettings>,
}

impl NodeSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tendermint: TendermintSettings::default(),
            cosmovisor: CosmovisorSettings::default(),
            grpc: None,
            git: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "node name cannot be empty".to_string(),
            ));
        }

        if self.tendermint.enabled {
            validate_url(&self.name, "tendermint.address", &self.tendermint.address)?;
        }

        if let Some(grpc) = self.grpc.as_ref().filter(|g| g.enabled) {
            validate_url(&self.name, "grpc.address", &grpc.address)?;
        }

        if self.cosmovisor.enabled {
            if self.cosmovisor.home.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "node {}: cosmovisor.home is required when cosmovisor is enabled",
                    self.name
                )));
            }
            if self.cosmovisor.daemon_name.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "node {}: cosmovisor.daemon_name is required when cosmovisor is enabled",
                    self.name
                )));
            }
        }

        if let Some(git) = &self.git {
            git.github_repository().ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "node {}: git.repository {:?} is not a https://github.com/<org>/<repo> link",
                    self.name, git.repository
                ))
            })?;
        }

        Ok(())
    }
}

/// Tendermint RPC integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TendermintSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_tendermint_address")]
    pub address: String,
}

impl Default for TendermintSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            address: default_tendermint_address(),
        }
    }
}

/// Cosmovisor integration
///
/// Disabled unless the section is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CosmovisorSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `DAEMON_HOME` of the chain, e.g. `/root/.gaia`
    #[serde(default)]
    pub home: PathBuf,

    /// `DAEMON_NAME`, the chain binary name, e.g. `gaiad`
    #[serde(default)]
    pub daemon_name: String,

    /// Path to the cosmovisor binary
    #[serde(default = "default_cosmovisor_binary")]
    pub binary: PathBuf,
}

impl Default for CosmovisorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            home: PathBuf::new(),
            daemon_name: String::new(),
            binary: default_cosmovisor_binary(),
        }
    }
}

/// gRPC integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_grpc_address")]
    pub address: String,
}

/// Release tracking of the chain binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// e.g. `https://github.com/cosmos/gaia`
    pub repository: String,
}

impl GitSettings {
    /// Split the repository link into `(org, repo)`.
    pub fn github_repository(&self) -> Option<(String, String)> {
        let path = self
            .repository
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .strip_prefix("https://github.com/")?;

        match path.split('/').collect::<Vec<_>>().as_slice() {
            [org, repo] if !org.is_empty() && !repo.is_empty() => {
                Some((org.to_string(), repo.to_string()))
            }
            _ => None,
        }
    }
}

fn validate_url(node: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "node {}: {} {:?} must start with http:// or https://",
            node, field, value
        )))
    }
}

fn default_true() -> bool {
    true
}

fn default_listen_address() -> String {
    "0.0.0.0:9500".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_revalidate_interval() -> u64 {
    3600
}

fn default_tendermint_address() -> String {
    "http://localhost:26657".to_string()
}

fn default_grpc_address() -> String {
    "http://localhost:9090".to_string()
}

fn default_cosmovisor_binary() -> PathBuf {
    PathBuf::from("cosmovisor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL: &str = r#"
        listen_address = "127.0.0.1:9300"
        timeout_secs = 5

        [log]
        level = "debug"
        json = true

        [github]
        token = "ghp_test"

        [[node]]
        name = "cosmoshub"

        [node.tendermint]
        address = "http://10.0.0.1:26657"

        [node.cosmovisor]
        home = "/root/.gaia"
        daemon_name = "gaiad"

        [node.grpc]
        address = "http://10.0.0.1:9090"

        [node.git]
        repository = "https://github.com/cosmos/gaia"

        [[node]]
        name = "osmosis"

        [node.tendermint]
        enabled = false
    "#;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.listen_address, "0.0.0.0:9500");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.github.api_base, "https://api.github.com");
        assert!(config.nodes.is_empty());
    }

    #[test]
    fn test_config_from_toml() {
        let config: AppConfig = toml::from_str(FULL).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.listen_address, "127.0.0.1:9300");
        assert!(config.log.json);
        assert_eq!(config.github.token.as_deref(), Some("ghp_test"));
        assert_eq!(config.github.revalidate_interval_secs, 3600);
        assert_eq!(config.nodes.len(), 2);

        let hub = &config.nodes[0];
        assert!(hub.tendermint.enabled);
        assert!(hub.cosmovisor.enabled);
        assert_eq!(hub.cosmovisor.binary, PathBuf::from("cosmovisor"));
        assert!(hub.grpc.as_ref().is_some_and(|g| g.enabled));
        assert_eq!(
            hub.git.as_ref().and_then(|g| g.github_repository()),
            Some(("cosmos".to_string(), "gaia".to_string()))
        );

        let osmosis = &config.nodes[1];
        assert!(!osmosis.tendermint.enabled);
        assert!(!osmosis.cosmovisor.enabled);
        assert!(osmosis.grpc.is_none());
        assert!(osmosis.git.is_none());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.nodes[0].name, "cosmoshub");
    }

    #[test]
    fn test_config_validation_requires_nodes() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_config_validation_rejects_duplicate_names() {
        let mut config = AppConfig::default();
        config.nodes = vec![NodeSettings::new("hub"), NodeSettings::new("hub")];

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_config_validation_cosmovisor_needs_home() {
        let mut node = NodeSettings::new("hub");
        node.cosmovisor.enabled = true;
        node.cosmovisor.daemon_name = "gaiad".to_string();

        assert!(node.validate().is_err());

        node.cosmovisor.home = PathBuf::from("/root/.gaia");
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_address() {
        let mut node = NodeSettings::new("hub");
        node.tendermint.address = "localhost:26657".to_string();
        assert!(node.validate().is_err());

        node.tendermint.enabled = false;
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_github_repository_parsing() {
        let git = |repository: &str| GitSettings {
            enabled: true,
            repository: repository.to_string(),
        };

        assert_eq!(
            git("https://github.com/osmosis-labs/osmosis.git").github_repository(),
            Some(("osmosis-labs".to_string(), "osmosis".to_string()))
        );
        assert_eq!(
            git("https://github.com/cosmos/gaia/").github_repository(),
            Some(("cosmos".to_string(), "gaia".to_string()))
        );
        assert_eq!(git("https://gitlab.com/a/b").github_repository(), None);
        assert_eq!(git("https://github.com/cosmos").github_repository(), None);
    }

    #[test]
    fn test_listen_override_is_validated_after_loading() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL.replace("127.0.0.1:9300", "not-an-address").as_bytes())
            .unwrap();

        let loaded = AppConfig::from_file(file.path()).unwrap();
        assert!(loaded.validate().is_err());

        let config = loaded.with_overrides(Some("127.0.0.1:9400".to_string()), false);
        config.validate().unwrap();
        assert_eq!(
            config.listen_addr().unwrap(),
            "127.0.0.1:9400".parse::<SocketAddr>().unwrap()
        );

        let broken = config.with_overrides(Some("localhost".to_string()), false);
        let err = broken.validate().unwrap_err();
        assert!(err.to_string().contains("\"localhost\" is not a socket address"));
    }

    #[test]
    fn test_config_overrides() {
        let config = AppConfig::default().with_overrides(Some("127.0.0.1:1".to_string()), true);
        assert_eq!(config.listen_address, "127.0.0.1:1");
        assert_eq!(config.log.level, "debug");
    }
}
