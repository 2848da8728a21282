//! Cosmovisor client
//!
//! Runs the cosmovisor binary with `DAEMON_HOME` and `DAEMON_NAME` set and
//! reads its data directory:
//! - `$DAEMON_HOME/data/upgrade-info.json` - upgrade the node halted for
//! - `$DAEMON_HOME/cosmovisor/upgrades/<name>/bin/<DAEMON_NAME>` - installed binaries

use super::{ClientError, CosmovisorClient};
use crate::config::CosmovisorSettings;
use async_trait::async_trait;
use chainwatch_core::{UpgradePlan, VersionInfo};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

const VERSION_PREFIX: &str = "cosmovisor version:";

/// Cosmovisor driven through subprocess calls
pub struct ProcessCosmovisorClient {
    binary: PathBuf,
    home: PathBuf,
    daemon_name: String,
    timeout: Duration,
}

impl ProcessCosmovisorClient {
    pub fn new(settings: &CosmovisorSettings, timeout: Duration) -> Self {
        Self {
            binary: settings.binary.clone(),
            home: settings.home.clone(),
            daemon_name: settings.daemon_name.clone(),
            timeout,
        }
    }

    fn upgrade_info_path(&self) -> PathBuf {
        self.home.join("data").join("upgrade-info.json")
    }

    fn upgrades_dir(&self) -> PathBuf {
        self.home.join("cosmovisor").join("upgrades")
    }

    /// Run cosmovisor and return stdout followed by stderr.
    async fn run(&self, args: &[&str]) -> Result<String, ClientError> {
        debug!(binary = ?self.binary, ?args, "Running cosmovisor");

        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .env("DAEMON_HOME", &self.home)
            .env("DAEMON_NAME", &self.daemon_name)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))??;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ClientError::Process(format!(
                "cosmovisor {} exited with {}: {}",
                args.join(" "),
                output.status,
                combined.trim()
            )));
        }

        Ok(combined)
    }
}

#[async_trait]
impl CosmovisorClient for ProcessCosmovisorClient {
    async fn cosmovisor_version(&self) -> Result<String, ClientError> {
        let output = self.run(&["version"]).await?;
        parse_cosmovisor_version(&output)
    }

    async fn app_version(&self) -> Result<VersionInfo, ClientError> {
        let output = self
            .run(&["run", "version", "--long", "--output", "json"])
            .await?;
        let json = first_json_line(&output).ok_or_else(|| {
            ClientError::Decode("no JSON object in version output".to_string())
        })?;
        Ok(serde_json::from_str(json)?)
    }

    async fn upgrade_info(&self) -> Result<Option<UpgradePlan>, ClientError> {
        let path = self.upgrade_info_path();
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Some(serde_json::from_slice(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn upgrades(&self) -> Result<BTreeSet<String>, ClientError> {
        let mut entries = match tokio::fs::read_dir(self.upgrades_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut upgrades = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await? {
            let binary = entry.path().join("bin").join(&self.daemon_name);
            if is_file(&binary).await {
                upgrades.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(upgrades)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Find `cosmovisor version: v1.5.0` among the output lines.
fn parse_cosmovisor_version(output: &str) -> Result<String, ClientError> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix(VERSION_PREFIX))
        .map(|version| version.trim().to_string())
        .filter(|version| !version.is_empty())
        .ok_or_else(|| ClientError::Decode("no cosmovisor version in output".to_string()))
}

/// Cosmovisor logs around the wrapped command, so the JSON payload is the
/// first line that opens an object.
fn first_json_line(output: &str) -> Option<&str> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with('{'))
}
