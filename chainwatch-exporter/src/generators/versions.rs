//! Cosmovisor, local and released versions

use super::trim_version;
use chainwatch_core::{FetcherName, Generator, MetricInfo, MetricName, Result, State, VersionInfo};

pub struct CosmovisorVersionGenerator;

impl Generator for CosmovisorVersionGenerator {
    fn name(&self) -> &'static str {
        "cosmovisor_version"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        Ok(state
            .get::<String>(FetcherName::CosmovisorVersion)?
            .map(|v| {
                MetricInfo::new(MetricName::CosmovisorVersion, 1.0)
                    .with_label("version", trim_version(v))
            })
            .into_iter()
            .collect())
    }
}

/// Build information of the running chain binary
pub struct LocalVersionGenerator;

impl Generator for LocalVersionGenerator {
    fn name(&self) -> &'static str {
        "local_version"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        Ok(state
            .get::<VersionInfo>(FetcherName::LocalVersion)?
            .map(|info| {
                MetricInfo::new(MetricName::LocalVersion, 1.0)
                    .with_label("version", trim_version(&info.version))
                    .with_label("name", &info.name)
                    .with_label("app_name", &info.server_name)
                    .with_label("git_commit", &info.commit)
                    .with_label(
                        "cosmos_sdk_version",
                        trim_version(&info.cosmos_sdk_version),
                    )
                    .with_label("go_version", &info.go)
                    .with_label("build_tags", &info.build_tags)
            })
            .into_iter()
            .collect())
    }
}

pub struct RemoteVersionGenerator;

impl Generator for RemoteVersionGenerator {
    fn name(&self) -> &'static str {
        "remote_version"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        Ok(state
            .get::<String>(FetcherName::RemoteVersion)?
            .map(|v| {
                MetricInfo::new(MetricName::RemoteVersion, 1.0)
                    .with_label("version", trim_version(v))
            })
            .into_iter()
            .collect())
    }
}

/// Whether the local binary is at least the latest release
///
/// Compared as semver; a version that does not parse yields no sample.
pub struct IsLatestGenerator;

impl Generator for IsLatestGenerator {
    fn name(&self) -> &'static str {
        "is_latest"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        let local = state.get::<VersionInfo>(FetcherName::LocalVersion)?;
        let remote = state.get::<String>(FetcherName::RemoteVersion)?;
        let (Some(local), Some(remote)) = (local, remote) else {
            return Ok(vec![]);
        };

        let local_version = trim_version(&local.version);
        let remote_version = trim_version(remote);
        let (Ok(local_semver), Ok(remote_semver)) = (
            semver::Version::parse(local_version),
            semver::Version::parse(remote_version),
        ) else {
            return Ok(vec![]);
        };

        Ok(vec![MetricInfo::flag(
            MetricName::IsLatest,
            local_semver >= remote_semver,
        )
        .with_label("local_version", local_version)
        .with_label("remote_version", remote_version)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn state(local: &str, remote: &str) -> State {
        State::new()
            .with(
                FetcherName::LocalVersion,
                VersionInfo {
                    name: "gaia".to_string(),
                    server_name: "gaiad".to_string(),
                    version: local.to_string(),
                    commit: "abc123".to_string(),
                    build_tags: "netgo,ledger".to_string(),
                    go: "go version go1.20.3 linux/amd64".to_string(),
                    cosmos_sdk_version: "v0.47.5".to_string(),
                },
            )
            .with(FetcherName::RemoteVersion, remote.to_string())
    }

    #[test]
    fn test_version_labels_strip_leading_v() {
        let state = state("v1.5.0", "1.6.0");

        let local = LocalVersionGenerator.generate(&state).unwrap();
        assert_eq!(local[0].label("version"), Some("1.5.0"));
        assert_eq!(local[0].label("app_name"), Some("gaiad"));
        assert_eq!(local[0].label("cosmos_sdk_version"), Some("0.47.5"));
        assert_eq!(local[0].label("git_commit"), Some("abc123"));

        let remote = RemoteVersionGenerator.generate(&state).unwrap();
        assert_eq!(remote[0].label("version"), Some("1.6.0"));
    }

    #[test]
    fn test_is_latest() {
        let behind = IsLatestGenerator.generate(&state("v1.5.0", "v1.6.0")).unwrap();
        assert_eq!(
            behind,
            vec![MetricInfo::flag(MetricName::IsLatest, false)
                .with_label("local_version", "1.5.0")
                .with_label("remote_version", "1.6.0")]
        );

        let equal = IsLatestGenerator.generate(&state("v1.6.0", "v1.6.0")).unwrap();
        assert_eq!(equal[0].value, 1.0);

        let ahead = IsLatestGenerator.generate(&state("v1.7.0-rc1", "v1.6.0")).unwrap();
        assert_eq!(ahead[0].value, 1.0);
    }

    #[test]
    fn test_is_latest_unparsable_version() {
        assert!(IsLatestGenerator
            .generate(&state("main-abc123", "v1.6.0"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_is_latest_needs_both_versions() {
        let state = State::new().with(FetcherName::RemoteVersion, "v1.6.0".to_string());
        assert!(IsLatestGenerator.generate(&state).unwrap().is_empty());
    }

    #[test]
    fn test_cosmovisor_version() {
        let state = State::new().with(FetcherName::CosmovisorVersion, "v1.5.0".to_string());
        let metrics = CosmovisorVersionGenerator.generate(&state).unwrap();
        assert_eq!(metrics[0].label("version"), Some("1.5.0"));
    }
}
