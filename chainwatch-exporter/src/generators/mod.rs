//! Generator implementations
//!
//! One generator per metric family. Generators only read the finished
//! [`State`](chainwatch_core::State); a missing input yields no samples.

mod exporter;
mod node_config;
mod node_status;
mod upgrades;
mod versions;

pub use exporter::{AppVersionGenerator, StartTimeGenerator};
pub use node_config::NodeConfigGenerator;
pub use node_status::{
    BlockTimeGenerator, CatchingUpGenerator, LatestBlockGenerator, NodeInfoGenerator,
    VotingPowerGenerator,
};
pub use upgrades::{UpgradeBinaryGenerator, UpgradeEstimatedTimeGenerator, UpgradeInfoGenerator};
pub use versions::{
    CosmovisorVersionGenerator, IsLatestGenerator, LocalVersionGenerator, RemoteVersionGenerator,
};

use chainwatch_core::Generator;

/// Per-node generators, in output order
pub fn node_generators() -> Vec<Box<dyn Generator>> {
    vec![
        Box::new(NodeInfoGenerator),
        Box::new(CatchingUpGenerator),
        Box::new(LatestBlockGenerator),
        Box::new(VotingPowerGenerator),
        Box::new(BlockTimeGenerator),
        Box::new(CosmovisorVersionGenerator),
        Box::new(LocalVersionGenerator),
        Box::new(RemoteVersionGenerator),
        Box::new(IsLatestGenerator),
        Box::new(UpgradeInfoGenerator),
        Box::new(UpgradeBinaryGenerator),
        Box::new(UpgradeEstimatedTimeGenerator),
        Box::new(NodeConfigGenerator),
    ]
}

/// Generators that do not depend on any node
pub fn global_generators() -> Vec<Box<dyn Generator>> {
    vec![
        Box::new(AppVersionGenerator::new(env!("CARGO_PKG_VERSION"))),
        Box::new(StartTimeGenerator),
    ]
}

/// Strip one leading `v` from a version string.
pub fn trim_version(version: &str) -> &str {
    version.strip_prefix('v').unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::State;

    #[test]
    fn test_trim_version() {
        assert_eq!(trim_version("v1.5.0"), "1.5.0");
        assert_eq!(trim_version("1.5.0"), "1.5.0");
        assert_eq!(trim_version("vv2"), "v2");
        assert_eq!(trim_version(""), "");
    }

    #[test]
    fn test_empty_state_produces_nothing() {
        let state = State::new();
        for generator in node_generators() {
            assert!(
                generator.generate(&state).unwrap().is_empty(),
                "{} produced samples from nothing",
                generator.name()
            );
        }
    }
}
