//! Fetchers backed by cosmovisor

use super::record;
use crate::clients::CosmovisorClient;
use async_trait::async_trait;
use chainwatch_core::{Dependencies, Fetched, Fetcher, FetcherName, QueryModule, Result};
use std::sync::Arc;

macro_rules! cosmovisor_fetcher {
    ($(#[$doc:meta])* $fetcher:ident, $name:ident, $action:literal, |$client:ident| $call:expr) => {
        $(#[$doc])*
        pub struct $fetcher {
            client: Option<Arc<dyn CosmovisorClient>>,
        }

        impl $fetcher {
            pub fn new(client: Option<Arc<dyn CosmovisorClient>>) -> Self {
                Self { client }
            }
        }

        #[async_trait]
        impl Fetcher for $fetcher {
            fn name(&self) -> FetcherName {
                FetcherName::$name
            }

            fn enabled(&self) -> bool {
                self.client.is_some()
            }

            async fn get(&self, _deps: Dependencies) -> Result<Fetched> {
                let Some($client) = &self.client else {
                    return Ok(Fetched::absent());
                };

                let mut queries = Vec::new();
                let value = record(&mut queries, QueryModule::Cosmovisor, $action, $call.await);
                Ok(Fetched::new(value, queries))
            }
        }
    };
}

cosmovisor_fetcher!(
    /// Version of cosmovisor itself
    CosmovisorVersionFetcher,
    CosmovisorVersion,
    "get_cosmovisor_version",
    |client| client.cosmovisor_version()
);

cosmovisor_fetcher!(
    /// Build information of the chain binary cosmovisor currently runs
    LocalVersionFetcher,
    LocalVersion,
    "get_app_version",
    |client| client.app_version()
);

cosmovisor_fetcher!(
    /// Installed upgrade binaries
    CosmovisorUpgradesFetcher,
    CosmovisorUpgrades,
    "get_upgrades",
    |client| client.upgrades()
);

/// Upgrade recorded in `upgrade-info.json`, absent when the file is missing
pub struct CosmovisorUpgradeInfoFetcher {
    client: Option<Arc<dyn CosmovisorClient>>,
}

impl CosmovisorUpgradeInfoFetcher {
    pub fn new(client: Option<Arc<dyn CosmovisorClient>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for CosmovisorUpgradeInfoFetcher {
    fn name(&self) -> FetcherName {
        FetcherName::CosmovisorUpgradeInfo
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
            QueryModule::Cosmovisor,
            "get_upgrade_info",
            client.upgrade_info().await,
        )
        .flatten();
        Ok(Fetched::new(plan, queries))
    }
}
