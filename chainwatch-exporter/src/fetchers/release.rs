//! Latest published release of the chain binary

use super::record;
use crate::clients::ReleaseClient;
use async_trait::async_trait;
use chainwatch_core::{Dependencies, Fetched, Fetcher, FetcherName, QueryModule, Result};
use std::sync::Arc;

pub struct RemoteVersionFetcher {
    client: Option<Arc<dyn ReleaseClient>>,
}

impl RemoteVersionFetcher {
    pub fn new(client: Option<Arc<dyn ReleaseClient>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for RemoteVersionFetcher {
    fn name(&self) -> FetcherName {
        FetcherName::RemoteVersion
    }

    fn enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn get(&self, _deps: Dependencies) -> Result<Fetched> {
        let Some(client) = &self.client else {
            return Ok(Fetched::absent());
        };

        let mut queries = Vec::new();
        let tag = record(
            &mut queries,
            QueryModule::Github,
            "latest_release",
            client.latest_release().await,
        );
        Ok(Fetched::new(tag, queries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fakes::FakeRelease;
    use chainwatch_core::{QueryInfo, StateValue};

    #[tokio::test]
    async fn test_remote_version() {
        let fetcher = RemoteVersionFetcher::new(Some(Arc::new(FakeRelease(Some(
            "v16.0.0".to_string(),
        )))));

        let fetched = fetcher
            .get(Dependencies::none(FetcherName::RemoteVersion))
            .await
            .unwrap();

        assert_eq!(fetched.value, StateValue::Version("v16.0.0".to_string()));
        assert_eq!(
            fetched.queries,
            vec![QueryInfo::succeeded(QueryModule::Github, "latest_release")]
        );
    }

    #[tokio::test]
    async fn test_remote_version_failure() {
        let fetcher = RemoteVersionFetcher::new(Some(Arc::new(FakeRelease(None))));

        let fetched = fetcher
            .get(Dependencies::none(FetcherName::RemoteVersion))
            .await
            .unwrap();

        assert!(fetched.value.is_absent());
        assert_eq!(
            fetched.queries,
            vec![QueryInfo::failed(QueryModule::Github, "latest_release")]
        );
    }
}
