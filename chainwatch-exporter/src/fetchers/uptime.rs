//! Exporter start time, the only global fetcher

use async_trait::async_trait;
use chainwatch_core::{Dependencies, Fetched, Fetcher, FetcherName, Result};
use chrono::{DateTime, Utc};

pub struct UptimeFetcher {
    started_at: DateTime<Utc>,
}

impl UptimeFetcher {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }
}

#[async_trait]
impl Fetcher for UptimeFetcher {
    fn name(&self) -> FetcherName {
        FetcherName::Uptime
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn get(&self, _deps: Dependencies) -> Result<Fetched> {
        Ok(Fetched::new(self.started_at, vec![]))
    }
}
