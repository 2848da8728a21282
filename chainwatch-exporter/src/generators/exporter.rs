//! Exporter-wide metrics, not tied to any node

use chainwatch_core::{FetcherName, Generator, MetricInfo, MetricName, Result, State};
use chrono::{DateTime, Utc};

/// `app_version{version}`, always emitted
pub struct AppVersionGenerator {
    version: &'static str,
}

impl AppVersionGenerator {
    pub fn new(version: &'static str) -> Self {
        Self { version }
    }
}

impl Generator for AppVersionGenerator {
    fn name(&self) -> &'static str {
        "app_version"
    }

    fn generate(&self, _state: &State) -> Result<Vec<MetricInfo>> {
        Ok(vec![
            MetricInfo::new(MetricName::AppVersion, 1.0).with_label("version", self.version)
        ])
    }
}

pub struct StartTimeGenerator;

impl Generator for StartTimeGenerator {
    fn name(&self) -> &'static str {
        "start_time"
    }

    fn generate(&self, state: &State) -> Result<Vec<MetricInfo>> {
        Ok(state
            .get::<DateTime<Utc>>(FetcherName::Uptime)?
            .map(|started| MetricInfo::new(MetricName::StartTime, started.timestamp() as f64))
            .into_iter()
            .collect())
    }
}
