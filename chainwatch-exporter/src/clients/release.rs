//! GitHub releases client
//!
//! Requests are conditional (`If-Modified-Since`) against the last seen
//! `Last-Modified`, so an unchanged release costs no rate limit. Every
//! `revalidate_interval` the release is fetched unconditionally; if the tag
//! changed while the API kept answering `304`, the cache was stale and a
//! warning is logged.

use super::{ClientError, ReleaseClient};
use crate::config::GithubSettings;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{ACCEPT, IF_MODIFIED_SINCE, LAST_MODIFIED, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Latest release of one GitHub repository
pub struct GithubReleaseClient {
    http: Client,
    url: String,
    token: Option<String>,
    revalidate_interval: Duration,
    cache: Mutex<Option<CachedRelease>>,
}

#[derive(Debug, Clone)]
struct CachedRelease {
    tag: String,
    last_modified: Option<String>,
    validated_at: Instant,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}

impl GithubReleaseClient {
    pub fn new(
        settings: &GithubSettings,
        org: &str,
        repo: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: format!(
                "{}/repos/{}/{}/releases/latest",
                settings.api_base.trim_end_matches('/'),
                org,
                repo
            ),
            token: settings.token.clone(),
            revalidate_interval: settings.revalidate_interval(),
            cache: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Cached release, and whether it is due for unconditional revalidation
    fn cached(&self) -> Option<(CachedRelease, bool)> {
        self.cache.lock().clone().map(|cached| {
            let expired = cached.validated_at.elapsed() >= self.revalidate_interval;
            (cached, expired)
        })
    }
}

#[async_trait]
impl ReleaseClient for GithubReleaseClient {
    async fn latest_release(&self) -> Result<String, ClientError> {
        let cached = self.cached();
        let revalidating = matches!(cached, Some((_, true)));
        let if_modified_since = match &cached {
            Some((release, false)) => release.last_modified.clone(),
            _ => None,
        };
        let cached_tag = cached.map(|(release, _)| release.tag);

        let mut request = self
            .http
            .get(&self.url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, concat!("chainwatch/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(since) = &if_modified_since {
            request = request.header(IF_MODIFIED_SINCE, since);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            if let (Some(_), Some(tag)) = (&if_modified_since, &cached_tag) {
                debug!(url = %self.url, tag = %tag, "Release not modified");
                return Ok(tag.clone());
            }
        }
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let release: Release = serde_json::from_slice(&response.bytes().await?)?;

        if revalidating {
            if let Some(previous) = cached_tag.filter(|t| *t != release.tag_name) {
                warn!(
                    url = %self.url,
                    cached = %previous,
                    latest = %release.tag_name,
                    "Release changed while conditional requests reported it unmodified"
                );
            }
        }

        *self.cache.lock() = Some(CachedRelease {
            tag: release.tag_name.clone(),
            last_modified,
            validated_at: Instant::now(),
        });

        Ok(release.tag_name)
    }
}
