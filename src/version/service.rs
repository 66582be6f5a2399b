//! HTTP semver resolution service client

use super::{Target, VersionSource};
use crate::error::{NodepackError, NodepackResult};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Resolves ranges with `GET {base}/{target}/resolve/{range}`.
///
/// The service answers with the exact version as a plain-text body.
#[derive(Debug, Clone)]
pub struct SemverService {
    base_url: String,
}

impl SemverService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Build the query URL; the range is percent-encoded as one path segment
    pub fn resolve_url(&self, target: Target, spec: &str) -> NodepackResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            NodepackError::resolution(target.to_string(), spec, format!("bad resolver URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                NodepackError::resolution(
                    target.to_string(),
                    spec,
                    format!("resolver URL cannot be a base: {}", self.base_url),
                )
            })?
            .pop_if_empty()
            .push(&target.to_string())
            .push("resolve")
            .push(spec);
        Ok(url)
    }
}

#[async_trait]
impl VersionSource for SemverService {
    async fn resolve(&self, target: Target, spec: &str) -> NodepackResult<String> {
        let url = self.resolve_url(target, spec)?;
        debug!("Resolving {} '{}' via {}", target, spec, url);

        let spec_owned = spec.to_string();
        tokio::task::spawn_blocking(move || {
            let failure = |reason: String| {
                NodepackError::resolution(target.to_string(), spec_owned.clone(), reason)
            };
            let mut response = ureq::get(url.as_str())
                .call()
                .map_err(|e| failure(e.to_string()))?;
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| failure(e.to_string()))?;
            Ok(body.trim().to_string())
        })
        .await
        .map_err(|e| NodepackError::Internal(format!("resolver task failed: {}", e)))?
    }
}
