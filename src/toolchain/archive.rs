//! Node binary archive download and extraction

use crate::error::{NodepackError, NodepackResult};
use crate::ui::{DownloadProgress, UiContext};
use crate::version::ExactVersion;
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::debug;

/// Platform triple of the published binaries
const PLATFORM: &str = "linux-x64";

/// Deterministic archive location for a node version
pub fn node_archive_url(mirror: &str, version: &ExactVersion) -> String {
    format!(
        "{mirror}/v{v}/node-v{v}-{PLATFORM}.tar.gz",
        mirror = mirror.trim_end_matches('/'),
        v = version,
    )
}

/// External "fetch archive and unpack it locally" capability
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Download the gzip tarball at `url` and unpack it into `dest`
    async fn fetch_and_extract(&self, url: &str, dest: &Path) -> NodepackResult<()>;
}

/// Streams a tarball over HTTP straight into the extractor
#[derive(Debug, Clone)]
pub struct HttpArchiveFetcher {
    interactive: bool,
}

impl HttpArchiveFetcher {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            interactive: ctx.use_fancy_output(),
        }
    }
}

#[async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch_and_extract(&self, url: &str, dest: &Path) -> NodepackResult<()> {
        debug!("Downloading {} into {}", url, dest.display());

        let url = url.to_string();
        let dest: PathBuf = dest.to_path_buf();
        let interactive = self.interactive;

        tokio::task::spawn_blocking(move || {
            let fetch_error = |reason: String| NodepackError::Fetch {
                url: url.clone(),
                reason,
            };

            let response = ureq::get(&url)
                .call()
                .map_err(|e| fetch_error(e.to_string()))?;
            let total = response
                .headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            let label = url.rsplit('/').next().unwrap_or("archive").to_string();
            let progress = DownloadProgress::new(interactive, &label, total);
            let reader = progress.wrap(response.into_body().into_reader());

            let mut archive = Archive::new(GzDecoder::new(reader));
            let result = archive.unpack(&dest).map_err(|e| NodepackError::Extract {
                path: dest.clone(),
                reason: e.to_string(),
            });
            progress.finish();
            result
        })
        .await
        .map_err(|e| NodepackError::Internal(format!("download task failed: {}", e)))?
    }
}
