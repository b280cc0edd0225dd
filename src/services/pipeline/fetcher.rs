use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Client as HttpClient;
use tokio::io::AsyncWriteExt;

use crate::config::DatasetConfig;
use crate::models::trip::partition_file_name;
use crate::services::pipeline::error::{EtlError, EtlResult};

/// One monthly trip file: where it lives remotely and where it is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub year: i32,
    pub month: u32,
    pub url: String,
    pub local_path: PathBuf,
}

/// Transport that copies a remote resource to a local file.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> EtlResult<()>;
}

/// Plain HTTP(S) GET, streamed to disk.
pub struct HttpDownloader {
    http_client: HttpClient,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            http_client: HttpClient::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> EtlResult<()> {
        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| EtlError::fetch(url, e))?;

        if !response.status().is_success() {
            return Err(EtlError::fetch(
                url,
                format!("HTTP request failed with status: {}", response.status()),
            ));
        }

        // Write next to the target and rename at the end; a file at `dest`
        // is the cache-hit signal, so it must never be partial.
        let part_path = dest.with_extension("part");
        let mut file = tokio::fs::File::create(&part_path).await?;
        let mut total_bytes = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(|e| EtlError::fetch(url, e))? {
            file.write_all(&chunk).await?;
            total_bytes += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&part_path, dest).await?;
        tracing::debug!("Downloaded {} bytes from {}", total_bytes, url);
        Ok(())
    }
}

/// Materializes the monthly partitions of the target year in the local cache.
pub struct SourceFetcher {
    base_url: String,
    cache_dir: PathBuf,
    downloader: Arc<dyn Downloader>,
}

impl SourceFetcher {
    pub fn new(base_url: impl Into<String>, cache_dir: impl Into<PathBuf>, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_dir: cache_dir.into(),
            downloader,
        }
    }

    pub fn from_config(dataset: &DatasetConfig, downloader: Arc<dyn Downloader>) -> Self {
        Self::new(dataset.base_url.clone(), dataset.cache_dir.clone(), downloader)
    }

    /// Deterministic (url, local path) pair for one month.
    pub fn partition(&self, year: i32, month: u32) -> Partition {
        let file_name = partition_file_name(year, month);
        Partition {
            year,
            month,
            url: format!("{}/{}", self.base_url.trim_end_matches('/'), file_name),
            local_path: self.cache_dir.join(file_name),
        }
    }

    pub fn partitions(&self, year: i32, months: &[u32]) -> Vec<Partition> {
        months.iter().map(|&month| self.partition(year, month)).collect()
    }

    /// Ensure every partition exists locally, downloading cache misses one at
    /// a time. The first failed download aborts the whole fetch.
    pub async fn fetch_all(&self, year: i32, months: &[u32]) -> EtlResult<Vec<Partition>> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let partitions = self.partitions(year, months);
        for partition in &partitions {
            self.ensure_local(partition).await?;
        }
        Ok(partitions)
    }

    async fn ensure_local(&self, partition: &Partition) -> EtlResult<()> {
        if tokio::fs::try_exists(&partition.local_path).await? {
            tracing::info!("Cache hit for {}", partition.local_path.display());
            return Ok(());
        }

        tracing::info!(
            "Downloading {} -> {}",
            partition.url,
            partition.local_path.display()
        );
        self.downloader
            .download(&partition.url, &partition.local_path)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch {}: {}", partition.url, e);
                e
            })
    }
}
