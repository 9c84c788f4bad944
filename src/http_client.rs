//! Shared HTTP client and streamed file fetch
//!
//! One [`reqwest::Client`] is built per process and cloned into every
//! provider adapter (clones share the connection pool).

use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Build the shared client with bounded timeouts
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        // Let the server negotiate HTTP/2
        .http2_adaptive_window(true)
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .use_rustls_tls()
        .brotli(true)
        .gzip(true)
        .deflate(true)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(concat!("clipcast/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

/// Streamed download of `url` into `dest`.
///
/// Fails with [`Error::Network`] on a non-2xx status or a broken connection,
/// and with [`Error::Timeout`] when the whole transfer exceeds `timeout`.
/// A partially written `dest` is removed before returning an error.
#[instrument(skip(client), fields(dest = %dest.display()))]
pub async fn download(client: &Client, url: &str, dest: &Path, timeout: Duration) -> Result<u64> {
    let result = tokio::time::timeout(timeout, download_inner(client, url, dest)).await;
    let outcome = match result {
        Ok(inner) => inner,
        Err(_) => Err(Error::Timeout(format!("download of {url}"))),
    };

    if outcome.is_err() {
        let _ = tokio::fs::remove_file(dest).await;
    }
    outcome
}

async fn download_inner(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    debug!("Downloading {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Network(format!("GET {url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(format!("GET {url}: HTTP {status}")));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut total = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::Network(format!("GET {url}: {e}")))?;
        file.write_all(&chunk).await?;
        total += chunk.len() as u64;
    }
    file.flush().await?;

    info!("Downloaded {} bytes", total);
    Ok(total)
}
