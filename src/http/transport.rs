//! HTTP transport abstraction.
//!
//! # Responsibilities
//! - Perform exactly one network round trip per call
//! - Buffer response bodies, or stream them to disk for downloads
//! - Report failures that have no HTTP status as [`TransportError`]
//!
//! # Design Decisions
//! - Non-2xx responses are returned as responses; classification is the executor's job
//! - The per-request timeout replaces any client-wide timeout
//! - `ReqwestTransport` is cheap to clone (shared connection pool)

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::config::schema::HttpConfig;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;
use crate::http::types::TransportError;

/// Result of streaming a response to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Body written to the destination.
    Saved { status: u16, bytes: u64 },
    /// Non-2xx response; nothing was written.
    Rejected(ApiResponse),
}

/// Executes prepared requests.
pub trait Transport: Send + Sync {
    /// Send the request and buffer the whole response body.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;

    /// Send the request and stream a successful body into `dest`.
    fn download(
        &self,
        request: ApiRequest,
        dest: &Path,
    ) -> impl Future<Output = Result<DownloadOutcome, TransportError>> + Send;
}

/// Transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport from HTTP configuration.
    pub fn new(config: &HttpConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build(&self, request: ApiRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len());
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::InvalidRequest(format!("header '{name}': {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = self
            .client
            .request(request.verb.into(), &request.url)
            .headers(headers);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        Ok(builder)
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let response = self.build(request)?.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(ApiResponse::new(status, body.to_vec()))
    }

    async fn download(
        &self,
        request: ApiRequest,
        dest: &Path,
    ) -> Result<DownloadOutcome, TransportError> {
        let response = self.build(request)?.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            return Ok(DownloadOutcome::Rejected(ApiResponse::new(status, body.to_vec())));
        }

        let write_error = |e: std::io::Error| TransportError::Write {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        };

        let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;
        let stream = std::pin::pin!(response.bytes_stream());
        let result = pump(stream, &mut file).await;
        drop(file);

        match result {
            Ok(bytes) => Ok(DownloadOutcome::Saved { status, bytes }),
            Err(e) => {
                discard_partial(dest).await;
                Err(match e {
                    PumpError::Read(e) => map_reqwest_error(e),
                    PumpError::Write(e) => write_error(e),
                })
            }
        }
    }
}

#[derive(Debug)]
enum PumpError<E> {
    Read(E),
    Write(std::io::Error),
}

/// Copy every chunk of `stream` into `writer`, then flush. Returns the byte count.
async fn pump<S, T, E, W>(mut stream: S, writer: &mut W) -> Result<u64, PumpError<E>>
where
    S: Stream<Item = Result<T, E>> + Unpin,
    T: AsRef<[u8]>,
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(PumpError::Read)?;
        let chunk = chunk.as_ref();
        writer.write_all(chunk).await.map_err(PumpError::Write)?;
        written += chunk.len() as u64;
    }
    writer.flush().await.map_err(PumpError::Write)?;
    Ok(written)
}

/// Remove a partially written download. A missing file is fine.
async fn discard_partial(dest: &Path) {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => tracing::debug!(path = %dest.display(), "Removed partial download"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %dest.display(), error = %e, "Failed to remove partial download");
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Verb;

    #[test]
    fn test_rejects_bad_header_value() {
        let transport = ReqwestTransport::new(&HttpConfig::default()).unwrap();
        let req = ApiRequest::new(Verb::Get, "http://127.0.0.1:1/").header("token", "a\nb");
        let err = transport.build(req).unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            )))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<&'static [u8], String>> + Unpin {
        futures_util::stream::iter(parts.iter().map(|p| Ok(*p)).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_pump_counts_written_bytes() {
        let mut out = Vec::new();
        let written = pump(chunks(&[&b"abc"[..], &b"defg"[..]]), &mut out).await.unwrap();
        assert_eq!(written, 7);
        assert_eq!(out, b"abcdefg");
    }

    #[tokio::test]
    async fn test_pump_separates_read_and_write_failures() {
        let err = pump(chunks(&[&b"abc"[..]]), &mut FullDisk).await.unwrap_err();
        assert!(matches!(err, PumpError::Write(e) if e.to_string() == "no space left on device"));

        let failing = futures_util::stream::iter(vec![Ok(&b"abc"[..]), Err("reset".to_string())]);
        let mut out = Vec::new();
        let err = pump(failing, &mut out).await.unwrap_err();
        assert!(matches!(err, PumpError::Read(ref e) if e == "reset"));
        assert_eq!(out, b"abc");
    }

    #[tokio::test]
    async fn test_discard_partial_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("level.bin");
        std::fs::write(&dest, b"half").unwrap();

        discard_partial(&dest).await;
        assert!(!dest.exists());
        // Already gone is not an error
        discard_partial(&dest).await;
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let transport = ReqwestTransport::new(&HttpConfig::default()).unwrap();
        // Port 1 is reserved and closed on test hosts
        let req = ApiRequest::new(Verb::Get, "http://127.0.0.1:1/")
            .timeout(Some(Duration::from_secs(2)));
        let err = transport.send(req).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_) | TransportError::Timeout));
    }
}
