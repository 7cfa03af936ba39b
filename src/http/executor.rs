//! Uniform request execution.
//!
//! # Responsibilities
//! - Build one request per call with identity headers and content type
//! - Resolve the effective timeout before anything is sent
//! - Await exactly one round trip
//! - Classify the outcome, notify the error sink on transport failure
//! - Decode successful bodies into the caller's type
//!
//! # Data Flow
//! ```text
//! get/post/put/patch/post_form/texture/download
//!     → prepare (url check, headers, timeout resolution)
//!     → Transport::send / Transport::download
//!     → classify (2xx or TransportFailure + ErrorNotice)
//!     → decode (Serializer / TextureDecoders)
//! ```
//!
//! # Design Decisions
//! - Calls never panic and never return anything but `ApiResult`
//! - The executor holds no per-call mutable state; it is shared freely
//! - Timeout rejections, decode failures and local I/O errors do not notify the sink

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::schema::ClientConfig;
use crate::events::{ErrorNotice, ErrorSink};
use crate::http::multipart::MultipartForm;
use crate::http::request::{ApiRequest, Verb, CONTENT_TYPE};
use crate::http::response::ApiResponse;
use crate::http::texture::{is_unusable_url, Texture, TextureDecoders, TextureStore};
use crate::http::transport::{DownloadOutcome, ReqwestTransport, Transport};
use crate::http::types::{ApiError, ApiResult, TransportError};
use crate::identity::{device_identifier, IdentityProvider, StaticIdentity};
use crate::observability::metrics;
use crate::resilience::timeouts::{
    resolve_timeout, RequestTimeout, TimeoutPolicy, DEFAULT_TIMEOUT_CEILING_SECS,
};
use crate::serialization::{JsonSerializer, Serializer};

/// Executes HTTP calls against the backend API.
pub struct RequestExecutor<T = ReqwestTransport, S = JsonSerializer> {
    transport: T,
    serializer: S,
    identity: Arc<dyn IdentityProvider>,
    errors: Arc<dyn ErrorSink>,
    decoders: TextureDecoders,
    device_id: String,
    ceiling: Duration,
    storage_root: PathBuf,
}

impl RequestExecutor {
    /// Build a reqwest-backed executor from configuration.
    pub fn from_config(
        config: &ClientConfig,
        errors: Arc<dyn ErrorSink>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(&config.http)?;
        let identity = Arc::new(StaticIdentity::from(&config.identity));

        Ok(Self::new(transport, JsonSerializer, identity, errors)
            .with_timeout_ceiling(Duration::from_secs(config.http.timeout_ceiling_secs))
            .with_storage_root(config.storage.root.clone()))
    }
}

impl<T: Transport, S: Serializer> RequestExecutor<T, S> {
    pub fn new(
        transport: T,
        serializer: S,
        identity: Arc<dyn IdentityProvider>,
        errors: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            transport,
            serializer,
            identity,
            errors,
            decoders: TextureDecoders::default(),
            device_id: device_identifier().to_string(),
            ceiling: Duration::from_secs(DEFAULT_TIMEOUT_CEILING_SECS),
            storage_root: PathBuf::from("data"),
        }
    }

    pub fn with_timeout_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Override the identifier used when the identity has no UUID.
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_decoders(mut self, decoders: TextureDecoders) -> Self {
        self.decoders = decoders;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn timeout_ceiling(&self) -> Duration {
        self.ceiling
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    // ─── JSON verbs ──────────────────────────────────────────────────────

    /// GET and decode. Explicit timeouts above -1 are used verbatim.
    pub async fn get<R: DeserializeOwned>(&self, url: &str, timeout: RequestTimeout) -> ApiResult<R> {
        let content_type = self.identity.content_type();
        self.call(Verb::Get, url, Some(content_type), None, timeout, TimeoutPolicy::Verbatim)
            .await
    }

    /// POST a string body and decode.
    pub async fn post<R: DeserializeOwned>(
        &self,
        url: &str,
        body: &str,
        timeout: RequestTimeout,
    ) -> ApiResult<R> {
        let content_type = self.identity.content_type();
        let body = body.as_bytes().to_vec();
        self.call(Verb::Post, url, Some(content_type), Some(body), timeout, TimeoutPolicy::Clamped)
            .await
    }

    /// POST any serializable value as JSON and decode.
    pub async fn post_json<B, R>(&self, url: &str, body: &B, timeout: RequestTimeout) -> ApiResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let encoded = match self.serializer.serialize(body) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::error!(target: "api_call", url, error = %e, "Failed to encode request body");
                return Err(ApiError::Encode(e.to_string()));
            }
        };
        let content_type = self.identity.content_type();
        let body = encoded.into_bytes();
        self.call(Verb::Post, url, Some(content_type), Some(body), timeout, TimeoutPolicy::Clamped)
            .await
    }

    /// PATCH a string body and decode.
    pub async fn patch<R: DeserializeOwned>(
        &self,
        url: &str,
        body: &str,
        timeout: RequestTimeout,
    ) -> ApiResult<R> {
        let content_type = self.identity.content_type();
        let body = body.as_bytes().to_vec();
        self.call(Verb::Patch, url, Some(content_type), Some(body), timeout, TimeoutPolicy::Clamped)
            .await
    }

    /// PUT a string body and decode.
    pub async fn put<R: DeserializeOwned>(
        &self,
        url: &str,
        body: &str,
        timeout: RequestTimeout,
    ) -> ApiResult<R> {
        let content_type = self.identity.content_type();
        let body = body.as_bytes().to_vec();
        self.call(Verb::Put, url, Some(content_type), Some(body), timeout, TimeoutPolicy::Clamped)
            .await
    }

    /// POST a multipart form and decode. The content type is always `multipart/form-data`.
    pub async fn post_form<R: DeserializeOwned>(
        &self,
        url: &str,
        form: &MultipartForm,
        timeout: RequestTimeout,
    ) -> ApiResult<R> {
        let content_type = form.content_type();
        let body = form.to_bytes();
        self.call(Verb::Post, url, Some(content_type), Some(body), timeout, TimeoutPolicy::Clamped)
            .await
    }

    // ─── Binary variants ─────────────────────────────────────────────────

    /// Download and decode an image. `.webp` URLs use the WebP codec.
    pub async fn get_texture(&self, url: &str) -> ApiResult<Texture> {
        let start = Instant::now();
        let result = self.texture(url).await;
        metrics::record_request(Verb::Get.as_str(), outcome(&result), start);
        result
    }

    /// Download an image and store it under `id`.
    pub async fn fetch_texture_into(&self, id: i32, url: &str, store: &TextureStore) -> ApiResult<()> {
        let texture = self.get_texture(url).await?;
        store.insert(id, texture);
        Ok(())
    }

    /// Save the raw bytes of an image to `<storage root>/<key>/<filename>`.
    ///
    /// The `<key>` directory must already exist.
    pub async fn save_texture(&self, key: &str, url: &str, filename: &str) -> ApiResult<PathBuf> {
        if is_unusable_url(url) {
            tracing::warn!(target: "api_call", url, "Skipping texture with unusable url");
            return Err(ApiError::InvalidUrl(url.to_string()));
        }
        let path = self.asset_path(key, filename)?;
        self.download_file(url, &path, RequestTimeout::Default)
            .await
            .map(|_| path)
    }

    /// Stream a response body to `dest`. Returns the number of bytes written.
    ///
    /// Parent directories are not created.
    pub async fn download_file(&self, url: &str, dest: &Path, timeout: RequestTimeout) -> ApiResult<u64> {
        let start = Instant::now();
        let result = self.download(url, dest, timeout).await;
        metrics::record_request(Verb::Get.as_str(), outcome(&result), start);
        result
    }

    // ─── Pipeline ────────────────────────────────────────────────────────

    async fn call<R: DeserializeOwned>(
        &self,
        verb: Verb,
        url: &str,
        content_type: Option<String>,
        body: Option<Vec<u8>>,
        timeout: RequestTimeout,
        policy: TimeoutPolicy,
    ) -> ApiResult<R> {
        let start = Instant::now();
        let result = async {
            let request = self.prepare(verb, url, content_type, body, timeout, policy)?;
            let response = self.round_trip(request).await?;
            self.decode(url, &response)
        }
        .await;
        metrics::record_request(verb.as_str(), outcome(&result), start);
        result
    }

    fn prepare(
        &self,
        verb: Verb,
        url: &str,
        content_type: Option<String>,
        body: Option<Vec<u8>>,
        timeout: RequestTimeout,
        policy: TimeoutPolicy,
    ) -> ApiResult<ApiRequest> {
        let timeout = resolve_timeout(timeout, policy, self.ceiling).map_err(|rejected| {
            tracing::warn!(target: "api_call", %verb, url, timeout = rejected.0, "Rejected non-positive timeout");
            ApiError::TimeoutRejected(rejected.0)
        })?;

        if let Err(e) = url::Url::parse(url) {
            tracing::warn!(target: "api_call", %verb, url, error = %e, "Rejected malformed url");
            return Err(ApiError::InvalidUrl(format!("{url}: {e}")));
        }

        let identity = self.identity.identity();
        let mut request = ApiRequest::new(verb, url).timeout(timeout);
        // Binary fetches (textures, downloads) carry no content type
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        if let Some(bytes) = body {
            request = request.body(bytes);
        }
        for (name, value) in identity.headers(&self.device_id) {
            request = request.header(name, value);
        }

        tracing::info!(
            target: "api_call",
            %verb,
            url,
            timeout = ?timeout,
            body_bytes = request.body.as_ref().map_or(0, Vec::len),
            "Calling"
        );
        Ok(request)
    }

    async fn round_trip(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let verb = request.verb;
        let url = request.url.clone();

        match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                tracing::info!(target: "api_call", %verb, url, status = response.status, "Success");
                Ok(response)
            }
            Ok(response) => {
                let message = format!("HTTP {}", response.status);
                Err(self.transport_failure(verb, &url, response.status, response.text(), message))
            }
            Err(e) => Err(self.transport_failure(verb, &url, 0, String::new(), e.to_string())),
        }
    }

    fn decode<R: DeserializeOwned>(&self, url: &str, response: &ApiResponse) -> ApiResult<R> {
        let text = response.text();
        tracing::debug!(target: "api_call", url, body = %text, "Response body");
        self.serializer.deserialize(&text).map_err(|e| {
            tracing::error!(target: "api_call", url, error = %e, "Failed to decode response");
            ApiError::Decode(e.to_string())
        })
    }

    fn transport_failure(
        &self,
        verb: Verb,
        url: &str,
        status: u16,
        body: String,
        message: String,
    ) -> ApiError {
        tracing::error!(target: "api_call", %verb, url, status, body = %body, "Failed: {message}");
        self.errors.error_received(ErrorNotice {
            status,
            body: body.clone(),
        });
        ApiError::Transport {
            status,
            body,
            message,
        }
    }

    async fn texture(&self, url: &str) -> ApiResult<Texture> {
        if is_unusable_url(url) {
            tracing::warn!(target: "api_call", url, "Skipping texture with unusable url");
            return Err(ApiError::InvalidUrl(url.to_string()));
        }

        let request = self.prepare(
            Verb::Get,
            url,
            None,
            None,
            RequestTimeout::Default,
            TimeoutPolicy::Clamped,
        )?;
        let response = self.round_trip(request).await?;

        let decoders = self.decoders.clone();
        let owned_url = url.to_string();
        let decoded = tokio::task::spawn_blocking(move || decoders.decode(&owned_url, &response.body))
            .await
            .map_err(|e| ApiError::Image {
                codec: crate::http::texture::codec_for_url(url),
                reason: format!("decoder task failed: {e}"),
            })?;

        decoded.map_err(|(codec, reason)| {
            tracing::warn!(target: "api_call", url, %codec, error = %reason, "Unable to decode texture");
            ApiError::Image { codec, reason }
        })
    }

    async fn download(&self, url: &str, dest: &Path, timeout: RequestTimeout) -> ApiResult<u64> {
        let request = self.prepare(Verb::Get, url, None, None, timeout, TimeoutPolicy::Clamped)?;

        match self.transport.download(request, dest).await {
            Ok(DownloadOutcome::Saved { status, bytes }) => {
                tracing::info!(target: "api_call", url, status, bytes, path = %dest.display(), "Saved");
                Ok(bytes)
            }
            Ok(DownloadOutcome::Rejected(response)) => {
                let message = format!("HTTP {}", response.status);
                Err(self.transport_failure(Verb::Get, url, response.status, response.text(), message))
            }
            Err(TransportError::Write { path, reason }) => {
                tracing::error!(target: "api_call", url, path = %path.display(), %reason, "Failed to write download");
                Err(ApiError::Io { path, reason })
            }
            Err(e) => Err(self.transport_failure(Verb::Get, url, 0, String::new(), e.to_string())),
        }
    }

    fn asset_path(&self, key: &str, filename: &str) -> ApiResult<PathBuf> {
        let safe = |part: &str| {
            !part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\'])
        };
        if !safe(key) || !safe(filename) {
            return Err(ApiError::Io {
                path: PathBuf::from(key).join(filename),
                reason: "asset key and file name must be single path components".to_string(),
            });
        }
        Ok(self.storage_root.join(key).join(filename))
    }
}

impl<T, S> std::fmt::Debug for RequestExecutor<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("timeout_ceiling", &self.ceiling)
            .field("storage_root", &self.storage_root)
            .finish_non_exhaustive()
    }
}

fn outcome<R>(result: &ApiResult<R>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    }
}
