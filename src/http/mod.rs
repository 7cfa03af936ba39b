//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → executor.rs (identity headers, timeout resolution, classification)
//!     → request.rs (verb, url, headers, body, timeout)
//!     → transport.rs (reqwest round trip or streamed download)
//!     → response.rs (status, buffered body)
//!     → serializer / texture.rs (decode into the caller's type)
//! ```

pub mod executor;
pub mod multipart;
pub mod request;
pub mod response;
pub mod texture;
pub mod transport;
pub mod types;

pub use executor::RequestExecutor;
pub use multipart::MultipartForm;
pub use request::{ApiRequest, Verb, CONTENT_TYPE};
pub use response::ApiResponse;
pub use texture::{ImageCodec, ImageDecoder, Texture, TextureDecoders, TextureStore};
pub use transport::{DownloadOutcome, ReqwestTransport, Transport};
pub use types::{ApiError, ApiResult, TransportError};
