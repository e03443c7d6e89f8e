//! # axum-localvideo
//!
//! Serve locally registered binary payloads (typically a video the user just
//! picked) through an [`axum`][1] interception layer, with HTTP Range support
//! so that seeking players which insist on `206 Partial Content` work.
//!
//! Files are registered per requesting client in a [`Registry`], either
//! directly or over the control channel in [`control`]. Requests whose final
//! path segment is `__localvideo` are answered from the registry by the
//! [`intercept`] middleware; every other request passes through untouched.
//!
//! ```
//! use axum::Router;
//! use axum::http::StatusCode;
//! use axum::middleware;
//! use axum::routing::get;
//!
//! use axum_localvideo::{intercept, ClientId, FileEntry, Interceptor, MemoryPayload, Registry};
//!
//! let registry = Registry::new();
//! let payload = MemoryPayload::new(vec![0u8; 1024], Some("video/mp4".to_string()));
//! registry.set(ClientId::from("tab-1"), "clip", FileEntry::new(payload));
//!
//! let interceptor = Interceptor::new(registry.clone());
//! let _app: Router = Router::new()
//!     .route("/", get(|| async { "Hello, World!" }))
//!     .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
//!     .layer(middleware::from_fn_with_state(interceptor, intercept));
//! ```
//!
//! A runnable server lives in `demos/serve.rs` rather than `examples/`; it is
//! registered as the cargo example `serve` (`cargo run --example serve -- movie.mp4`).
//!
//! [1]: https://docs.rs/axum

pub mod config;
pub mod control;
mod payload;
mod range;
mod registry;
mod response;
mod router;

use bytes::Bytes;

pub use config::{Config, ConfigError};
pub use payload::MemoryPayload;
pub use range::parse_range;
pub use registry::{ClientId, FileEntry, Registry, DEFAULT_MIME_TYPE};
pub use response::{build_response, RangedResponse};
pub use router::{intercept, Intercept, Interceptor, LocalResponse, DEFAULT_MARKER, NOT_FOUND_BODY};

/// A binary source with a fixed size that can hand out arbitrary byte slices.
///
/// Any concrete source (memory buffer, mapped file) implements this.
pub trait BinaryPayload: Send + Sync {
    /// The total size of the payload in bytes.
    ///
    /// This should not change for the lifetime of the object once queried.
    fn size(&self) -> u64;

    /// The MIME type the source was registered with, if it knows one.
    fn mime_type(&self) -> Option<&str>;

    /// Returns the bytes in `start..=end`. Callers keep the range inside
    /// `0..size()`.
    fn read_range(&self, start: u64, end: u64) -> Bytes;

    /// Returns the whole payload.
    fn read_all(&self) -> Bytes {
        match self.size() {
            0 => Bytes::new(),
            size => self.read_range(0, size - 1),
        }
    }
}

/// A single byte range with inclusive start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Create a new byte range, both ends inclusive.
    pub fn new(start: u64, end: u64) -> Self {
        ByteRange { start, end }
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}
