use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_extra::headers::{AcceptRanges, CacheControl, ContentLength, ContentRange};
use axum_extra::TypedHeader;
use bytes::Bytes;

use crate::{ByteRange, FileEntry};

/// Computed headers and body for a local file response. Implements [`IntoResponse`].
///
/// Both variants carry `Accept-Ranges: bytes` and `Cache-Control: no-store`;
/// strict players probe range support from the full response.
#[derive(Debug)]
pub enum RangedResponse {
    /// Full content, no usable range requested. Status 200.
    Full {
        content_length: ContentLength,
        content_type: String,
        body: Bytes,
    },
    /// A single satisfiable range. Status 206.
    Partial {
        range: ByteRange,
        complete_length: u64,
        content_length: ContentLength,
        content_type: String,
        body: Bytes,
    },
}

/// Builds the response for `entry`. A `range`, when given, must already be
/// validated against `entry.size()` (see [`crate::parse_range`]).
pub fn build_response(entry: &FileEntry, range: Option<ByteRange>) -> RangedResponse {
    let content_type = entry.mime_type().to_string();
    match range {
        None => RangedResponse::Full {
            content_length: ContentLength(entry.size()),
            content_type,
            body: entry.payload().read_all(),
        },
        Some(range) => RangedResponse::Partial {
            range,
            complete_length: entry.size(),
            content_length: ContentLength(range.len()),
            content_type,
            body: entry.payload().read_range(range.start, range.end),
        },
    }
}

impl RangedResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            RangedResponse::Full { .. } => StatusCode::OK,
            RangedResponse::Partial { .. } => StatusCode::PARTIAL_CONTENT,
        }
    }

    pub fn body(&self) -> &Bytes {
        match self {
            RangedResponse::Full { body, .. } | RangedResponse::Partial { body, .. } => body,
        }
    }
}

impl IntoResponse for RangedResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let accept_ranges = TypedHeader(AcceptRanges::bytes());
        let cache_control = TypedHeader(CacheControl::new().with_no_store());

        match self {
            RangedResponse::Full { content_length, content_type, body } => (
                status,
                accept_ranges,
                cache_control,
                TypedHeader(content_length),
                [(header::CONTENT_TYPE, content_type)],
                body,
            )
                .into_response(),
            RangedResponse::Partial { range, complete_length, content_length, content_type, body } => {
                let content_range = match ContentRange::bytes(range.start..=range.end, complete_length) {
                    Ok(content_range) => content_range,
                    Err(_) => {
                        tracing::error!(?range, complete_length, "could not encode Content-Range");
                        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                    }
                };
                (
                    status,
                    accept_ranges,
                    cache_control,
                    TypedHeader(content_length),
                    TypedHeader(content_range),
                    [(header::CONTENT_TYPE, content_type)],
                    body,
                )
                    .into_response()
            }
        }
    }
}
