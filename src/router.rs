use axum::extract::{Query, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderName, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::{build_response, parse_range, ClientId, Config, RangedResponse, Registry};

/// Final path segment reserved for locally served files.
pub const DEFAULT_MARKER: &str = "__localvideo";

/// Body of the 404 returned when no file is registered.
pub const NOT_FOUND_BODY: &str = "No file set. Please select a file.";

const FILE_ID_PARAM: &str = "id";

/// Outcome of inspecting one request.
#[derive(Debug)]
pub enum Intercept {
    /// Not ours, hand the request on unmodified.
    PassThrough,
    Respond(LocalResponse),
}

/// A locally produced answer. Implements [`IntoResponse`].
#[derive(Debug)]
pub enum LocalResponse {
    NotFound,
    Ranged(RangedResponse),
}

impl IntoResponse for LocalResponse {
    fn into_response(self) -> Response {
        match self {
            LocalResponse::NotFound => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
            LocalResponse::Ranged(ranged) => ranged.into_response(),
        }
    }
}

/// Matches reserved paths and answers them from the [`Registry`].
#[derive(Debug, Clone)]
pub struct Interceptor {
    registry: Registry,
    marker: String,
    client_header: HeaderName,
}

impl Interceptor {
    /// Uses the default marker and identity header.
    pub fn new(registry: Registry) -> Self {
        Self::from_config(registry, &Config::default())
    }

    pub fn from_config(registry: Registry, config: &Config) -> Self {
        Interceptor {
            registry,
            marker: config.marker.clone(),
            client_header: config.client_header.clone(),
        }
    }

    /// Whether the final segment of `path` is the reserved marker, at any depth.
    pub fn matches(&self, path: &str) -> bool {
        path.rsplit_once('/')
            .is_some_and(|(_, last)| last == self.marker)
    }

    /// The requesting client: a [`ClientId`] extension set by the host wins
    /// over the identity header.
    fn client(&self, parts: &Parts) -> Option<ClientId> {
        if let Some(client) = parts.extensions.get::<ClientId>() {
            return Some(client.clone());
        }
        parts
            .headers
            .get(&self.client_header)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(ClientId::from)
    }

    /// Decides synchronously how to answer the request described by `parts`.
    pub fn handle(&self, parts: &Parts) -> Intercept {
        let path = parts.uri.path();
        if !self.matches(path) {
            return Intercept::PassThrough;
        }

        let file_id = file_id(&parts.uri);
        let client = self.client(parts);

        let entry = match (&client, &file_id) {
            (Some(client), Some(file_id)) => self.registry.lookup(client, file_id),
            _ => None,
        };
        let Some(entry) = entry else {
            tracing::warn!(path, ?client, ?file_id, "no file registered");
            return Intercept::Respond(LocalResponse::NotFound);
        };

        let range_header = parts
            .headers
            .get(header::RANGE)
            .and_then(|value| value.to_str().ok());
        let range = parse_range(range_header, entry.size());
        tracing::debug!(path, ?client, ?file_id, ?range_header, ?range, size = entry.size(), "serving local file");

        Intercept::Respond(LocalResponse::Ranged(build_response(&entry, range)))
    }
}

/// First `id` query value; repeated keys do not make the query unusable.
fn file_id(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find(|(key, _)| key == FILE_ID_PARAM)
        .map(|(_, value)| value)
}

/// Middleware adapter for [`Interceptor::handle`], for use with
/// [`axum::middleware::from_fn_with_state`].
pub async fn intercept(State(interceptor): State<Interceptor>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    match interceptor.handle(&parts) {
        Intercept::PassThrough => next.run(Request::from_parts(parts, body)).await,
        Intercept::Respond(response) => response.into_response(),
    }
}
