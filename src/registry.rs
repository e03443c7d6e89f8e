use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::BinaryPayload;

/// MIME type used when a payload does not report one.
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// Identity of the document or tab issuing requests. Files are scoped to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        ClientId(id.to_string())
    }
}

impl From<String> for ClientId {
    fn from(id: String) -> Self {
        ClientId(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered payload together with its declared size and type.
///
/// Immutable once built: the size always matches the payload. Cloning is
/// cheap and clones share the same payload.
#[derive(Clone)]
pub struct FileEntry {
    payload: Arc<dyn BinaryPayload>,
    size: u64,
    mime_type: String,
}

impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl FileEntry {
    /// Wraps a payload, falling back to [`DEFAULT_MIME_TYPE`].
    pub fn new(payload: impl BinaryPayload + 'static) -> Self {
        Self::with_fallback_type(payload, DEFAULT_MIME_TYPE)
    }

    /// Wraps a payload, falling back to `fallback` when it reports no MIME type.
    pub fn with_fallback_type(payload: impl BinaryPayload + 'static, fallback: &str) -> Self {
        let size = payload.size();
        let mime_type = payload
            .mime_type()
            .filter(|mime| !mime.is_empty())
            .unwrap_or(fallback)
            .to_string();
        FileEntry { payload: Arc::new(payload), size, mime_type }
    }

    pub fn payload(&self) -> &Arc<dyn BinaryPayload> {
        &self.payload
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

type Buckets = HashMap<ClientId, HashMap<String, FileEntry>>;

/// Per-client table of registered files.
///
/// Constructed once at startup and shared (it is cheap to clone) with the
/// interceptor and the control loop. Every operation takes the lock once, so
/// operations are atomic with respect to each other and a lookup never sees a
/// half-updated bucket.
#[derive(Clone, Default)]
pub struct Registry {
    buckets: Arc<Mutex<Buckets>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("clients", &self.client_count())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        // the map is never left half-written, so a poisoned lock is still usable
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or overwrites `file_id` for `client`. Returns the stored id.
    pub fn set(&self, client: ClientId, file_id: impl Into<String>, file: FileEntry) -> String {
        let file_id = file_id.into();
        tracing::info!(%client, %file_id, size = file.size(), mime_type = %file.mime_type(), "file registered");
        self.lock()
            .entry(client)
            .or_default()
            .insert(file_id.clone(), file);
        file_id
    }

    /// Deletes `file_id` for `client`. Missing entries are ignored.
    pub fn remove(&self, client: &ClientId, file_id: &str) {
        let removed = self
            .lock()
            .get_mut(client)
            .and_then(|files| files.remove(file_id))
            .is_some();
        tracing::info!(%client, %file_id, removed, "file removed");
    }

    /// Deletes every file registered for `client`.
    pub fn clear(&self, client: &ClientId) {
        let removed = self.lock().remove(client).map_or(0, |files| files.len());
        tracing::info!(%client, removed, "files cleared");
    }

    pub fn lookup(&self, client: &ClientId, file_id: &str) -> Option<FileEntry> {
        self.lock().get(client)?.get(file_id).cloned()
    }

    pub fn file_count(&self, client: &ClientId) -> usize {
        self.lock().get(client).map_or(0, HashMap::len)
    }

    /// Number of clients with a bucket, including emptied ones.
    pub fn client_count(&self) -> usize {
        self.lock().len()
    }

    /// Drops every registered file. Called when the subsystem shuts down.
    pub fn shutdown(&self) {
        let mut buckets = self.lock();
        tracing::info!(clients = buckets.len(), "registry shut down");
        buckets.clear();
    }
}
