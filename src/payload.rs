use std::io;
use std::path::Path;

use bytes::Bytes;

use crate::BinaryPayload;

/// Implements [`BinaryPayload`] over an in-memory buffer.
#[derive(Clone)]
pub struct MemoryPayload {
    bytes: Bytes,
    mime_type: Option<String>,
}

impl std::fmt::Debug for MemoryPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPayload")
            .field("size", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl MemoryPayload {
    /// Construct a [`MemoryPayload`] from any buffer, with an optional MIME type.
    pub fn new(bytes: impl Into<Bytes>, mime_type: Option<String>) -> Self {
        MemoryPayload { bytes: bytes.into(), mime_type }
    }

    /// Reads the whole file at `path` into memory, guessing the MIME type
    /// from its extension.
    pub async fn read_file(path: impl AsRef<Path>) -> io::Result<MemoryPayload> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_guess::from_path(path).first().map(|mime| mime.to_string());
        tracing::debug!(path = %path.display(), size = bytes.len(), ?mime_type, "loaded payload from disk");
        Ok(MemoryPayload::new(bytes, mime_type))
    }
}

impl BinaryPayload for MemoryPayload {
    fn size(&self) -> u64 {
        // usize always fits in u64 on supported targets
        self.bytes.len() as u64
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn read_range(&self, start: u64, end: u64) -> Bytes {
        let len = self.bytes.len();
        let start = usize::try_from(start).unwrap_or(len).min(len);
        let end = usize::try_from(end)
            .map(|end| end.saturating_add(1))
            .unwrap_or(len)
            .min(len);
        self.bytes.slice(start..end.max(start))
    }
}
