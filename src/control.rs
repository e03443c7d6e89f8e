//! In-process control channel through which a host registers files.
//!
//! The host sends [`Envelope`]s into the loop driven by [`run`]. A `SET_FILE`
//! is acknowledged with a [`ControlReply::FileSet`] so the host knows it can
//! issue the dependent request; the other messages get no reply.
//! [`ControlHandle`] wraps the sending side and performs that handshake.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{ClientId, FileEntry, Registry};

#[derive(Debug)]
pub enum ControlMessage {
    SetFile { file_id: String, file: FileEntry },
    RemoveFile { file_id: String },
    ClearFiles,
    /// The client is gone for good; its files are dropped.
    ClientClosed,
}

impl ControlMessage {
    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::SetFile { .. } => "SET_FILE",
            ControlMessage::RemoveFile { .. } => "REMOVE_FILE",
            ControlMessage::ClearFiles => "CLEAR_FILES",
            ControlMessage::ClientClosed => "CLIENT_CLOSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlReply {
    FileSet {
        #[serde(rename = "fileId")]
        file_id: String,
    },
}

/// The sender of a control message: its identity and its own mailbox.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: ClientId,
    pub mailbox: mpsc::UnboundedSender<ControlReply>,
}

#[derive(Debug)]
pub struct Envelope {
    pub source: Source,
    pub message: ControlMessage,
    /// Dedicated reply port; replies go to the source mailbox without one.
    pub reply: Option<oneshot::Sender<ControlReply>>,
}

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("control loop is not running")]
    Closed,
    #[error("control loop dropped the reply for {0:?}")]
    NoReply(String),
}

/// Applies one envelope to `registry`, replying where the message defines a reply.
pub fn handle_message(registry: &Registry, envelope: Envelope) {
    let Envelope { source, message, reply } = envelope;
    tracing::debug!(client = %source.id, kind = message.kind(), "control message");

    match message {
        ControlMessage::SetFile { file_id, file } => {
            let file_id = registry.set(source.id.clone(), file_id, file);
            send_reply(&source, reply, ControlReply::FileSet { file_id });
        }
        ControlMessage::RemoveFile { file_id } => registry.remove(&source.id, &file_id),
        ControlMessage::ClearFiles | ControlMessage::ClientClosed => registry.clear(&source.id),
    }
}

fn send_reply(source: &Source, port: Option<oneshot::Sender<ControlReply>>, reply: ControlReply) {
    let delivered = match port {
        Some(port) => port.send(reply).is_ok(),
        None => source.mailbox.send(reply).is_ok(),
    };
    if !delivered {
        tracing::warn!(client = %source.id, "reply receiver dropped");
    }
}

/// Dispatches envelopes until every sender is dropped.
pub async fn run(registry: Registry, mut envelopes: mpsc::Receiver<Envelope>) {
    while let Some(envelope) = envelopes.recv().await {
        handle_message(&registry, envelope);
    }
    tracing::debug!("control channel closed");
}

/// Sending side of the control channel for one client.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    envelopes: mpsc::Sender<Envelope>,
    source: Source,
}

impl ControlHandle {
    pub fn new(envelopes: mpsc::Sender<Envelope>, source: Source) -> Self {
        ControlHandle { envelopes, source }
    }

    pub fn client(&self) -> &ClientId {
        &self.source.id
    }

    async fn send(&self, message: ControlMessage, reply: Option<oneshot::Sender<ControlReply>>) -> Result<(), ControlError> {
        let envelope = Envelope { source: self.source.clone(), message, reply };
        self.envelopes.send(envelope).await.map_err(|_| ControlError::Closed)
    }

    /// Registers `file` and waits for the `FILE_SET` acknowledgement.
    pub async fn set_file(&self, file_id: impl Into<String>, file: FileEntry) -> Result<String, ControlError> {
        let file_id = file_id.into();
        let (port, acknowledged) = oneshot::channel();
        self.send(ControlMessage::SetFile { file_id: file_id.clone(), file }, Some(port)).await?;
        match acknowledged.await {
            Ok(ControlReply::FileSet { file_id }) => Ok(file_id),
            Err(_) => Err(ControlError::NoReply(file_id)),
        }
    }

    pub async fn remove_file(&self, file_id: impl Into<String>) -> Result<(), ControlError> {
        self.send(ControlMessage::RemoveFile { file_id: file_id.into() }, None).await
    }

    pub async fn clear_files(&self) -> Result<(), ControlError> {
        self.send(ControlMessage::ClearFiles, None).await
    }

    /// Tells the loop this client is gone so its files are released.
    pub async fn close(&self) -> Result<(), ControlError> {
        self.send(ControlMessage::ClientClosed, None).await
    }
}
