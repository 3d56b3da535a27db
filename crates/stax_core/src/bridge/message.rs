//! Bridge message types and wire decoding.

use crate::model::app::AppId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Console severity forwarded from sandboxed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Dispatch key for the receiver-side handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    Log,
    RuntimeError,
    ContextMenuRequest,
}

/// Event emitted by a sandboxed instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeMessage {
    Log { level: LogLevel, text: String },
    RuntimeError { message: String, line: Option<u32> },
    /// Pointer position local to the sandbox viewport.
    ContextMenuRequest { x: i32, y: i32 },
}

impl BridgeMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Log { .. } => MessageKind::Log,
            Self::RuntimeError { .. } => MessageKind::RuntimeError,
            Self::ContextMenuRequest { .. } => MessageKind::ContextMenuRequest,
        }
    }
}

/// Message stamped with its originating instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeEnvelope {
    pub instance: AppId,
    pub message: BridgeMessage,
}

#[derive(Debug, Deserialize)]
struct WireEnvelope {
    id: String,
    #[serde(flatten)]
    payload: WirePayload,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum WirePayload {
    #[serde(rename = "log")]
    Log { level: LogLevel, message: String },
    #[serde(rename = "runtime-error")]
    RuntimeError { message: String, line: Option<u32> },
    #[serde(rename = "contextmenu")]
    ContextMenu { x: f64, y: f64 },
}

#[derive(Debug)]
pub enum BridgeDecodeError {
    Json(serde_json::Error),
}

impl Display for BridgeDecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "undecodable bridge payload: {err}"),
        }
    }
}

impl Error for BridgeDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}

/// Decodes one JSON payload posted by the bootstrap script.
pub fn decode_payload(json: &str) -> Result<BridgeEnvelope, BridgeDecodeError> {
    let wire: WireEnvelope = serde_json::from_str(json).map_err(BridgeDecodeError::Json)?;
    let message = match wire.payload {
        WirePayload::Log { level, message } => BridgeMessage::Log {
            level,
            text: message,
        },
        WirePayload::RuntimeError { message, line } => BridgeMessage::RuntimeError { message, line },
        WirePayload::ContextMenu { x, y } => BridgeMessage::ContextMenuRequest {
            x: x.round() as i32,
            y: y.round() as i32,
        },
    };
    Ok(BridgeEnvelope {
        instance: AppId::new(wire.id),
        message,
    })
}
