use thiserror::Error;

use crate::message::{MessageKey, MessageKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No handler registered for {kind} `{message_type}`")]
pub struct HandlerNotFound {
    pub kind: MessageKind,
    pub message_type: &'static str,
}

impl From<MessageKey> for HandlerNotFound {
    fn from(key: MessageKey) -> Self {
        Self {
            kind: key.kind(),
            message_type: key.type_name(),
        }
    }
}

/// Registration-time failures. Both abort startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Duplicate handler for {kind} `{message_type}`")]
    DuplicateHandler {
        kind: MessageKind,
        message_type: &'static str,
    },
    #[error("Missing handlers: {}", join_keys(.missing))]
    MissingHandlers { missing: Vec<MessageKey> },
}

fn join_keys(keys: &[MessageKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of a failed `send_*` call. `E` is the message's declared error
/// type and is carried unchanged in [`DispatchError::Handler`].
#[derive(Debug, Error)]
pub enum DispatchError<E> {
    #[error(transparent)]
    HandlerNotFound(#[from] HandlerNotFound),
    #[error("{kind} `{message_type}` was cancelled before dispatch")]
    Cancelled {
        kind: MessageKind,
        message_type: &'static str,
    },
    #[error("{kind} `{message_type}` failed: {source}")]
    Handler {
        kind: MessageKind,
        message_type: &'static str,
        #[source]
        source: E,
    },
}

impl<E> DispatchError<E> {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::HandlerNotFound(err) => err.kind,
            Self::Cancelled { kind, .. } | Self::Handler { kind, .. } => *kind,
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            Self::HandlerNotFound(err) => err.message_type,
            Self::Cancelled { message_type, .. }
            | Self::Handler { message_type, .. } => message_type,
        }
    }

    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound(_))
    }

    pub fn is_cancelled(&self) -> bool { matches!(self, Self::Cancelled { .. }) }

    pub fn handler_error(&self) -> Option<&E> {
        match self {
            Self::Handler { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn into_handler_error(self) -> Option<E> {
        match self {
            Self::Handler { source, .. } => Some(source),
            _ => None,
        }
    }
}
