use std::{
    any::{TypeId, type_name},
    fmt,
};

/// The two disjoint families of messages the mediator routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    Command,
    Query,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value carrying intent. The concrete type is the routing key and the
/// associated types fix what its handler returns.
pub trait Message: Send + 'static {
    type Output: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;
}

/// A state-mutating request.
pub trait Command: Message {}

/// A read-only request.
pub trait Query: Message {}

/// Registry key: message kind plus concrete message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageKey {
    kind: MessageKind,
    type_id: TypeId,
    type_name: &'static str,
}

impl MessageKey {
    pub fn command<C: Command>() -> Self { Self::of::<C>(MessageKind::Command) }

    pub fn query<Q: Query>() -> Self { Self::of::<Q>(MessageKind::Query) }

    pub(crate) fn of<M: Message>(kind: MessageKind) -> Self {
        Self {
            kind,
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
        }
    }

    pub fn kind(&self) -> MessageKind { self.kind }

    pub fn type_name(&self) -> &'static str { self.type_name }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind, self.type_name)
    }
}
