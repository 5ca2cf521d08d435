//! In-process request dispatch.
//!
//! Commands and queries are plain types implementing [`Command`] or
//! [`Query`]. Each is served by exactly one [`Handler`], registered once at
//! startup through [`RegistryBuilder`]. [`Mediator`] resolves the handler by
//! (kind, message type) and awaits it to completion.

pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod message;
pub mod registry;

pub use dispatcher::Mediator;
pub use error::{DispatchError, HandlerNotFound, RegistryError};
pub use handler::Handler;
pub use message::{Command, Message, MessageKey, MessageKind, Query};
pub use registry::{
    DuplicatePolicy, HandlerRegistry, RegistrationInfo, RegistryBuilder,
};
pub use tokio_util::sync::CancellationToken;
