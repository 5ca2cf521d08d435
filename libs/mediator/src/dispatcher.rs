use std::{any::type_name, sync::Arc};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::DispatchError,
    message::{Command, Message, MessageKind, Query},
    registry::HandlerRegistry,
};

/// Routes commands and queries to their registered handler.
///
/// Cloning is cheap; every clone shares the same read-only registry.
#[derive(Clone, Debug)]
pub struct Mediator {
    registry: Arc<HandlerRegistry>,
}

impl Mediator {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn from_shared(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry { &self.registry }

    pub async fn send_command<C: Command>(
        &self, command: C, cancel: &CancellationToken,
    ) -> Result<C::Output, DispatchError<C::Error>> {
        self.dispatch(MessageKind::Command, command, cancel).await
    }

    pub async fn send_query<Q: Query>(
        &self, query: Q, cancel: &CancellationToken,
    ) -> Result<Q::Output, DispatchError<Q::Error>> {
        self.dispatch(MessageKind::Query, query, cancel).await
    }

    async fn dispatch<M: Message>(
        &self, kind: MessageKind, message: M, cancel: &CancellationToken,
    ) -> Result<M::Output, DispatchError<M::Error>> {
        let message_type = type_name::<M>();

        if cancel.is_cancelled() {
            debug!(
                message.kind = %kind,
                message.name = message_type,
                "Dispatch cancelled before routing"
            );
            return Err(DispatchError::Cancelled { kind, message_type });
        }

        let handler = self.registry.resolve::<M>(kind).inspect_err(|err| {
            warn!(message.kind = %kind, message.name = message_type, "{err}");
        })?;

        info!(
            message.kind = %kind,
            message.name = message_type,
            "Executing {kind}: {}",
            short_name(message_type)
        );

        handler.handle(message, cancel).await.map_err(|source| {
            warn!(
                message.kind = %kind,
                message.name = message_type,
                error = %source,
                "Handler failed"
            );
            DispatchError::Handler {
                kind,
                message_type,
                source,
            }
        })
    }
}

/// `employee_commands::CreateEmployeeCommand` -> `CreateEmployeeCommand`
fn short_name(type_name: &'static str) -> &'static str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}
