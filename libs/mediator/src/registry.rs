use std::{
    any::{Any, type_name},
    collections::{HashMap, hash_map::Entry},
    fmt,
    sync::Arc,
};

use tracing::{debug, warn};

use crate::{
    error::{HandlerNotFound, RegistryError},
    handler::Handler,
    message::{Command, Message, MessageKey, MessageKind, Query},
};

/// What to do when a (kind, message type) pair is registered twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [`RegistryError::DuplicateHandler`].
    #[default]
    Reject,
    /// Keep the most recent registration.
    Replace,
}

/// Describes one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub kind: MessageKind,
    pub message_type: &'static str,
    pub result_type: &'static str,
}

struct Registration {
    key: MessageKey,
    result_type: &'static str,
    // Always an `Arc<dyn Handler<M>>` where `M` is the type behind `key`.
    handler: Box<dyn Any + Send + Sync>,
}

impl Registration {
    fn new<M: Message>(key: MessageKey, handler: Arc<dyn Handler<M>>) -> Self {
        Self {
            key,
            result_type: type_name::<M::Output>(),
            handler: Box::new(handler),
        }
    }

    fn info(&self) -> RegistrationInfo {
        RegistrationInfo {
            kind: self.key.kind(),
            message_type: self.key.type_name(),
            result_type: self.result_type,
        }
    }
}

/// Collects handler registrations at startup.
///
/// ```ignore
/// let registry = HandlerRegistry::builder()
///     .command::<CreateEmployeeCommand, _>(create_handler)?
///     .query::<GetEmployeeByIdQuery, _>(get_handler)?
///     .build();
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    policy: DuplicatePolicy,
    entries: HashMap<MessageKey, Registration>,
}

impl RegistryBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn command<C, H>(self, handler: H) -> Result<Self, RegistryError>
    where
        C: Command,
        H: Handler<C>,
    {
        let handler: Arc<dyn Handler<C>> = Arc::new(handler);
        self.insert(Registration::new(MessageKey::command::<C>(), handler))
    }

    pub fn query<Q, H>(self, handler: H) -> Result<Self, RegistryError>
    where
        Q: Query,
        H: Handler<Q>,
    {
        let handler: Arc<dyn Handler<Q>> = Arc::new(handler);
        self.insert(Registration::new(MessageKey::query::<Q>(), handler))
    }

    fn insert(
        mut self, registration: Registration,
    ) -> Result<Self, RegistryError> {
        let key = registration.key;

        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                debug!(
                    message.kind = %key.kind(),
                    message.name = key.type_name(),
                    "Registered handler"
                );
                slot.insert(registration);
            }
            Entry::Occupied(mut slot) => {
                match self.policy {
                    DuplicatePolicy::Reject => {
                        return Err(RegistryError::DuplicateHandler {
                            kind: key.kind(),
                            message_type: key.type_name(),
                        });
                    }
                    DuplicatePolicy::Replace => {
                        warn!(
                            message.kind = %key.kind(),
                            message.name = key.type_name(),
                            "Replacing previously registered handler"
                        );
                        slot.insert(registration);
                    }
                }
            }
        }

        Ok(self)
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable (kind, message type) → handler table.
pub struct HandlerRegistry {
    entries: HashMap<MessageKey, Registration>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder { RegistryBuilder::new() }

    pub fn resolve_command<C: Command>(
        &self,
    ) -> Result<Arc<dyn Handler<C>>, HandlerNotFound> {
        self.resolve::<C>(MessageKind::Command)
    }

    pub fn resolve_query<Q: Query>(
        &self,
    ) -> Result<Arc<dyn Handler<Q>>, HandlerNotFound> {
        self.resolve::<Q>(MessageKind::Query)
    }

    pub(crate) fn resolve<M: Message>(
        &self, kind: MessageKind,
    ) -> Result<Arc<dyn Handler<M>>, HandlerNotFound> {
        let key = MessageKey::of::<M>(kind);

        self.entries
            .get(&key)
            .and_then(|entry| entry.handler.downcast_ref::<Arc<dyn Handler<M>>>())
            .cloned()
            .ok_or_else(|| HandlerNotFound::from(key))
    }

    pub fn contains(&self, key: &MessageKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entries ordered by kind, then message type name.
    pub fn registrations(&self) -> Vec<RegistrationInfo> {
        let mut infos: Vec<_> =
            self.entries.values().map(Registration::info).collect();
        infos.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.message_type.cmp(b.message_type))
        });
        infos
    }

    /// Fails with every key in `expected` that has no handler.
    pub fn ensure_registered(
        &self, expected: &[MessageKey],
    ) -> Result<(), RegistryError> {
        let missing: Vec<MessageKey> = expected
            .iter()
            .filter(|key| !self.contains(key))
            .copied()
            .collect();

        if missing.is_empty() {
            Ok(())
        }
        else {
            Err(RegistryError::MissingHandlers { missing })
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("registrations", &self.registrations())
            .finish()
    }
}
