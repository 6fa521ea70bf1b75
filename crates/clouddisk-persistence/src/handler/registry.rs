// Registry of entity handler sets for the active backend

use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::model::{
    AccessTokenRecord, Backend, DirectLinkRecord, Entity, RoleRecord, TagRecord, UserRecord,
};
use crate::operation::{OperationKind, OperationVariant};

use super::{EntityHandlers, find_mismatch};

/// Immutable routing table: one [`EntityHandlers`] per entity, every handler
/// belonging to the same backend.
pub struct HandlerRegistry {
    backend: Backend,
    users: EntityHandlers<UserRecord>,
    roles: EntityHandlers<RoleRecord>,
    tags: EntityHandlers<TagRecord>,
    access_tokens: EntityHandlers<AccessTokenRecord>,
    direct_links: EntityHandlers<DirectLinkRecord>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl HandlerRegistry {
    pub fn builder(backend: Backend) -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new(backend)
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn handlers<E: RegistrySlot>(&self) -> &EntityHandlers<E> {
        E::handlers(self)
    }
}

/// Ties a record type to its field in [`HandlerRegistry`]
pub trait RegistrySlot: Entity {
    fn handlers(registry: &HandlerRegistry) -> &EntityHandlers<Self>;

    fn slot(builder: &mut HandlerRegistryBuilder) -> &mut Option<EntityHandlers<Self>>;
}

macro_rules! registry_slot {
    ($record:ty, $field:ident) => {
        impl RegistrySlot for $record {
            fn handlers(registry: &HandlerRegistry) -> &EntityHandlers<Self> {
                &registry.$field
            }

            fn slot(builder: &mut HandlerRegistryBuilder) -> &mut Option<EntityHandlers<Self>> {
                &mut builder.$field
            }
        }
    };
}

registry_slot!(UserRecord, users);
registry_slot!(RoleRecord, roles);
registry_slot!(TagRecord, tags);
registry_slot!(AccessTokenRecord, access_tokens);
registry_slot!(DirectLinkRecord, direct_links);

pub struct HandlerRegistryBuilder {
    backend: Backend,
    users: Option<EntityHandlers<UserRecord>>,
    roles: Option<EntityHandlers<RoleRecord>>,
    tags: Option<EntityHandlers<TagRecord>>,
    access_tokens: Option<EntityHandlers<AccessTokenRecord>>,
    direct_links: Option<EntityHandlers<DirectLinkRecord>>,
    error: Option<ConfigurationError>,
}

fn take_slot<E: RegistrySlot>(
    slot: Option<EntityHandlers<E>>,
    backend: Backend,
) -> Result<EntityHandlers<E>, ConfigurationError> {
    let handlers = slot.ok_or(ConfigurationError::MissingHandler {
        kind: OperationKind::new(E::KIND, OperationVariant::Create),
    })?;
    if let Some((kind, found)) = find_mismatch(&handlers, backend) {
        return Err(ConfigurationError::BackendMismatch {
            kind,
            expected: backend,
            found,
        });
    }
    Ok(handlers)
}

impl HandlerRegistryBuilder {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            users: None,
            roles: None,
            tags: None,
            access_tokens: None,
            direct_links: None,
            error: None,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Register the handler set for `E`. Registering the same entity twice
    /// fails the build.
    pub fn register<E: RegistrySlot>(mut self, handlers: EntityHandlers<E>) -> Self {
        let slot = E::slot(&mut self);
        if slot.is_some() {
            self.error
                .get_or_insert(ConfigurationError::DuplicateHandler { entity: E::KIND });
        } else {
            *slot = Some(handlers);
        }
        self
    }

    /// Check completeness and backend consistency
    pub fn build(self) -> Result<HandlerRegistry, ConfigurationError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let backend = self.backend;
        Ok(HandlerRegistry {
            backend,
            users: take_slot(self.users, backend)?,
            roles: take_slot(self.roles, backend)?,
            tags: take_slot(self.tags, backend)?,
            access_tokens: take_slot(self.access_tokens, backend)?,
            direct_links: take_slot(self.direct_links, backend)?,
        })
    }

    pub fn build_shared(self) -> Result<Arc<HandlerRegistry>, ConfigurationError> {
        self.build().map(Arc::new)
    }
}
