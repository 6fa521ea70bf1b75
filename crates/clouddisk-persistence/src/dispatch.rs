//! Routes typed operations to the handler registered for them

use std::sync::Arc;

use tracing::trace;

use crate::error::Result;
use crate::handler::HandlerRegistry;
use crate::model::Backend;
use crate::operation::Operation;

#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn from_arc(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn backend(&self) -> Backend {
        self.registry.backend()
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Run `op` on the caller's task through its single handler
    pub async fn execute<O: Operation>(&self, op: O) -> Result<O::Output> {
        let handler = O::route(self.registry.handlers::<O::Entity>());
        trace!(kind = %O::kind(), backend = %self.registry.backend(), "Dispatching operation");
        handler.handle(op).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::handler::registry::testing::recording_registry;
    use crate::model::{
        AccessTokenRecord, DirectLinkRecord, EntityKind, RoleRecord, TagRecord, UserRecord,
    };
    use crate::operation::*;
    use crate::paging::PageRequest;
    use crate::query::{LogicalQuery, LogicalUpdate};

    async fn run_every_variant<E: crate::handler::RegistrySlot + Default>(dispatcher: &Dispatcher) {
        dispatcher.execute(Create::new(E::default())).await.unwrap();
        dispatcher.execute(CreateAll::new(vec![E::default()])).await.unwrap();
        dispatcher.execute(FindById::<E>::new("x")).await.unwrap();
        dispatcher
            .execute(FindPage::<E>::new(LogicalQuery::new(), PageRequest::new(1, 10)))
            .await
            .unwrap();
        dispatcher.execute(Count::<E>::all()).await.unwrap();
        dispatcher
            .execute(UpdateField::<E>::new("x", LogicalUpdate::new().unset("name")))
            .await
            .unwrap();
        dispatcher
            .execute(UpdateWhere::<E>::new(LogicalQuery::new(), LogicalUpdate::new()))
            .await
            .unwrap();
        dispatcher.execute(DeleteById::<E>::new("x")).await.unwrap();
        dispatcher
            .execute(DeleteAllByIds::<E>::new(vec!["x".into()]))
            .await
            .unwrap();
        dispatcher
            .execute(DeleteWhere::<E>::new(LogicalQuery::new()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_each_variant_reaches_exactly_one_handler() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(recording_registry(Backend::RelationalStore, calls.clone()));

        run_every_variant::<UserRecord>(&dispatcher).await;
        run_every_variant::<RoleRecord>(&dispatcher).await;
        run_every_variant::<TagRecord>(&dispatcher).await;
        run_every_variant::<AccessTokenRecord>(&dispatcher).await;
        run_every_variant::<DirectLinkRecord>(&dispatcher).await;

        let recorded = calls.lock().unwrap().clone();
        let expected: Vec<OperationKind> = OperationKind::all().collect();
        assert_eq!(recorded, expected);
    }

    #[tokio::test]
    async fn test_outputs_are_typed() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::new(recording_registry(Backend::DocumentStore, calls));

        let tag = TagRecord {
            id: "t1".into(),
            name: "rust".into(),
            ..Default::default()
        };
        let created: TagRecord = dispatcher.execute(Create::new(tag.clone())).await.unwrap();
        assert_eq!(created, tag);

        let removed: u64 = dispatcher
            .execute(DeleteAllByIds::<TagRecord>::new(vec!["a".into(), "b".into()]))
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let found = dispatcher
            .execute(FindById::<TagRecord>::new("t1"))
            .await
            .unwrap();
        assert!(found.is_none());
        assert_eq!(dispatcher.backend(), Backend::DocumentStore);
        assert_eq!(<Count<TagRecord>>::kind().entity, EntityKind::Tag);
    }
}
