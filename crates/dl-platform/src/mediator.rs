//! Mediator
//!
//! Routes every command and query to exactly one registered handler, keyed
//! by the request's type. The mediator is assembled once at startup and
//! shared as `Arc<Mediator>`.
//!
//! ```ignore
//! let mut mediator = Mediator::new();
//! mediator.register_command::<CreateVehicleCommand, _>(create_vehicle_use_case);
//! mediator.register_query::<GetVehicleQuery, _>(vehicle_queries.clone());
//!
//! let event = mediator.send(command, ctx).await.into_result()?;
//! let vehicle = mediator.query(GetVehicleQuery { id }).await?;
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::shared::error::{PlatformError, Result};
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

/// A state-changing request. Serialized into the audit log on commit.
pub trait Command: Serialize + Send + Sync + 'static {
    type Output: Send + 'static;
}

/// A read-only request.
pub trait Query: Send + Sync + 'static {
    type Output: Send + 'static;
}

#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    async fn handle(&self, command: C, ctx: ExecutionContext) -> UseCaseResult<C::Output>;
}

#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    async fn handle(&self, query: Q) -> Result<Q::Output>;
}

/// Implement `CommandHandler` for a use case whose `execute` has the
/// handler signature.
#[macro_export]
macro_rules! impl_command_handler {
    ($use_case:ident, $command:ty) => {
        #[async_trait::async_trait]
        impl<U: $crate::usecase::UnitOfWork + 'static> $crate::mediator::CommandHandler<$command>
            for $use_case<U>
        {
            async fn handle(
                &self,
                command: $command,
                ctx: $crate::usecase::ExecutionContext,
            ) -> $crate::usecase::UseCaseResult<<$command as $crate::mediator::Command>::Output> {
                self.execute(command, ctx).await
            }
        }
    };
}

fn short_name<T>() -> &'static str {
    let name = type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

#[derive(Default)]
pub struct Mediator {
    commands: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    queries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Mediator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the handler for `C`, replacing any previous one.
    pub fn register_command<C, H>(&mut self, handler: Arc<H>)
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler: Arc<dyn CommandHandler<C>> = handler;
        if self.commands.insert(TypeId::of::<C>(), Box::new(handler)).is_some() {
            warn!(command = short_name::<C>(), "Replaced existing command handler");
        }
    }

    /// Register the handler for `Q`, replacing any previous one.
    pub fn register_query<Q, H>(&mut self, handler: Arc<H>)
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        let handler: Arc<dyn QueryHandler<Q>> = handler;
        if self.queries.insert(TypeId::of::<Q>(), Box::new(handler)).is_some() {
            warn!(query = short_name::<Q>(), "Replaced existing query handler");
        }
    }

    pub fn has_command_handler<C: Command>(&self) -> bool {
        self.commands.contains_key(&TypeId::of::<C>())
    }

    pub fn has_query_handler<Q: Query>(&self) -> bool {
        self.queries.contains_key(&TypeId::of::<Q>())
    }

    /// Dispatch a command to its handler.
    pub async fn send<C: Command>(&self, command: C, ctx: ExecutionContext) -> UseCaseResult<C::Output> {
        let name = short_name::<C>();
        let Some(handler) = self
            .commands
            .get(&TypeId::of::<C>())
            .and_then(|h| h.downcast_ref::<Arc<dyn CommandHandler<C>>>())
            .cloned()
        else {
            warn!(command = name, "No handler registered");
            return UseCaseResult::failure(UseCaseError::internal(
                "HANDLER_NOT_REGISTERED",
                format!("No handler registered for command {}", name),
            ));
        };

        let start = Instant::now();
        let result = handler.handle(command, ctx.clone()).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match result.error() {
            None => debug!(
                command = name,
                execution_id = %ctx.execution_id,
                principal_id = %ctx.principal_id,
                elapsed_ms,
                "Command handled"
            ),
            Some(e) => debug!(
                command = name,
                execution_id = %ctx.execution_id,
                code = e.code(),
                elapsed_ms,
                "Command rejected"
            ),
        }
        result
    }

    /// Dispatch a query to its handler.
    pub async fn query<Q: Query>(&self, query: Q) -> Result<Q::Output> {
        let name = short_name::<Q>();
        let handler = self
            .queries
            .get(&TypeId::of::<Q>())
            .and_then(|h| h.downcast_ref::<Arc<dyn QueryHandler<Q>>>())
            .cloned()
            .ok_or_else(|| {
                warn!(query = name, "No handler registered");
                PlatformError::UseCase(UseCaseError::internal(
                    "HANDLER_NOT_REGISTERED",
                    format!("No handler registered for query {}", name),
                ))
            })?;

        let start = Instant::now();
        let result = handler.handle(query).await;
        debug!(
            query = name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Query handled"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use crate::usecase::{EventMetadata, HasId, InMemoryUnitOfWork, UnitOfWork};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Serialize)]
    struct Ping {
        id: String,
    }

    #[derive(Serialize)]
    struct Pinged {
        #[serde(flatten)]
        metadata: EventMetadata,
    }
    crate::impl_domain_event!(Pinged);

    impl Command for Ping {
        type Output = Pinged;
    }

    #[derive(Serialize)]
    struct Pong {
        #[serde(rename = "_id")]
        id: String,
    }

    impl HasId for Pong {
        fn id(&self) -> &str {
            &self.id
        }
        fn collection_name() -> &'static str {
            "pongs"
        }
    }

    struct PingUseCase<U: UnitOfWork> {
        unit_of_work: Arc<U>,
    }

    impl<U: UnitOfWork> PingUseCase<U> {
        async fn execute(&self, command: Ping, ctx: ExecutionContext) -> UseCaseResult<Pinged> {
            if command.id.is_empty() {
                return UseCaseResult::failure(UseCaseError::validation("ID_REQUIRED", "id is required"));
            }
            let pong = Pong { id: command.id.clone() };
            let event = Pinged {
                metadata: EventMetadata::for_aggregate(&ctx, "test", "pong", "created", &pong.id),
            };
            self.unit_of_work.commit(&pong, event, &command).await
        }
    }

    crate::impl_command_handler!(PingUseCase, Ping);

    struct CountQuery;

    impl Query for CountQuery {
        type Output = usize;
    }

    struct Counter(AtomicUsize, usize);

    #[async_trait]
    impl QueryHandler<CountQuery> for Counter {
        async fn handle(&self, _query: CountQuery) -> Result<usize> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(self.1)
        }
    }

    fn mediator() -> Mediator {
        let uow = Arc::new(InMemoryUnitOfWork::new(Arc::new(InMemoryStore::new())));
        let mut mediator = Mediator::new();
        mediator.register_command::<Ping, _>(Arc::new(PingUseCase { unit_of_work: uow }));
        mediator
    }

    #[tokio::test]
    async fn test_send_dispatches_to_handler() {
        let mediator = mediator();
        assert!(mediator.has_command_handler::<Ping>());

        let ctx = ExecutionContext::create("user-1");
        let event = mediator.send(Ping { id: "P1".into() }, ctx).await.unwrap();
        assert_eq!(event.metadata.subject, "test.pong.P1");

        let err = mediator
            .send(Ping { id: String::new() }, ExecutionContext::create("user-1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ID_REQUIRED");
    }

    #[tokio::test]
    async fn test_unregistered_types_fail() {
        let mediator = Mediator::new();
        assert!(!mediator.has_query_handler::<CountQuery>());

        let err = mediator
            .send(Ping { id: "P1".into() }, ExecutionContext::create("user-1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "HANDLER_NOT_REGISTERED");

        match mediator.query(CountQuery).await {
            Err(PlatformError::UseCase(e)) => assert_eq!(e.code(), "HANDLER_NOT_REGISTERED"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_second_registration_replaces_first() {
        let mut mediator = mediator();
        let first = Arc::new(Counter(AtomicUsize::new(0), 1));
        let second = Arc::new(Counter(AtomicUsize::new(0), 2));
        mediator.register_query::<CountQuery, _>(first.clone());
        mediator.register_query::<CountQuery, _>(second.clone());

        assert_eq!(mediator.query(CountQuery).await.unwrap(), 2);
        assert_eq!(first.0.load(Ordering::SeqCst), 0);
        assert_eq!(second.0.load(Ordering::SeqCst), 1);
    }
}
