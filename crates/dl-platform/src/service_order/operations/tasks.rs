//! Service Task / Technician Use Cases

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::events::{ServiceTaskAdded, ServiceTaskRemoved, TechnicianAssigned};
use super::{load_service_order, require_active};
use crate::mediator::Command;
use crate::service_order::repository::ServiceOrderRepository;
use crate::shared::validation::{max_length, required};
use crate::try_use_case;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult};
use crate::user::repository::UserRepository;

pub const MAX_TASK_DESCRIPTION_LENGTH: usize = 500;

/// 99.9 hours
pub const MAX_LABOR_HOURS_TENTHS: u32 = 999;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddServiceTaskCommand {
    #[serde(default)]
    pub service_order_id: String,
    pub description: String,
    #[serde(default)]
    pub labor_hours_tenths: u32,
    #[serde(default)]
    pub labor_rate_cents: i64,
    #[serde(default)]
    pub parts_cost_cents: i64,
}

impl Command for AddServiceTaskCommand {
    type Output = ServiceTaskAdded;
}

pub struct AddServiceTaskUseCase<U: UnitOfWork> {
    service_orders: Arc<ServiceOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> AddServiceTaskUseCase<U> {
    pub fn new(service_orders: Arc<ServiceOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            service_orders,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: AddServiceTaskCommand, ctx: ExecutionContext) -> UseCaseResult<ServiceTaskAdded> {
        let description = try_use_case!(required(&command.description, "DESCRIPTION_REQUIRED", "Description"));
        try_use_case!(max_length(
            &description,
            MAX_TASK_DESCRIPTION_LENGTH,
            "DESCRIPTION_TOO_LONG",
            "Description"
        ));
        try_use_case!(dl_common::money::non_negative(command.labor_rate_cents));
        try_use_case!(dl_common::money::non_negative(command.parts_cost_cents));
        if command.labor_hours_tenths > MAX_LABOR_HOURS_TENTHS {
            return UseCaseResult::failure(UseCaseError::validation(
                "INVALID_LABOR_HOURS",
                "Labor hours must be at most 99.9",
            ));
        }
        if command.labor_hours_tenths == 0 && command.parts_cost_cents == 0 {
            return UseCaseResult::failure(UseCaseError::validation(
                "EMPTY_TASK",
                "A task needs labor hours or a parts cost",
            ));
        }

        let mut order = try_use_case!(load_service_order(&self.service_orders, &command.service_order_id).await);
        try_use_case!(require_active(&order));

        let task = order
            .add_task(
                description,
                command.labor_hours_tenths,
                command.labor_rate_cents,
                command.parts_cost_cents,
            )
            .clone();

        let event = ServiceTaskAdded::new(&ctx, &order.id, &task);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(AddServiceTaskUseCase, AddServiceTaskCommand);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveServiceTaskCommand {
    pub service_order_id: String,
    pub task_id: String,
}

impl Command for RemoveServiceTaskCommand {
    type Output = ServiceTaskRemoved;
}

pub struct RemoveServiceTaskUseCase<U: UnitOfWork> {
    service_orders: Arc<ServiceOrderRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> RemoveServiceTaskUseCase<U> {
    pub fn new(service_orders: Arc<ServiceOrderRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            service_orders,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: RemoveServiceTaskCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<ServiceTaskRemoved> {
        let mut order = try_use_case!(load_service_order(&self.service_orders, &command.service_order_id).await);
        try_use_case!(require_active(&order));

        if order.remove_task(&command.task_id).is_none() {
            return UseCaseResult::failure(UseCaseError::not_found(
                "TASK_NOT_FOUND",
                format!("Task '{}' not found on service order {}", command.task_id, order.order_number),
            ));
        }

        let event = ServiceTaskRemoved::new(&ctx, &order.id, &command.task_id);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(RemoveServiceTaskUseCase, RemoveServiceTaskCommand);

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignTechnicianCommand {
    #[serde(default)]
    pub service_order_id: String,
    pub technician_id: String,
}

impl Command for AssignTechnicianCommand {
    type Output = TechnicianAssigned;
}

pub struct AssignTechnicianUseCase<U: UnitOfWork> {
    service_orders: Arc<ServiceOrderRepository>,
    users: Arc<UserRepository>,
    unit_of_work: Arc<U>,
}

impl<U: UnitOfWork> AssignTechnicianUseCase<U> {
    pub fn new(service_orders: Arc<ServiceOrderRepository>, users: Arc<UserRepository>, unit_of_work: Arc<U>) -> Self {
        Self {
            service_orders,
            users,
            unit_of_work,
        }
    }

    pub async fn execute(&self, command: AssignTechnicianCommand, ctx: ExecutionContext) -> UseCaseResult<TechnicianAssigned> {
        let mut order = try_use_case!(load_service_order(&self.service_orders, &command.service_order_id).await);
        try_use_case!(require_active(&order));

        let technician = try_use_case!(self.users.find_by_id(&command.technician_id).await);
        let Some(technician) = technician.filter(|u| u.active && u.role.is_staff()) else {
            return UseCaseResult::failure(UseCaseError::validation(
                "INVALID_TECHNICIAN",
                format!("'{}' is not an active staff member", command.technician_id),
            ));
        };

        let previous = order.technician_id.replace(technician.id);
        order.touch();

        let event = TechnicianAssigned::new(&ctx, &order, previous);
        self.unit_of_work.commit(&order, event, &command).await
    }
}

crate::impl_command_handler!(AssignTechnicianUseCase, AssignTechnicianCommand);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service_order::entity::{ServiceOrder, ServiceOrderStatus};
    use crate::test_support::{ctx, Memory};
    use crate::user::entity::{User, UserRole};

    async fn seed_order(mem: &Memory) -> ServiceOrder {
        let order = ServiceOrder::open("C1", "2T1BURHE0JC074587", "Oil leak");
        mem.put(&order).await;
        order
    }

    fn task(order_id: &str) -> AddServiceTaskCommand {
        AddServiceTaskCommand {
            service_order_id: order_id.into(),
            description: "Replace oil pan gasket".into(),
            labor_hours_tenths: 25,
            labor_rate_cents: 12_000,
            parts_cost_cents: 4_500,
        }
    }

    #[tokio::test]
    async fn test_add_and_remove_task() {
        let mem = Memory::new();
        let orders = Arc::new(ServiceOrderRepository::new(mem.dyn_store()));
        let order = seed_order(&mem).await;

        let add = AddServiceTaskUseCase::new(orders.clone(), mem.uow.clone());
        let added = add.execute(task(&order.id), ctx()).await.unwrap();
        assert_eq!(added.labor_cents, 30_000);

        let empty = AddServiceTaskCommand {
            labor_hours_tenths: 0,
            parts_cost_cents: 0,
            ..task(&order.id)
        };
        assert_eq!(add.execute(empty, ctx()).await.unwrap_err().code(), "EMPTY_TASK");

        let remove = RemoveServiceTaskUseCase::new(orders.clone(), mem.uow.clone());
        let cmd = RemoveServiceTaskCommand {
            service_order_id: order.id.clone(),
            task_id: added.task_id.clone(),
        };
        remove.execute(cmd.clone(), ctx()).await.unwrap();
        assert!(orders.find_by_id(&order.id).await.unwrap().unwrap().tasks.is_empty());
        assert_eq!(remove.execute(cmd, ctx()).await.unwrap_err().code(), "TASK_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_tasks_locked_after_completion() {
        let mem = Memory::new();
        let orders = Arc::new(ServiceOrderRepository::new(mem.dyn_store()));
        let mut order = seed_order(&mem).await;
        order.status = ServiceOrderStatus::Completed;
        mem.put(&order).await;

        let add = AddServiceTaskUseCase::new(orders, mem.uow.clone());
        assert_eq!(add.execute(task(&order.id), ctx()).await.unwrap_err().code(), "SERVICE_ORDER_CLOSED");
    }

    #[tokio::test]
    async fn test_assign_requires_active_staff() {
        let mem = Memory::new();
        let orders = Arc::new(ServiceOrderRepository::new(mem.dyn_store()));
        let users = Arc::new(UserRepository::new(mem.dyn_store()));
        let order = seed_order(&mem).await;
        let tech = User::new("tech@dealer.test", "Grace", "hash", UserRole::Service);
        let customer = User::new("ada@example.com", "Ada", "hash", UserRole::Customer);
        mem.put(&tech).await;
        mem.put(&customer).await;

        let uc = AssignTechnicianUseCase::new(orders.clone(), users, mem.uow.clone());
        let assign = |technician_id: &str| AssignTechnicianCommand {
            service_order_id: order.id.clone(),
            technician_id: technician_id.into(),
        };

        let event = uc.execute(assign(&tech.id), ctx()).await.unwrap();
        assert_eq!(event.technician_id, tech.id);
        assert!(event.previous_technician_id.is_none());
        assert_eq!(uc.execute(assign(&customer.id), ctx()).await.unwrap_err().code(), "INVALID_TECHNICIAN");
    }
}
