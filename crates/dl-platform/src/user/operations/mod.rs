//! User Operations

pub mod activation;
pub mod create;
pub mod events;
pub mod password;
pub mod register;
pub mod update;

pub use activation::{ActivateUserCommand, ActivateUserUseCase, DeactivateUserCommand, DeactivateUserUseCase};
pub use create::{CreateUserCommand, CreateUserUseCase};
pub use events::*;
pub use password::{ChangePasswordCommand, ChangePasswordUseCase};
pub use register::{RegisterCustomerAccountCommand, RegisterCustomerAccountUseCase};
pub use update::{UpdateUserCommand, UpdateUserUseCase};
