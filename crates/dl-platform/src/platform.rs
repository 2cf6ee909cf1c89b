//! Platform wiring
//!
//! Builds repositories, services and the mediator over one document store,
//! and assembles the REST surface from the per-aggregate routers.

use std::sync::Arc;

use axum::Router;
use tracing::info;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::appointment::{self, api::appointments_router, AppointmentRepository};
use crate::audit::{self, api::audit_router, AuditLogRepository, EventRepository};
use crate::auth::{
    auth_router, Argon2Config, AuthApiState, AuthConfig, AuthService, PasswordPolicy, PasswordService,
    RefreshTokenRepository, SessionService,
};
use crate::customer::{self, api::customers_router, CustomerRepository};
use crate::dashboard::{self, api::dashboard_router};
use crate::invoice::{self, api::invoices_router, InvoiceRepository};
use crate::mediator::Mediator;
use crate::payment::{self, api::payments_router, PaymentRepository};
use crate::profile::profile_router;
use crate::purchase_order::{self, api::purchase_orders_router, PurchaseOrderRepository};
use crate::sales_order::{self, api::sales_orders_router, SalesOrderRepository};
use crate::service_order::{self, api::service_orders_router, ServiceOrderRepository};
use crate::shared::api_common::MediatorState;
use crate::shared::error::Result;
use crate::shared::health_api::{health_router, HealthState};
use crate::shared::middleware::{AppState, AuthLayer};
use crate::store::{DocumentStore, InMemoryStore};
use crate::usecase::{InMemoryUnitOfWork, UnitOfWork};
use crate::user::{self, api::users_router, UserRepository};
use crate::vehicle::{self, api::showroom_router, api::vehicles_router, VehicleRepository};
use crate::waiting_list::{self, api::waiting_list_router, WaitingListRepository};

/// Every repository over a shared store. Cheap to clone.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<UserRepository>,
    pub customers: Arc<CustomerRepository>,
    pub vehicles: Arc<VehicleRepository>,
    pub sales_orders: Arc<SalesOrderRepository>,
    pub invoices: Arc<InvoiceRepository>,
    pub payments: Arc<PaymentRepository>,
    pub purchase_orders: Arc<PurchaseOrderRepository>,
    pub service_orders: Arc<ServiceOrderRepository>,
    pub appointments: Arc<AppointmentRepository>,
    pub waiting_list: Arc<WaitingListRepository>,
    pub audit_logs: Arc<AuditLogRepository>,
    pub events: Arc<EventRepository>,
    pub refresh_tokens: Arc<RefreshTokenRepository>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Arc::new(UserRepository::new(store.clone())),
            customers: Arc::new(CustomerRepository::new(store.clone())),
            vehicles: Arc::new(VehicleRepository::new(store.clone())),
            sales_orders: Arc::new(SalesOrderRepository::new(store.clone())),
            invoices: Arc::new(InvoiceRepository::new(store.clone())),
            payments: Arc::new(PaymentRepository::new(store.clone())),
            purchase_orders: Arc::new(PurchaseOrderRepository::new(store.clone())),
            service_orders: Arc::new(ServiceOrderRepository::new(store.clone())),
            appointments: Arc::new(AppointmentRepository::new(store.clone())),
            waiting_list: Arc::new(WaitingListRepository::new(store.clone())),
            audit_logs: Arc::new(AuditLogRepository::new(store.clone())),
            events: Arc::new(EventRepository::new(store.clone())),
            refresh_tokens: Arc::new(RefreshTokenRepository::new(store)),
        }
    }
}

/// Knobs the binary derives from its configuration.
#[derive(Debug, Clone)]
pub struct PlatformSettings {
    pub auth: AuthConfig,
    pub argon2: Argon2Config,
    pub password_policy: PasswordPolicy,
    pub session_cookie_name: String,
    /// Mark the refresh cookie `Secure`
    pub secure_cookie: bool,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            argon2: Argon2Config::default(),
            password_policy: PasswordPolicy::default(),
            session_cookie_name: "dl_session".to_string(),
            secure_cookie: false,
        }
    }
}

impl PlatformSettings {
    /// Fixed secret and cheap hashing for tests and local tooling.
    pub fn testing() -> Self {
        Self {
            auth: AuthConfig {
                secret_key: "dealerline-test-secret".to_string(),
                ..Default::default()
            },
            argon2: Argon2Config::testing(),
            ..Default::default()
        }
    }
}

/// The assembled platform: store, repositories, services and mediator.
#[derive(Clone)]
pub struct Platform {
    pub store: Arc<dyn DocumentStore>,
    pub repos: Repositories,
    pub mediator: Arc<Mediator>,
    pub auth_service: Arc<AuthService>,
    pub passwords: Arc<PasswordService>,
    pub sessions: Arc<SessionService>,
    session_cookie_name: String,
    secure_cookie: bool,
}

impl Platform {
    /// Wire every aggregate's handlers against `unit_of_work`.
    pub fn build<U: UnitOfWork + 'static>(
        store: Arc<dyn DocumentStore>,
        unit_of_work: Arc<U>,
        settings: PlatformSettings,
    ) -> Result<Self> {
        let repos = Repositories::new(store.clone());
        let passwords = Arc::new(PasswordService::new(settings.argon2, settings.password_policy)?);
        let auth_service = Arc::new(AuthService::new(settings.auth));
        let sessions = Arc::new(SessionService::new(
            auth_service.clone(),
            passwords.clone(),
            repos.users.clone(),
            repos.refresh_tokens.clone(),
        ));

        let mut mediator = Mediator::new();
        vehicle::register(&mut mediator, &repos, &unit_of_work);
        purchase_order::register(&mut mediator, &repos, &unit_of_work);
        waiting_list::register(&mut mediator, &repos, &unit_of_work);
        customer::register(&mut mediator, &repos, &unit_of_work);
        sales_order::register(&mut mediator, &repos, &unit_of_work);
        invoice::register(&mut mediator, &repos, &unit_of_work);
        payment::register(&mut mediator, &repos, &unit_of_work);
        service_order::register(&mut mediator, &repos, &unit_of_work);
        appointment::register(&mut mediator, &repos, &unit_of_work);
        user::register(&mut mediator, &repos, &passwords, &unit_of_work);
        audit::register(&mut mediator, &repos);
        dashboard::register(&mut mediator, &repos);
        info!("Platform handlers registered");

        Ok(Self {
            store,
            repos,
            mediator: Arc::new(mediator),
            auth_service,
            passwords,
            sessions,
            session_cookie_name: settings.session_cookie_name,
            secure_cookie: settings.secure_cookie,
        })
    }

    /// A platform over a fresh process-local store.
    pub fn in_memory(settings: PlatformSettings) -> Result<Self> {
        let store = Arc::new(InMemoryStore::new());
        let unit_of_work = Arc::new(InMemoryUnitOfWork::new(store.clone()));
        Self::build(store, unit_of_work, settings)
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            auth_service: self.auth_service.clone(),
            session_cookie_name: self.session_cookie_name.clone(),
        }
    }

    pub fn health_state(&self, version: Option<String>) -> HealthState {
        HealthState::new(self.store.clone(), version)
    }

    /// All REST routes, relative to the API root.
    pub fn api_router(&self) -> OpenApiRouter {
        let state = MediatorState::new(self.mediator.clone());
        let auth_state = AuthApiState::new(
            self.sessions.clone(),
            self.mediator.clone(),
            self.auth_service.access_token_expiry_secs(),
        )
        .with_secure_cookie(self.secure_cookie);

        OpenApiRouter::new()
            .nest("/vehicles", vehicles_router(state.clone()))
            .nest("/showroom", showroom_router(state.clone()))
            .nest("/purchase-orders", purchase_orders_router(state.clone()))
            .nest("/waiting-list", waiting_list_router(state.clone()))
            .nest("/customers", customers_router(state.clone()))
            .nest("/sales-orders", sales_orders_router(state.clone()))
            .nest("/invoices", invoices_router(state.clone()))
            .nest("/payments", payments_router(state.clone()))
            .nest("/service-orders", service_orders_router(state.clone()))
            .nest("/appointments", appointments_router(state.clone()))
            .nest("/users", users_router(state.clone()))
            .nest("/audit", audit_router(state.clone()))
            .nest("/dashboard", dashboard_router(state.clone()))
            .nest("/me", profile_router(state))
            .nest("/auth", auth_router(auth_state))
    }

    /// The API mounted under `/api`, with its OpenAPI document.
    pub fn api_parts(&self) -> (Router, OpenApi) {
        let (router, mut openapi) = OpenApiRouter::new().nest("/api", self.api_router()).split_for_parts();

        openapi.info.title = "Dealerline API".to_string();
        openapi.info.version = env!("CARGO_PKG_VERSION").to_string();
        openapi.info.description = Some("Inventory, sales, workshop and customer self-service".to_string());
        openapi.components.get_or_insert_with(Default::default).add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );

        (router, openapi)
    }

    /// API and health routes behind the auth layer, without docs or
    /// transport layers.
    pub fn router(&self, version: Option<String>) -> Router {
        let (api, _) = self.api_parts();
        api.nest("/health", health_router(self.health_state(version)))
            .layer(AuthLayer::new(self.app_state()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_openapi_lists_aggregate_paths() {
        let platform = Platform::in_memory(PlatformSettings::testing()).unwrap();
        let (_, openapi) = platform.api_parts();

        let paths: Vec<&String> = openapi.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.starts_with("/api/showroom")));
        assert!(paths.iter().any(|p| p.starts_with("/api/auth/refresh")));
        assert!(openapi
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer_auth"))
            .unwrap_or(false));
    }

    #[tokio::test]
    async fn test_protected_route_rejects_anonymous() {
        let platform = Platform::in_memory(PlatformSettings::testing()).unwrap();
        let response = platform
            .router(None)
            .oneshot(Request::builder().uri("/api/dashboard/summary").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
