//! High-level Dealerline client

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::*;
use crate::session::{SessionSnapshot, SessionStore};

/// Dealerline API client
///
/// Clones share one session. Authenticated calls send the access token as a
/// bearer token; when the API answers 401 the client exchanges the refresh
/// token once (concurrent callers wait for the same exchange) and replays
/// the request a single time.
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    session: Arc<SessionStore>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            http,
            session: Arc::new(SessionStore::default()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Exchange credentials for a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser> {
        let response = self
            .http
            .post(self.config.url("/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let tokens: TokenResponse = read_json(response).await?;
        let session = self.session.install(tokens).await;
        debug!(user_id = %session.user.id, "Logged in");
        Ok(session.user)
    }

    /// Revoke the current refresh token and drop the session.
    pub async fn logout(&self) -> Result<()> {
        let Some(session) = self.session.snapshot().await else {
            return Ok(());
        };
        let request = self
            .http
            .post(self.config.url("/auth/logout"))
            .json(&LogoutRequest {
                refresh_token: &session.refresh_token,
            })
            .build()?;
        let outcome = self.send_authorized(request).await;
        self.session.clear().await;
        match outcome {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => read_empty(response).await,
            // Nothing left to revoke
            Err(Error::SessionExpired) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn current_user(&self) -> Option<SessionUser> {
        self.session.snapshot().await.map(|s| s.user)
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.snapshot().await.is_some()
    }

    // ---- Showroom (public) ----

    pub async fn showroom(&self, search: &ShowroomSearch, page: PageRequest) -> Result<Page<ShowroomVehicle>> {
        let response = self
            .http
            .get(self.config.url("/showroom"))
            .query(search)
            .query(&page)
            .send()
            .await?;
        read_json(response).await
    }

    pub async fn showroom_vehicle(&self, id: &str) -> Result<ShowroomVehicle> {
        let response = self.http.get(self.config.url(&format!("/showroom/{}", id))).send().await?;
        read_json(response).await
    }

    // ---- Profile (customer session) ----

    pub async fn profile(&self) -> Result<Profile> {
        let request = self.http.get(self.config.url("/me")).build()?;
        self.execute(request).await
    }

    pub async fn my_invoices(&self, page: PageRequest) -> Result<Page<Invoice>> {
        let request = self.http.get(self.config.url("/me/invoices")).query(&page).build()?;
        self.execute(request).await
    }

    pub async fn pay_invoice(&self, invoice_id: &str, payment: &PayInvoice) -> Result<PaymentReceipt> {
        let request = self
            .http
            .post(self.config.url(&format!("/me/invoices/{}/pay", invoice_id)))
            .json(payment)
            .build()?;
        self.execute(request).await
    }

    pub async fn my_appointments(&self, page: PageRequest) -> Result<Page<Appointment>> {
        let request = self.http.get(self.config.url("/me/appointments")).query(&page).build()?;
        self.execute(request).await
    }

    /// Returns the new appointment's id.
    pub async fn book_appointment(&self, booking: &BookAppointment) -> Result<String> {
        let request = self.http.post(self.config.url("/me/appointments")).json(booking).build()?;
        let created: CreatedResponse = self.execute(request).await?;
        Ok(created.id)
    }

    pub async fn cancel_appointment(&self, appointment_id: &str, reason: Option<&str>) -> Result<()> {
        let request = self
            .http
            .post(self.config.url(&format!("/me/appointments/{}/cancel", appointment_id)))
            .json(&CancelAppointment {
                reason: reason.map(String::from),
            })
            .build()?;
        let response = self.send_authorized(request).await?;
        read_empty(response).await
    }

    // ---- Plumbing ----

    /// Send an authenticated request and decode its JSON body.
    pub async fn execute<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let response = self.send_authorized(request).await?;
        read_json(response).await
    }

    /// Build a request against an API path, for endpoints without a typed call.
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, self.config.url(path))
    }

    /// Send with the current access token; on 401 refresh and replay once.
    pub async fn send_authorized(&self, request: Request) -> Result<Response> {
        let session = self.session.snapshot().await.ok_or(Error::NotLoggedIn)?;
        let response = self.attempt(&request, &session.access_token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(url = %request.url(), generation = session.generation, "Access token rejected, refreshing");
        let access_token = self.refresh(session.generation).await?;
        self.attempt(&request, &access_token).await
    }

    async fn attempt(&self, request: &Request, access_token: &str) -> Result<Response> {
        let mut request = request
            .try_clone()
            .ok_or_else(|| Error::Other("Request body cannot be replayed".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| Error::Other(format!("Invalid access token: {}", e)))?;
        request.headers_mut().insert(AUTHORIZATION, bearer);
        Ok(self.http.execute(request).await?)
    }

    /// Single-flight refresh. `stale_generation` is the session the caller's
    /// 401 was answered for; if a newer one is installed by the time the
    /// gate is acquired, its token is reused without another exchange.
    async fn refresh(&self, stale_generation: u64) -> Result<String> {
        let _gate = self.session.refresh_gate().await;

        let current: SessionSnapshot = self.session.snapshot().await.ok_or(Error::SessionExpired)?;
        if current.generation != stale_generation {
            return Ok(current.access_token);
        }

        let response = self
            .http
            .post(self.config.url("/auth/refresh"))
            .json(&RefreshRequest {
                refresh_token: &current.refresh_token,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            warn!(%status, user_id = %current.user.id, "Refresh token refused, clearing session");
            self.session.clear().await;
            return Err(Error::SessionExpired);
        }
        let tokens: TokenResponse = read_json(response).await?;
        let installed = self.session.install(tokens).await;
        debug!(generation = installed.generation, "Session refreshed");
        Ok(installed.access_token)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::from_response(status, &body))
}

async fn read_empty(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::from_response(status, &body))
}
