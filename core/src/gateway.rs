//! Executing service layer.
//!
//! # Design
//! `Gateway` wires the stateless `GatewayClient` to a `Transport`, the
//! credential store and the user cache. Each call resolves the country
//! (explicit argument, then persisted selection, then configured default),
//! attaches the stored bearer token where the endpoint needs one, performs
//! exactly one round-trip per endpoint and never retries. Errors surface to
//! the caller as `ApiError`; none of them is fatal.
//!
//! The gateway owns its cache and store, so independent instances (one per
//! test, one per signed-in device profile) never share state.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::client::{AuthContext, GatewayClient};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::country::Country;
use crate::draft::OrderDraft;
use crate::error::{ApiError, ValidationError};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::session::UserCache;
use crate::store::{CredentialStore, KeyValueStore};
use crate::transport::UreqTransport;
use crate::types::{
    AuthSession, CreateOrder, CreateVisit, Delivery, LoginRequest, Order, OrderFilter, OrderKind,
    Page, Product, ProductDetail, ProductLocation, ProductOverview, Registration, Role, UserInfo,
    UserSummary, Visit, VisitFilter,
};

pub const NOT_AUTHENTICATED: &str = "No access token available. Please log in.";

/// Who the order is for, beyond what the signed-in user implies.
///
/// A seller places orders for a client (`cliente_id`); an institutional
/// customer places orders with a seller (`vendedor_id`); an admin names both.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrderSubmission {
    pub tipo: OrderKind,
    pub cliente_id: Option<String>,
    pub vendedor_id: Option<String>,
    /// Falls back to the first draft line that names a warehouse.
    pub bodega_origen_id: Option<String>,
    pub observaciones: Option<String>,
}

impl Default for OrderSubmission {
    fn default() -> Self {
        Self {
            tipo: OrderKind::Venta,
            cliente_id: None,
            vendedor_id: None,
            bodega_origen_id: None,
            observaciones: None,
        }
    }
}

/// Build the `POST /pedidos` body for `user` from a validated draft.
pub fn compose_order(
    user: &UserInfo,
    draft: &OrderDraft,
    submission: &OrderSubmission,
) -> Result<CreateOrder, ValidationError> {
    draft.validate()?;

    let (cliente_id, vendedor_id) = match user.role {
        Role::Seller => (
            submission.cliente_id.clone().ok_or(ValidationError::Required("cliente_id"))?,
            user.id.clone(),
        ),
        Role::InstitutionalCustomer => (
            user.id.clone(),
            submission.vendedor_id.clone().ok_or(ValidationError::Required("vendedor_id"))?,
        ),
        Role::Admin => (
            submission.cliente_id.clone().ok_or(ValidationError::Required("cliente_id"))?,
            submission.vendedor_id.clone().ok_or(ValidationError::Required("vendedor_id"))?,
        ),
    };

    let bodega_origen_id = submission
        .bodega_origen_id
        .clone()
        .or_else(|| draft.first_warehouse().map(str::to_string))
        .ok_or(ValidationError::Required("bodega_origen_id"))?;

    let observaciones = submission
        .observaciones
        .clone()
        .filter(|text| !text.trim().is_empty());

    Ok(CreateOrder {
        tipo: submission.tipo,
        cliente_id,
        vendedor_id,
        bodega_origen_id,
        items: draft.to_items(),
        observaciones,
    })
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

pub struct Gateway<T, S> {
    client: GatewayClient,
    transport: T,
    credentials: CredentialStore<S>,
    user_cache: UserCache,
    config: ClientConfig,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> Gateway<UreqTransport, S> {
    /// Gateway over HTTP with the transport timeout taken from `config`.
    pub fn from_config(config: ClientConfig, store: S) -> Self {
        let transport = UreqTransport::from_config(&config);
        Self::new(config, transport, store)
    }
}

impl<T: Transport, S: KeyValueStore> Gateway<T, S> {
    pub fn new(config: ClientConfig, transport: T, store: S) -> Self {
        Self::with_clock(config, transport, store, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ClientConfig, transport: T, store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: GatewayClient::new(&config.base_url),
            transport,
            credentials: CredentialStore::new(store, clock.clone()),
            user_cache: UserCache::new(clock.clone()),
            config,
            clock,
        }
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn credentials(&self) -> &CredentialStore<S> {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut CredentialStore<S> {
        &mut self.credentials
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Explicit country, else the persisted selection, else the default.
    pub fn resolve_country(&self, explicit: Option<Country>) -> Country {
        explicit
            .or_else(|| self.credentials.selected_country())
            .unwrap_or(self.config.default_country)
    }

    pub fn select_country(&mut self, country: Country) {
        self.credentials.set_selected_country(country);
    }

    // -- auth ---------------------------------------------------------------

    /// One `POST /auth/login`. On success the session is persisted, the
    /// explicit country (if any) becomes the selection, and any cached user
    /// from a previous session is dropped.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        country: Option<Country>,
    ) -> Result<AuthSession, ApiError> {
        let resolved = self.resolve_country(country);
        let input = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let request = self.client.build_login(resolved, &input)?;
        let session = self.client.parse_login(self.send(request)?)?;

        self.credentials.save(&session);
        if let Some(country) = country {
            self.credentials.set_selected_country(country);
        }
        self.user_cache.clear();
        info!(username, country = %resolved, "logged in");
        Ok(session)
    }

    pub fn register(&self, form: &Registration, country: Option<Country>) -> Result<(), ApiError> {
        let request = self.client.build_register(self.resolve_country(country), form)?;
        self.client.parse_register(self.send(request)?)?;
        info!(username = %form.username, "registered institutional customer");
        Ok(())
    }

    /// Drop stored credentials, the selected country and the cached user.
    pub fn logout(&mut self) {
        self.credentials.clear();
        self.user_cache.clear();
        info!("logged out");
    }

    pub fn access_token(&self) -> Option<String> {
        self.credentials.access_token()
    }

    pub fn session(&self) -> Option<AuthSession> {
        self.credentials.get()
    }

    // -- users --------------------------------------------------------------

    /// Cached profile while its `exp` is in the future, otherwise one
    /// `GET /usuarios/me` that refreshes the cache.
    pub fn current_user(&mut self) -> Result<UserInfo, ApiError> {
        if let Some(user) = self.user_cache.fresh() {
            return Ok(user.clone());
        }
        let ctx = self.auth_context(None)?;
        let request = self.client.build_current_user(&ctx);
        let user = self.client.parse_current_user(self.send(request)?)?;
        debug!(user_id = %user.id, role = user.role.as_str(), "cached current user");
        self.user_cache.store(user.clone());
        Ok(user)
    }

    pub fn clear_user_cache(&mut self) {
        self.user_cache.clear();
    }

    pub fn list_users(&self, role: Role, page: Page) -> Result<Vec<UserSummary>, ApiError> {
        let ctx = self.auth_context(None)?;
        let request = self.client.build_list_users(&ctx, role, page)?;
        self.client.parse_list_users(self.send(request)?)
    }

    // -- inventory ----------------------------------------------------------

    pub fn list_products(&self, page: Page) -> Result<Vec<Product>, ApiError> {
        let ctx = self.auth_context(None)?;
        let request = self.client.build_list_products(&ctx, page)?;
        self.client.parse_list_products(self.send(request)?)
    }

    pub fn product_detail(&self, product_id: &str) -> Result<ProductDetail, ApiError> {
        let ctx = self.auth_context(None)?;
        let request = self.client.build_product_detail(&ctx, product_id);
        self.client.parse_product_detail(self.send(request)?)
    }

    pub fn product_locations(&self, product_id: &str) -> Result<Vec<ProductLocation>, ApiError> {
        let ctx = self.auth_context(None)?;
        let request = self.client.build_product_locations(&ctx, product_id);
        self.client.parse_product_locations(self.send(request)?)
    }

    /// Detail and locations together; either failure fails the whole call.
    pub fn product_overview(&self, product_id: &str) -> Result<ProductOverview, ApiError> {
        let detail = self.product_detail(product_id)?;
        let locations = self.product_locations(product_id)?;
        Ok(ProductOverview { detail, locations })
    }

    // -- orders -------------------------------------------------------------

    pub fn list_orders(&self, country: Option<Country>, filter: &OrderFilter) -> Result<Vec<Order>, ApiError> {
        let ctx = self.auth_context(country)?;
        let request = self.client.build_list_orders(&ctx, filter)?;
        self.client.parse_list_orders(self.send(request)?)
    }

    pub fn create_order(&self, order: &CreateOrder) -> Result<Order, ApiError> {
        let ctx = self.auth_context(None)?;
        let request = self.client.build_create_order(&ctx, order)?;
        self.client.parse_create_order(self.send(request)?)
    }

    /// Validate the draft, compose the order for the signed-in user, post it
    /// and clear the draft. On any error the draft is left untouched.
    pub fn submit_draft(
        &mut self,
        draft: &mut OrderDraft,
        submission: &OrderSubmission,
    ) -> Result<Order, ApiError> {
        draft.validate()?;
        let user = self.current_user()?;
        let payload = compose_order(&user, draft, submission)?;
        let order = self.create_order(&payload)?;
        draft.clear();
        info!(order_id = %order.id, lines = payload.items.len(), "order submitted");
        Ok(order)
    }

    // -- visits -------------------------------------------------------------

    pub fn list_visits(&self, filter: &VisitFilter) -> Result<Vec<Visit>, ApiError> {
        let ctx = self.auth_context(None)?;
        let request = self.client.build_list_visits(&ctx, filter)?;
        self.client.parse_list_visits(self.send(request)?)
    }

    pub fn create_visit(&self, input: &CreateVisit) -> Result<Visit, ApiError> {
        require("cliente_id", &input.cliente_id)?;
        require("nombre_contacto", &input.nombre_contacto)?;
        require("hallazgos_tecnicos", &input.hallazgos_tecnicos)?;
        let ctx = self.auth_context(None)?;
        let request = self.client.build_create_visit(&ctx, input)?;
        self.client.parse_create_visit(self.send(request)?)
    }

    // -- logistics ----------------------------------------------------------

    /// Stops of every route on `date` (today when `None`), flattened.
    pub fn deliveries(&self, date: Option<NaiveDate>) -> Result<Vec<Delivery>, ApiError> {
        let date = date.unwrap_or_else(|| self.clock.today());
        let ctx = self.auth_context(None)?;
        let request = self.client.build_routes(&ctx, date)?;
        self.client.parse_deliveries(self.send(request)?)
    }

    // -- plumbing -----------------------------------------------------------

    fn auth_context(&self, country: Option<Country>) -> Result<AuthContext, ApiError> {
        let token = self
            .credentials
            .access_token()
            .ok_or_else(|| ApiError::Precondition(NOT_AUTHENTICATED.to_string()))?;
        Ok(AuthContext::new(self.resolve_country(country), token))
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "gateway request");
        let response = self.transport.execute(request).map_err(|e| {
            warn!(error = %e, "gateway unreachable");
            ApiError::Connectivity { detail: e.0 }
        })?;
        debug!(status = response.status, "gateway response");
        Ok(response)
    }
}
