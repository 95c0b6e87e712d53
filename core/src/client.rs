//! Stateless HTTP request builder and response parser for the ordering
//! gateway.
//!
//! # Design
//! `GatewayClient` holds only a `base_url`. Every endpoint is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. Whoever sits between the two performs
//! the round-trip: `Gateway` through a `Transport`, or a mobile host through
//! the C ABI.
//!
//! Every request carries `X-Country`; everything except login and
//! registration also carries `Authorization: Bearer <token>`. Any 2xx
//! status is accepted. Failures keep the raw status and body behind an
//! action-specific context string.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::country::{Country, COUNTRY_HEADER};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AuthSession, CreateOrder, CreateVisit, Delivery, LoginRequest, Order, OrderFilter, Page,
    Product, ProductDetail, ProductLocation, Registration, Role, Route, UserInfo, UserSummary,
    Visit, VisitFilter,
};

pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTER_FAILED: &str = "Registration failed";
pub const FETCH_USER_FAILED: &str = "Failed to fetch user info";
pub const FETCH_USERS_FAILED: &str = "Failed to fetch users";
pub const FETCH_PRODUCTS_FAILED: &str = "Failed to fetch products";
pub const FETCH_PRODUCT_DETAIL_FAILED: &str = "Failed to fetch product detail";
pub const FETCH_LOCATIONS_FAILED: &str = "Failed to fetch product locations";
pub const CREATE_ORDER_FAILED: &str = "Failed to create order";
pub const FETCH_ORDERS_FAILED: &str = "Failed to fetch orders";
pub const FETCH_VISITS_FAILED: &str = "Failed to fetch visits";
pub const CREATE_VISIT_FAILED: &str = "Failed to create visit";
pub const FETCH_DELIVERIES_FAILED: &str = "Failed to fetch deliveries";

/// Country and bearer token for an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub country: Country,
    pub token: String,
}

impl AuthContext {
    pub fn new(country: Country, token: impl Into<String>) -> Self {
        Self {
            country,
            token: token.into(),
        }
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    #[serde(flatten)]
    form: &'a Registration,
    role: Role,
}

#[derive(Serialize)]
struct UserQuery {
    role: Role,
    limit: u32,
    offset: u32,
}

#[derive(Serialize)]
struct RouteQuery {
    fecha: String,
}

/// Synchronous, stateless client for the ordering gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- auth ---------------------------------------------------------------

    pub fn build_login(&self, country: Country, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        self.post("/auth/login", country, None, input)
    }

    /// The role is always `institutional_customer`; other roles are
    /// provisioned by the back office.
    /// Fails with `Validation` before building anything if a field is blank.
    pub fn build_register(&self, country: Country, input: &Registration) -> Result<HttpRequest, ApiError> {
        input.validate()?;
        let body = RegisterBody {
            form: input,
            role: Role::InstitutionalCustomer,
        };
        self.post("/auth/register", country, None, &body)
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<AuthSession, ApiError> {
        parse_json(response, LOGIN_FAILED)
    }

    /// Any 2xx counts; the body is not inspected.
    pub fn parse_register(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, REGISTER_FAILED)
    }

    // -- users --------------------------------------------------------------

    pub fn build_current_user(&self, ctx: &AuthContext) -> HttpRequest {
        self.get("/usuarios/me", ctx)
    }

    pub fn parse_current_user(&self, response: HttpResponse) -> Result<UserInfo, ApiError> {
        parse_json(response, FETCH_USER_FAILED)
    }

    pub fn build_list_users(&self, ctx: &AuthContext, role: Role, page: Page) -> Result<HttpRequest, ApiError> {
        let query = UserQuery {
            role,
            limit: page.limit,
            offset: page.offset,
        };
        Ok(self.get(&with_query("/usuarios", &query)?, ctx))
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<Vec<UserSummary>, ApiError> {
        parse_json(response, FETCH_USERS_FAILED)
    }

    // -- inventory ----------------------------------------------------------

    pub fn build_list_products(&self, ctx: &AuthContext, page: Page) -> Result<HttpRequest, ApiError> {
        Ok(self.get(&with_query("/inventario/productos/todos", &page)?, ctx))
    }

    pub fn parse_list_products(&self, response: HttpResponse) -> Result<Vec<Product>, ApiError> {
        parse_json(response, FETCH_PRODUCTS_FAILED)
    }

    pub fn build_product_detail(&self, ctx: &AuthContext, product_id: &str) -> HttpRequest {
        self.get(&format!("/inventario/producto/{product_id}/detalle"), ctx)
    }

    pub fn parse_product_detail(&self, response: HttpResponse) -> Result<ProductDetail, ApiError> {
        parse_json(response, FETCH_PRODUCT_DETAIL_FAILED)
    }

    pub fn build_product_locations(&self, ctx: &AuthContext, product_id: &str) -> HttpRequest {
        self.get(&format!("/inventario/producto/{product_id}/ubicaciones"), ctx)
    }

    pub fn parse_product_locations(&self, response: HttpResponse) -> Result<Vec<ProductLocation>, ApiError> {
        parse_json(response, FETCH_LOCATIONS_FAILED)
    }

    // -- orders -------------------------------------------------------------

    pub fn build_create_order(&self, ctx: &AuthContext, input: &CreateOrder) -> Result<HttpRequest, ApiError> {
        self.post("/pedidos", ctx.country, Some(ctx.token.as_str()), input)
    }

    pub fn parse_create_order(&self, response: HttpResponse) -> Result<Order, ApiError> {
        parse_json(response, CREATE_ORDER_FAILED)
    }

    pub fn build_list_orders(&self, ctx: &AuthContext, filter: &OrderFilter) -> Result<HttpRequest, ApiError> {
        Ok(self.get(&with_query("/pedidos", filter)?, ctx))
    }

    pub fn parse_list_orders(&self, response: HttpResponse) -> Result<Vec<Order>, ApiError> {
        parse_json(response, FETCH_ORDERS_FAILED)
    }

    // -- visits -------------------------------------------------------------

    pub fn build_list_visits(&self, ctx: &AuthContext, filter: &VisitFilter) -> Result<HttpRequest, ApiError> {
        Ok(self.get(&with_query("/visitas", filter)?, ctx))
    }

    pub fn parse_list_visits(&self, response: HttpResponse) -> Result<Vec<Visit>, ApiError> {
        parse_json(response, FETCH_VISITS_FAILED)
    }

    pub fn build_create_visit(&self, ctx: &AuthContext, input: &CreateVisit) -> Result<HttpRequest, ApiError> {
        self.post("/visitas", ctx.country, Some(ctx.token.as_str()), input)
    }

    pub fn parse_create_visit(&self, response: HttpResponse) -> Result<Visit, ApiError> {
        parse_json(response, CREATE_VISIT_FAILED)
    }

    // -- logistics ----------------------------------------------------------

    pub fn build_routes(&self, ctx: &AuthContext, date: NaiveDate) -> Result<HttpRequest, ApiError> {
        let query = RouteQuery {
            fecha: date.format("%Y-%m-%d").to_string(),
        };
        Ok(self.get(&with_query("/logistica/rutas", &query)?, ctx))
    }

    pub fn parse_routes(&self, response: HttpResponse) -> Result<Vec<Route>, ApiError> {
        parse_json(response, FETCH_DELIVERIES_FAILED)
    }

    /// `parse_routes` followed by `flatten_routes`.
    pub fn parse_deliveries(&self, response: HttpResponse) -> Result<Vec<Delivery>, ApiError> {
        self.parse_routes(response).map(flatten_routes)
    }

    // -- helpers ------------------------------------------------------------

    fn get(&self, path_and_query: &str, ctx: &AuthContext) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{path_and_query}", self.base_url),
            headers: base_headers(ctx.country, Some(ctx.token.as_str())),
            body: None,
        }
    }

    fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        country: Country,
        token: Option<&str>,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        headers.extend(base_headers(country, token));
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{path}", self.base_url),
            headers,
            body: Some(body),
        })
    }
}

/// Turn nested routes into one list of stops, each tagged with its route's
/// id, date and status. Route order, then stop order, is preserved.
pub fn flatten_routes(routes: Vec<Route>) -> Vec<Delivery> {
    routes
        .into_iter()
        .flat_map(|route| {
            let Route {
                id,
                fecha,
                estado,
                paradas,
                ..
            } = route;
            paradas.into_iter().map(move |parada| Delivery {
                ruta_id: id.clone(),
                fecha_ruta: fecha.clone(),
                estado_ruta: estado.clone(),
                parada,
            })
        })
        .collect()
}

fn base_headers(country: Country, token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![(COUNTRY_HEADER.to_string(), country.code().to_string())];
    if let Some(token) = token {
        headers.push(("Authorization".to_string(), format!("Bearer {token}")));
    }
    headers
}

fn with_query<Q: Serialize>(path: &str, query: &Q) -> Result<String, ApiError> {
    let encoded = serde_urlencoded::to_string(query).map_err(|e| ApiError::Serialization(e.to_string()))?;
    if encoded.is_empty() {
        Ok(path.to_string())
    } else {
        Ok(format!("{path}?{encoded}"))
    }
}

/// Map non-2xx statuses to `ApiError::Http` under `context`.
fn check_status(response: &HttpResponse, context: &str) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        context: context.to_string(),
        status: response.status,
        body: response.body.clone(),
    })
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse, context: &str) -> Result<T, ApiError> {
    check_status(&response, context)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
