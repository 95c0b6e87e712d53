//! Domain DTOs for the ordering gateway.
//!
//! # Design
//! Gateway DTOs keep the gateway's own (Spanish) field names so the serde
//! derives need no renames; auth and user payloads are English on the wire
//! and stay English here. Prices, percentages, totals and stock may arrive as
//! JSON strings and are normalised to numbers on the way in (see `number`).
//! The mock-server crate defines its own copies of these shapes; the
//! integration tests catch drift between the two.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::number::{
    f64_lenient, i64_lenient, id_lenient, opt_f64_lenient, opt_i64_lenient, opt_id_lenient, u64_lenient,
};

// ---------------------------------------------------------------------------
// Auth & users
// ---------------------------------------------------------------------------

/// Tokens returned by `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until `access_token` expires.
    #[serde(deserialize_with = "u64_lenient")]
    pub expires_in: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Self-service sign-up form. Only institutional customers can register;
/// the role is added when the request is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub institution_name: String,
    pub address: String,
    pub city: String,
}

impl Registration {
    /// Every field must be non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("username", &self.username),
            ("password", &self.password),
            ("institution_name", &self.institution_name),
            ("address", &self.address),
            ("city", &self.city),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ValidationError::Required(name)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    InstitutionalCustomer,
    Admin,
    Seller,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::InstitutionalCustomer => "institutional_customer",
            Role::Admin => "admin",
            Role::Seller => "seller",
        }
    }
}

/// Payload of `GET /usuarios/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(deserialize_with = "id_lenient")]
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Token expiry as unix seconds.
    #[serde(deserialize_with = "i64_lenient")]
    pub exp: i64,
}

/// One row of `GET /usuarios`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(deserialize_with = "id_lenient")]
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub institution_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

/// `limit`/`offset` pagination shared by every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Page {
    pub fn next(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(deserialize_with = "id_lenient")]
    pub id: String,
    pub nombre: String,
    pub sku: String,
    #[serde(deserialize_with = "f64_lenient")]
    pub precio_unitario: f64,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub porcentaje_iva: Option<f64>,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub unidad_medida: Option<String>,
}

/// `GET /inventario/producto/{id}/detalle`, with stock aggregated across
/// warehouses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(deserialize_with = "id_lenient")]
    pub id: String,
    pub nombre: String,
    pub sku: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(deserialize_with = "f64_lenient")]
    pub precio_unitario: f64,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub porcentaje_iva: Option<f64>,
    #[serde(deserialize_with = "i64_lenient")]
    pub stock_total: i64,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub proveedor: Option<String>,
}

/// Stock of one product in one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLocation {
    #[serde(deserialize_with = "id_lenient")]
    pub bodega_id: String,
    pub bodega_nombre: String,
    #[serde(default)]
    pub ciudad: Option<String>,
    #[serde(deserialize_with = "i64_lenient")]
    pub cantidad: i64,
    #[serde(default)]
    pub lote: Option<String>,
    #[serde(default)]
    pub fecha_vencimiento: Option<String>,
}

/// Detail and per-warehouse stock fetched together for a detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductOverview {
    pub detail: ProductDetail,
    pub locations: Vec<ProductLocation>,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderKind {
    Venta,
    Compra,
}

/// Line of an order as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(deserialize_with = "id_lenient")]
    pub producto_id: String,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(deserialize_with = "i64_lenient")]
    pub cantidad: i64,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub precio_unitario: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub subtotal: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(deserialize_with = "id_lenient")]
    pub id: String,
    #[serde(default)]
    pub numero_pedido: Option<String>,
    pub tipo: String,
    pub estado: String,
    #[serde(default, deserialize_with = "opt_id_lenient")]
    pub cliente_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_lenient")]
    pub vendedor_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_lenient")]
    pub bodega_origen_id: Option<String>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub subtotal: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub impuestos: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64_lenient")]
    pub total: Option<f64>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub fecha_creacion: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Query for `GET /pedidos`. Unset fields are left out of the query string.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo: Option<OrderKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderItem {
    pub producto_id: String,
    pub cantidad: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bodega_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precio_unitario: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub porcentaje_iva: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

/// Body of `POST /pedidos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub tipo: OrderKind,
    pub cliente_id: String,
    pub vendedor_id: String,
    pub bodega_origen_id: String,
    pub items: Vec<CreateOrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observaciones: Option<String>,
}

// ---------------------------------------------------------------------------
// Visits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Pendiente,
    #[serde(alias = "finalizada")]
    Completada,
    Cancelada,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    #[serde(deserialize_with = "id_lenient")]
    pub id: String,
    #[serde(deserialize_with = "id_lenient")]
    pub id_vendedor: String,
    #[serde(deserialize_with = "id_lenient")]
    pub id_cliente: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub ciudad: String,
    #[serde(default)]
    pub contacto: String,
    pub fecha: String,
    pub estado: VisitStatus,
    #[serde(default)]
    pub hallazgos_tecnicos: Option<String>,
    #[serde(default)]
    pub sugerencias_producto: Option<String>,
}

/// Query for `GET /visitas`. `fecha` is sent verbatim as `d`; the gateway
/// matches it exactly.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisitFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_vendedor: Option<String>,
    #[serde(rename = "d", skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<VisitStatus>,
}

/// Body of `POST /visitas`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateVisit {
    pub cliente_id: String,
    pub nombre_contacto: String,
    pub hallazgos_tecnicos: String,
    pub sugerencias_producto: String,
}

// ---------------------------------------------------------------------------
// Logistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    #[serde(deserialize_with = "id_lenient")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_lenient")]
    pub pedido_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_lenient")]
    pub cliente_id: Option<String>,
    #[serde(default)]
    pub cliente_nombre: Option<String>,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub ciudad: Option<String>,
    #[serde(default, deserialize_with = "opt_i64_lenient")]
    pub orden: Option<i64>,
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub hora_estimada: Option<String>,
}

/// A delivery run and its ordered stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(deserialize_with = "id_lenient")]
    pub id: String,
    pub fecha: String,
    pub estado: String,
    #[serde(default)]
    pub conductor: Option<String>,
    #[serde(default)]
    pub vehiculo: Option<String>,
    #[serde(default)]
    pub paradas: Vec<RouteStop>,
}

/// A stop flattened out of its route, tagged with the parent route's
/// metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub ruta_id: String,
    pub fecha_ruta: String,
    pub estado_ruta: String,
    #[serde(flatten)]
    pub parada: RouteStop,
}
