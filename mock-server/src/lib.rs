//! In-memory stand-in for the ordering gateway.
//!
//! Serves the same routes as the real gateway with seeded data. Every route
//! requires a known `X-Country` header; everything except login and
//! registration requires a bearer token issued by `/auth/login`. Prices,
//! percentages, totals and stock are emitted as strings, the way the real
//! gateway does.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const COUNTRIES: [&str; 4] = ["mx", "co", "pe", "ar"];
pub const TOKEN_TTL_SECS: i64 = 3600;
pub const SEED_ROUTE_DATE: &str = "2026-10-19";

type ApiError = (StatusCode, String);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: String,
    pub institution_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
    pub institution_name: String,
    pub address: String,
    pub city: String,
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub nombre: String,
    pub sku: String,
    pub precio_unitario: String,
    pub porcentaje_iva: String,
    pub categoria: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Location {
    pub bodega_id: String,
    pub bodega_nombre: String,
    pub ciudad: String,
    pub cantidad: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderItem {
    pub producto_id: String,
    pub nombre: String,
    pub cantidad: i64,
    pub precio_unitario: String,
    pub subtotal: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub numero_pedido: String,
    pub tipo: String,
    pub estado: String,
    pub cliente_id: String,
    pub vendedor_id: String,
    pub bodega_origen_id: String,
    pub subtotal: String,
    pub impuestos: String,
    pub total: String,
    pub observaciones: Option<String>,
    pub fecha_creacion: String,
    pub items: Vec<OrderItem>,
}

#[derive(Deserialize)]
pub struct CreateOrderItem {
    pub producto_id: String,
    pub cantidad: i64,
}

#[derive(Deserialize)]
pub struct CreateOrder {
    pub tipo: String,
    pub cliente_id: String,
    pub vendedor_id: String,
    pub bodega_origen_id: String,
    pub items: Vec<CreateOrderItem>,
    pub observaciones: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub id_vendedor: String,
    pub id_cliente: String,
    pub direccion: String,
    pub ciudad: String,
    pub contacto: String,
    pub fecha: String,
    pub estado: String,
    pub hallazgos_tecnicos: Option<String>,
    pub sugerencias_producto: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateVisit {
    pub cliente_id: String,
    pub nombre_contacto: String,
    pub hallazgos_tecnicos: String,
    pub sugerencias_producto: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub pedido_id: String,
    pub cliente_id: String,
    pub cliente_nombre: String,
    pub direccion: String,
    pub orden: i64,
    pub estado: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub fecha: String,
    pub estado: String,
    pub conductor: String,
    pub paradas: Vec<Stop>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct OrdersQuery {
    pub tipo: Option<String>,
    pub estado: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct VisitsQuery {
    pub id_vendedor: Option<String>,
    pub d: Option<String>,
    pub estado: Option<String>,
}

#[derive(Deserialize)]
pub struct RoutesQuery {
    pub fecha: Option<String>,
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub struct Session {
    pub user_id: String,
    pub exp: i64,
}

#[derive(Default)]
pub struct Store {
    pub users: Vec<User>,
    pub sessions: HashMap<String, Session>,
    pub products: Vec<Product>,
    pub locations: HashMap<String, Vec<Location>>,
    pub orders: Vec<Order>,
    pub visits: Vec<Visit>,
    pub routes: Vec<Route>,
}

pub type Db = Arc<RwLock<Store>>;

fn user(id: &str, username: &str, role: &str, institution: Option<&str>, city: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        password: "secret".to_string(),
        role: role.to_string(),
        institution_name: institution.map(str::to_string),
        address: Some(format!("Calle {id}")),
        city: Some(city.to_string()),
    }
}

fn product(id: &str, nombre: &str, sku: &str, precio: &str, iva: &str) -> Product {
    Product {
        id: id.to_string(),
        nombre: nombre.to_string(),
        sku: sku.to_string(),
        precio_unitario: precio.to_string(),
        porcentaje_iva: iva.to_string(),
        categoria: "insumos".to_string(),
    }
}

fn location(bodega_id: &str, nombre: &str, ciudad: &str, cantidad: i64) -> Location {
    Location {
        bodega_id: bodega_id.to_string(),
        bodega_nombre: nombre.to_string(),
        ciudad: ciudad.to_string(),
        cantidad: cantidad.to_string(),
    }
}

fn stop(id: &str, orden: i64, cliente: &str) -> Stop {
    Stop {
        id: id.to_string(),
        pedido_id: format!("o-{id}"),
        cliente_id: "u-clinic-1".to_string(),
        cliente_nombre: cliente.to_string(),
        direccion: format!("Av. Principal {orden}"),
        orden,
        estado: "PENDIENTE".to_string(),
    }
}

/// Seed data shared by the binary and the tests. Every seeded user's
/// password is `secret`.
pub fn seed() -> Store {
    let mut locations = HashMap::new();
    locations.insert(
        "p-1".to_string(),
        vec![
            location("b-1", "Bodega Central", "Bogota", 40),
            location("b-2", "Bodega Norte", "Medellin", 15),
        ],
    );
    locations.insert("p-2".to_string(), vec![location("b-1", "Bodega Central", "Bogota", 8)]);

    Store {
        users: vec![
            user("u-seller-1", "seller1", "seller", None, "Bogota"),
            user("u-clinic-1", "clinica", "institutional_customer", Some("Clinica Norte"), "Bogota"),
            user("u-admin-1", "admin", "admin", None, "Bogota"),
        ],
        sessions: HashMap::new(),
        products: vec![
            product("p-1", "Guantes de nitrilo", "GLV-01", "12.50", "19"),
            product("p-2", "Jeringa 5ml", "SYR-05", "0.80", "19"),
            product("p-3", "Gasas esteriles", "GAS-10", "3.10", "0"),
        ],
        locations,
        orders: Vec::new(),
        visits: vec![Visit {
            id: "v-1".to_string(),
            id_vendedor: "u-seller-1".to_string(),
            id_cliente: "u-clinic-1".to_string(),
            direccion: "Calle u-clinic-1".to_string(),
            ciudad: "Bogota".to_string(),
            contacto: "Dra. Ruiz".to_string(),
            fecha: SEED_ROUTE_DATE.to_string(),
            estado: "pendiente".to_string(),
            hallazgos_tecnicos: None,
            sugerencias_producto: None,
        }],
        routes: vec![
            Route {
                id: "r-1".to_string(),
                fecha: SEED_ROUTE_DATE.to_string(),
                estado: "EN_CURSO".to_string(),
                conductor: "Luis".to_string(),
                paradas: vec![stop("s-1", 1, "Clinica Norte"), stop("s-2", 2, "Hospital Sur")],
            },
            Route {
                id: "r-2".to_string(),
                fecha: SEED_ROUTE_DATE.to_string(),
                estado: "PLANIFICADA".to_string(),
                conductor: "Marta".to_string(),
                paradas: vec![stop("s-3", 1, "Clinica Norte")],
            },
            Route {
                id: "r-3".to_string(),
                fecha: "2026-10-20".to_string(),
                estado: "PLANIFICADA".to_string(),
                conductor: "Luis".to_string(),
                paradas: vec![stop("s-4", 1, "Hospital Sur")],
            },
        ],
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/usuarios/me", get(me))
        .route("/usuarios", get(list_users))
        .route("/inventario/productos/todos", get(list_products))
        .route("/inventario/producto/{id}/detalle", get(product_detail))
        .route("/inventario/producto/{id}/ubicaciones", get(product_locations))
        .route("/pedidos", get(list_orders).post(create_order))
        .route("/visitas", get(list_visits).post(create_visit))
        .route("/logistica/rutas", get(list_routes))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

fn require_country(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-country")
        .and_then(|v| v.to_str().ok())
        .map(str::to_ascii_lowercase)
        .filter(|c| COUNTRIES.contains(&c.as_str()))
        .ok_or((
            StatusCode::BAD_REQUEST,
            "missing or unknown X-Country header".to_string(),
        ))
}

fn require_user(store: &Store, headers: &HeaderMap) -> Result<(User, i64), ApiError> {
    let unauthorized = || (StatusCode::UNAUTHORIZED, "Not authenticated".to_string());
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    let session = store.sessions.get(token).ok_or_else(unauthorized)?;
    if session.exp <= now_secs() {
        return Err(unauthorized());
    }
    let user = store
        .users
        .iter()
        .find(|u| u.id == session.user_id)
        .cloned()
        .ok_or_else(unauthorized)?;
    Ok((user, session.exp))
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}

fn paginate<T: Clone>(items: impl Iterator<Item = T>, limit: Option<usize>, offset: Option<usize>) -> Vec<T> {
    items
        .skip(offset.unwrap_or(0))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn login(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError> {
    let country = require_country(&headers)?;
    let mut store = db.write().await;
    let user_id = store
        .users
        .iter()
        .find(|u| u.username == body.username && u.password == body.password)
        .map(|u| u.id.clone())
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()))?;

    let access_token = Uuid::new_v4().to_string();
    store.sessions.insert(
        access_token.clone(),
        Session {
            user_id,
            exp: now_secs() + TOKEN_TTL_SECS,
        },
    );
    info!(username = %body.username, %country, "login");
    Ok(Json(TokenResponse {
        access_token,
        refresh_token: Uuid::new_v4().to_string(),
        token_type: "Bearer".to_string(),
        expires_in: TOKEN_TTL_SECS,
    }))
}

async fn register(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    require_country(&headers)?;
    if body.role != "institutional_customer" {
        return Err((
            StatusCode::BAD_REQUEST,
            "only institutional customers can self-register".to_string(),
        ));
    }
    let mut store = db.write().await;
    if store.users.iter().any(|u| u.username == body.username) {
        return Err((StatusCode::CONFLICT, "username already exists".to_string()));
    }
    let user = User {
        id: format!("u-{}", Uuid::new_v4()),
        username: body.username,
        password: body.password,
        role: body.role,
        institution_name: Some(body.institution_name),
        address: Some(body.address),
        city: Some(body.city),
    };
    store.users.push(user.clone());
    Ok((StatusCode::CREATED, Json(user)))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    require_country(&headers)?;
    let store = db.read().await;
    let (user, exp) = require_user(&store, &headers)?;
    let mut value = serde_json::to_value(&user).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    value["exp"] = serde_json::json!(exp);
    Ok(Json(value))
}

async fn list_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<UsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_country(&headers)?;
    let store = db.read().await;
    require_user(&store, &headers)?;
    let matching = store
        .users
        .iter()
        .filter(|u| q.role.as_deref().is_none_or(|r| u.role == r))
        .cloned();
    Ok(Json(paginate(matching, q.limit, q.offset)))
}

async fn list_products(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    require_country(&headers)?;
    let store = db.read().await;
    require_user(&store, &headers)?;
    Ok(Json(paginate(store.products.iter().cloned(), q.limit, q.offset)))
}

async fn product_detail(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_country(&headers)?;
    let store = db.read().await;
    require_user(&store, &headers)?;
    let product = store
        .products
        .iter()
        .find(|p| p.id == id)
        .ok_or((StatusCode::NOT_FOUND, format!("product {id} not found")))?;
    let stock: i64 = store
        .locations
        .get(&id)
        .map(|locs| locs.iter().filter_map(|l| l.cantidad.parse::<i64>().ok()).sum())
        .unwrap_or(0);
    Ok(Json(serde_json::json!({
        "id": product.id,
        "nombre": product.nombre,
        "sku": product.sku,
        "descripcion": format!("{} - uso hospitalario", product.nombre),
        "precio_unitario": product.precio_unitario,
        "porcentaje_iva": product.porcentaje_iva,
        "stock_total": stock.to_string(),
        "categoria": product.categoria,
    })))
}

async fn product_locations(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Vec<Location>>, ApiError> {
    require_country(&headers)?;
    let store = db.read().await;
    require_user(&store, &headers)?;
    if !store.products.iter().any(|p| p.id == id) {
        return Err((StatusCode::NOT_FOUND, format!("product {id} not found")));
    }
    Ok(Json(store.locations.get(&id).cloned().unwrap_or_default()))
}

async fn create_order(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    require_country(&headers)?;
    let mut store = db.write().await;
    require_user(&store, &headers)?;
    if body.items.is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "order has no items".to_string()));
    }

    let mut items = Vec::with_capacity(body.items.len());
    let (mut subtotal, mut taxes) = (0.0_f64, 0.0_f64);
    for item in &body.items {
        let product = store
            .products
            .iter()
            .find(|p| p.id == item.producto_id)
            .ok_or((
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("unknown product {}", item.producto_id),
            ))?;
        let price: f64 = product.precio_unitario.parse().unwrap_or(0.0);
        let iva: f64 = product.porcentaje_iva.parse().unwrap_or(0.0);
        let line = price * item.cantidad as f64;
        subtotal += line;
        taxes += line * iva / 100.0;
        items.push(OrderItem {
            producto_id: product.id.clone(),
            nombre: product.nombre.clone(),
            cantidad: item.cantidad,
            precio_unitario: product.precio_unitario.clone(),
            subtotal: money(line),
        });
    }

    let order = Order {
        id: format!("o-{}", Uuid::new_v4()),
        numero_pedido: format!("PED-{:04}", store.orders.len() + 1),
        tipo: body.tipo,
        estado: "PENDIENTE".to_string(),
        cliente_id: body.cliente_id,
        vendedor_id: body.vendedor_id,
        bodega_origen_id: body.bodega_origen_id,
        subtotal: money(subtotal),
        impuestos: money(taxes),
        total: money(subtotal + taxes),
        observaciones: body.observaciones,
        fecha_creacion: chrono::Utc::now().to_rfc3339(),
        items,
    };
    store.orders.push(order.clone());
    info!(order_id = %order.id, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>, ApiError> {
    require_country(&headers)?;
    let store = db.read().await;
    require_user(&store, &headers)?;
    let matching = store
        .orders
        .iter()
        .filter(|o| q.tipo.as_deref().is_none_or(|t| o.tipo == t))
        .filter(|o| q.estado.as_deref().is_none_or(|e| o.estado == e))
        .cloned();
    Ok(Json(paginate(matching, q.limit, q.offset)))
}

async fn list_visits(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<VisitsQuery>,
) -> Result<Json<Vec<Visit>>, ApiError> {
    require_country(&headers)?;
    let store = db.read().await;
    require_user(&store, &headers)?;
    let matching = store
        .visits
        .iter()
        .filter(|v| q.id_vendedor.as_deref().is_none_or(|id| v.id_vendedor == id))
        .filter(|v| q.d.as_deref().is_none_or(|d| v.fecha == d))
        .filter(|v| q.estado.as_deref().is_none_or(|e| v.estado == e))
        .cloned()
        .collect();
    Ok(Json(matching))
}

async fn create_visit(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<CreateVisit>,
) -> Result<(StatusCode, Json<Visit>), ApiError> {
    require_country(&headers)?;
    let mut store = db.write().await;
    let (seller, _) = require_user(&store, &headers)?;
    let client = store
        .users
        .iter()
        .find(|u| u.id == body.cliente_id)
        .cloned()
        .ok_or((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("unknown client {}", body.cliente_id),
        ))?;
    let visit = Visit {
        id: format!("v-{}", store.visits.len() + 1),
        id_vendedor: seller.id,
        id_cliente: client.id,
        direccion: client.address.unwrap_or_default(),
        ciudad: client.city.unwrap_or_default(),
        contacto: body.nombre_contacto,
        fecha: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
        estado: "pendiente".to_string(),
        hallazgos_tecnicos: Some(body.hallazgos_tecnicos),
        sugerencias_producto: Some(body.sugerencias_producto),
    };
    store.visits.push(visit.clone());
    Ok((StatusCode::CREATED, Json(visit)))
}

async fn list_routes(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(q): Query<RoutesQuery>,
) -> Result<Json<Vec<Route>>, ApiError> {
    require_country(&headers)?;
    let fecha = q
        .fecha
        .ok_or((StatusCode::BAD_REQUEST, "fecha is required".to_string()))?;
    let store = db.read().await;
    require_user(&store, &headers)?;
    let matching = store.routes.iter().filter(|r| r.fecha == fecha).cloned().collect();
    Ok(Json(matching))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_user_password_is_not_serialized() {
        let store = seed();
        let json = serde_json::to_value(&store.users[0]).unwrap();
        assert_eq!(json["username"], "seller1");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn seeded_routes_cover_two_dates() {
        let store = seed();
        let on_seed_date: usize = store
            .routes
            .iter()
            .filter(|r| r.fecha == SEED_ROUTE_DATE)
            .map(|r| r.paradas.len())
            .sum();
        assert_eq!(on_seed_date, 3);
    }

    #[test]
    fn paginate_applies_offset_then_limit() {
        let page = paginate(1..=10, Some(3), Some(4));
        assert_eq!(page, vec![5, 6, 7]);
        assert_eq!(paginate(1..=3, None, None), vec![1, 2, 3]);
    }

    #[test]
    fn money_has_two_decimals() {
        assert_eq!(money(25.0), "25.00");
        assert_eq!(money(4.75), "4.75");
    }

    #[test]
    fn country_guard_accepts_known_codes_only() {
        let mut headers = HeaderMap::new();
        assert!(require_country(&headers).is_err());
        headers.insert("x-country", "CO".parse().unwrap());
        assert_eq!(require_country(&headers).unwrap(), "co");
        headers.insert("x-country", "br".parse().unwrap());
        assert_eq!(require_country(&headers).unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
