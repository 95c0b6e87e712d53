use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Order, Product, Route, TokenResponse, User, Visit};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .header("X-Country", "co");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn get_request(uri: &str, token: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header("X-Country", "co")
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(String::new())
        .unwrap()
}

async fn login(app: &Router, username: &str) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            &format!(r#"{{"username":"{username}","password":"secret"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let tokens: TokenResponse = body_json(resp).await;
    tokens.access_token
}

// --- auth ---

#[tokio::test]
async fn login_returns_bearer_tokens() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            r#"{"username":"seller1","password":"secret"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let tokens: TokenResponse = body_json(resp).await;
    assert_eq!(tokens.token_type, "Bearer");
    assert_eq!(tokens.expires_in, 3600);
    assert!(!tokens.access_token.is_empty());
}

#[tokio::test]
async fn login_wrong_password_returns_401_with_text() {
    let app = app();
    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/login",
            None,
            r#"{"username":"seller1","password":"nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(resp).await, "Invalid credentials");
}

#[tokio::test]
async fn missing_country_header_returns_400() {
    let app = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(r#"{"username":"seller1","password":"secret"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_then_login() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            r#"{"username":"hospital","password":"secret","institution_name":"Hospital Sur",
                "address":"Cra 7","city":"Cali","role":"institutional_customer"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let token = login(&app, "hospital").await;
    let resp = app.oneshot(get_request("/usuarios/me", &token)).await.unwrap();
    let me: serde_json::Value = body_json(resp).await;
    assert_eq!(me["role"], "institutional_customer");
    assert_eq!(me["institution_name"], "Hospital Sur");
}

#[tokio::test]
async fn register_rejects_other_roles_and_duplicates() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            r#"{"username":"x","password":"y","institution_name":"i","address":"a","city":"c","role":"seller"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/auth/register",
            None,
            r#"{"username":"seller1","password":"y","institution_name":"i","address":"a","city":"c","role":"institutional_customer"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

// --- users ---

#[tokio::test]
async fn me_requires_token() {
    let app = app();
    let resp = app.oneshot(get_request("/usuarios/me", "bogus")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_includes_expiry() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app.oneshot(get_request("/usuarios/me", &token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me: serde_json::Value = body_json(resp).await;
    assert_eq!(me["id"], "u-seller-1");
    assert_eq!(me["role"], "seller");
    assert!(me["exp"].as_i64().unwrap() > 0);
    assert!(me.get("password").is_none());
}

#[tokio::test]
async fn users_filter_by_role() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .oneshot(get_request("/usuarios?role=institutional_customer&limit=10&offset=0", &token))
        .await
        .unwrap();
    let users: Vec<User> = body_json(resp).await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "clinica");
}

// --- inventory ---

#[tokio::test]
async fn products_are_paginated_with_string_prices() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .oneshot(get_request("/inventario/productos/todos?limit=2&offset=1", &token))
        .await
        .unwrap();
    let products: Vec<Product> = body_json(resp).await;
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].id, "p-2");
    assert_eq!(products[0].precio_unitario, "0.80");
}

#[tokio::test]
async fn product_detail_aggregates_stock() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .oneshot(get_request("/inventario/producto/p-1/detalle", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let detail: serde_json::Value = body_json(resp).await;
    assert_eq!(detail["stock_total"], "55");
}

#[tokio::test]
async fn unknown_product_returns_404() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .oneshot(get_request("/inventario/producto/nope/ubicaciones", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- orders ---

#[tokio::test]
async fn create_then_list_orders() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/pedidos",
            Some(&token),
            r#"{"tipo":"VENTA","cliente_id":"u-clinic-1","vendedor_id":"u-seller-1",
                "bodega_origen_id":"b-1","items":[{"producto_id":"p-1","cantidad":2}]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Order = body_json(resp).await;
    assert_eq!(order.subtotal, "25.00");
    assert_eq!(order.impuestos, "4.75");
    assert_eq!(order.total, "29.75");

    let resp = app
        .clone()
        .oneshot(get_request("/pedidos?tipo=VENTA", &token))
        .await
        .unwrap();
    let orders: Vec<Order> = body_json(resp).await;
    assert_eq!(orders.len(), 1);

    let resp = app
        .oneshot(get_request("/pedidos?tipo=COMPRA", &token))
        .await
        .unwrap();
    let orders: Vec<Order> = body_json(resp).await;
    assert!(orders.is_empty());
}

#[tokio::test]
async fn empty_order_returns_422() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/pedidos",
            Some(&token),
            r#"{"tipo":"VENTA","cliente_id":"c","vendedor_id":"s","bodega_origen_id":"b","items":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- visits ---

#[tokio::test]
async fn visits_filter_by_exact_date() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .clone()
        .oneshot(get_request("/visitas?id_vendedor=u-seller-1&d=2026-10-19", &token))
        .await
        .unwrap();
    let visits: Vec<Visit> = body_json(resp).await;
    assert_eq!(visits.len(), 1);

    let resp = app
        .oneshot(get_request("/visitas?d=2026-10", &token))
        .await
        .unwrap();
    let visits: Vec<Visit> = body_json(resp).await;
    assert!(visits.is_empty());
}

#[tokio::test]
async fn create_visit_uses_caller_as_seller() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/visitas",
            Some(&token),
            r#"{"cliente_id":"u-clinic-1","nombre_contacto":"Dra. Ruiz",
                "hallazgos_tecnicos":"Autoclave averiado","sugerencias_producto":"GLV-01"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let visit: Visit = body_json(resp).await;
    assert_eq!(visit.id_vendedor, "u-seller-1");
    assert_eq!(visit.ciudad, "Bogota");
    assert_eq!(visit.estado, "pendiente");
}

// --- logistics ---

#[tokio::test]
async fn routes_require_date() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .oneshot(get_request("/logistica/rutas", &token))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn routes_for_date_include_stops() {
    let app = app();
    let token = login(&app, "seller1").await;
    let resp = app
        .oneshot(get_request("/logistica/rutas?fecha=2026-10-19", &token))
        .await
        .unwrap();
    let routes: Vec<Route> = body_json(resp).await;
    assert_eq!(routes.len(), 2);
    let stops: usize = routes.iter().map(|r| r.paradas.len()).sum();
    assert_eq!(stops, 3);
}
