//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or error messages. Bodies are compared as
//! parsed JSON so field ordering does not matter.

use chrono::NaiveDate;
use medsupply_core::types::LoginRequest;
use medsupply_core::{
    AuthContext, AuthSession, Country, CreateOrder, Delivery, GatewayClient, HttpMethod, HttpRequest,
    HttpResponse, Order, OrderFilter, OrderKind,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> GatewayClient {
    GatewayClient::new(BASE_URL)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn country(case: &Value) -> Country {
    case["country"].as_str().unwrap().parse().unwrap()
}

fn auth(case: &Value) -> AuthContext {
    AuthContext::new(country(case), case["token"].as_str().unwrap())
}

fn response(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

/// Method, full path, headers and (when present) body.
fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(body) => {
            let actual: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    let raw = include_str!("../../test-vectors/login.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = LoginRequest {
            username: case["input"]["username"].as_str().unwrap().to_string(),
            password: case["input"]["password"].as_str().unwrap().to_string(),
        };

        let req = c.build_login(country(case), &input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_login(response(case));
        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(err.to_string(), expected_error.as_str().unwrap(), "{name}: error");
        } else {
            let expected: AuthSession = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[test]
fn create_order_test_vectors() {
    let raw = include_str!("../../test-vectors/orders.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["create_cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: CreateOrder = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create_order(&auth(case), &input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_create_order(response(case));
        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            assert_eq!(err.to_string(), expected_error.as_str().unwrap(), "{name}: error");
        } else {
            let expected: Order = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

#[test]
fn list_orders_test_vectors() {
    let raw = include_str!("../../test-vectors/orders.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["list_cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let f = &case["filter"];
        let filter = OrderFilter {
            tipo: f.get("tipo").map(|t| serde_json::from_value::<OrderKind>(t.clone()).unwrap()),
            estado: f.get("estado").and_then(Value::as_str).map(str::to_string),
            limit: f.get("limit").and_then(Value::as_u64).map(|n| n as u32),
            offset: f.get("offset").and_then(Value::as_u64).map(|n| n as u32),
        };

        let req = c.build_list_orders(&auth(case), &filter).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let orders = c.parse_list_orders(response(case)).unwrap();
        let expected: Vec<Order> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(orders, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Deliveries
// ---------------------------------------------------------------------------

#[test]
fn deliveries_test_vectors() {
    let raw = include_str!("../../test-vectors/deliveries.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let date = NaiveDate::parse_from_str(case["date"].as_str().unwrap(), "%Y-%m-%d").unwrap();

        let req = c.build_routes(&auth(case), date).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let deliveries = c.parse_deliveries(response(case)).unwrap();
        let expected: Vec<Delivery> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(deliveries, expected, "{name}: parsed result");
    }
}
