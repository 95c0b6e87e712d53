//! C-ABI wrapper around `medsupply-core`.
//!
//! # Overview
//! A mobile host that runs its own HTTP stack drives the ordering gateway
//! through these functions: it asks for a request, executes it, and hands the
//! response back for parsing. The order draft lives behind an opaque handle
//! so the host's screens share one copy of it.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core API 1:1. Build
//!   functions return null on bad arguments; parse functions always return
//!   an `FfiResult`.
//! - Country arguments are ISO codes (`"mx"`, `"co"`, ...). Null means the
//!   default country.
//! - The caller owns all returned pointers and must call the matching
//!   `medsupply_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::NaiveDate;
use medsupply_core::types::LoginRequest;
use medsupply_core::{
    compose_order, AuthContext, Country, CreateOrder, GatewayClient, HttpResponse, OrderDraftLine,
    OrderFilter, OrderKind, OrderSubmission, Page, Registration, UserInfo,
};
use tracing::{debug, warn};

use types::*;

/// Read a borrowed C string. `None` when null or not UTF-8.
fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok().map(str::to_string)
}

/// Null selects the default country; an unknown code is `None`.
fn read_country(ptr: *const c_char) -> Option<Country> {
    match read_str(ptr) {
        None if ptr.is_null() => Some(Country::DEFAULT),
        None => None,
        Some(code) => code.parse().ok(),
    }
}

fn read_auth(country: *const c_char, token: *const c_char) -> Option<AuthContext> {
    let country = read_country(country)?;
    let token = read_str(token)?;
    Some(AuthContext::new(country, token))
}

fn read_response(resp: &FfiHttpResponse) -> HttpResponse {
    HttpResponse::new(resp.status, read_str(resp.body).unwrap_or_default())
}

/// Shared shape of every parse function: null checks, conversion, envelope.
fn parse_with<T, F>(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
    name: &str,
    parse: F,
) -> *mut FfiResult
where
    T: serde::Serialize,
    F: FnOnce(&GatewayClient, HttpResponse) -> Result<T, medsupply_core::ApiError>,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = read_response(unsafe { &*response });
        match parse(&client.inner, resp) {
            Ok(value) => FfiResult::ok_json(&value),
            Err(e) => {
                debug!(operation = name, error = %e, "parse failed");
                FfiResult::from_error(e)
            }
        }
    }))
    .unwrap_or_else(|_| FfiResult::panic(&format!("panic in {name}")))
}

/// `YYYY-MM-DD`, as the routes endpoint expects it.
fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Install the tracing subscriber. `RUST_LOG` overrides `verbose`. Calling
/// it more than once is harmless.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_init_logging(verbose: bool) {
    let _ = catch_unwind(|| medsupply_core::logging::init_logging(verbose));
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url`.
///
/// Returns null if `base_url` is null or not UTF-8.
/// The caller must free the returned pointer with `medsupply_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_client_new(base_url: *const c_char) -> *mut FfiClient {
    catch_unwind(|| match read_str(base_url) {
        Some(url) => Box::into_raw(Box::new(FfiClient {
            inner: GatewayClient::new(&url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `medsupply_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_client_free(client: *mut FfiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// `POST /auth/login`.
///
/// Returns null if `client`, `username` or `password` is null, or if
/// `country` is not a known code.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_build_login(
    client: *const FfiClient,
    country: *const c_char,
    username: *const c_char,
    password: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(country), Some(username), Some(password)) =
            (read_country(country), read_str(username), read_str(password))
        else {
            return std::ptr::null_mut();
        };
        let input = LoginRequest { username, password };
        match client.inner.build_login(country, &input) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `POST /auth/register` for an institutional customer. `form_json` holds
/// `username`, `password`, `institution_name`, `address` and `city`.
/// Returns null if the JSON does not parse or any field is missing or blank.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_build_register(
    client: *const FfiClient,
    country: *const c_char,
    form_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(country), Some(json)) = (read_country(country), read_str(form_json)) else {
            return std::ptr::null_mut();
        };
        let Ok(form) = serde_json::from_str::<Registration>(&json) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_register(country, &form) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `GET /usuarios/me`. Returns null if `client` or `token` is null.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_build_current_user(
    client: *const FfiClient,
    country: *const c_char,
    token: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match read_auth(country, token) {
            Some(ctx) => FfiHttpRequest::from_core(client.inner.build_current_user(&ctx)),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `GET /inventario/productos/todos?limit=&offset=`.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_build_list_products(
    client: *const FfiClient,
    country: *const c_char,
    token: *const c_char,
    limit: u32,
    offset: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(ctx) = read_auth(country, token) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_list_products(&ctx, Page { limit, offset }) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `GET /pedidos`.
///
/// `tipo` (`"VENTA"`/`"COMPRA"`) and `estado` may be null to skip them;
/// a negative `limit` or `offset` is left out of the query.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_build_list_orders(
    client: *const FfiClient,
    country: *const c_char,
    token: *const c_char,
    tipo: *const c_char,
    estado: *const c_char,
    limit: i64,
    offset: i64,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(ctx) = read_auth(country, token) else {
            return std::ptr::null_mut();
        };
        let tipo = match read_str(tipo) {
            None => None,
            Some(raw) => match serde_json::from_value::<OrderKind>(serde_json::Value::String(raw)) {
                Ok(kind) => Some(kind),
                Err(_) => return std::ptr::null_mut(),
            },
        };
        let filter = OrderFilter {
            tipo,
            estado: read_str(estado),
            limit: u32::try_from(limit).ok(),
            offset: u32::try_from(offset).ok(),
        };
        match client.inner.build_list_orders(&ctx, &filter) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `POST /pedidos` with `order_json` as produced by
/// `medsupply_compose_order`.
///
/// Returns null on null arguments or when `order_json` is not a valid order.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_build_create_order(
    client: *const FfiClient,
    country: *const c_char,
    token: *const c_char,
    order_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(ctx), Some(json)) = (read_auth(country, token), read_str(order_json)) else {
            return std::ptr::null_mut();
        };
        let order: CreateOrder = match serde_json::from_str(&json) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "rejecting malformed order body");
                return std::ptr::null_mut();
            }
        };
        match client.inner.build_create_order(&ctx, &order) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// `GET /logistica/rutas?fecha=` for `date` (`YYYY-MM-DD`).
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_build_deliveries(
    client: *const FfiClient,
    country: *const c_char,
    token: *const c_char,
    date: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(ctx) = read_auth(country, token) else {
            return std::ptr::null_mut();
        };
        let Some(date) = read_str(date).as_deref().and_then(parse_date) else {
            return std::ptr::null_mut();
        };
        match client.inner.build_routes(&ctx, date) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// `data_json` is the session object.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_parse_login(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "medsupply_parse_login", |c, r| c.parse_login(r))
}

/// Success carries no payload.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_parse_register(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        match client.inner.parse_register(read_response(unsafe { &*response })) {
            Ok(()) => FfiResult::ok_empty(),
            Err(e) => FfiResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in medsupply_parse_register"))
}

/// `data_json` is the user profile.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_parse_current_user(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "medsupply_parse_current_user", |c, r| {
        c.parse_current_user(r)
    })
}

/// `data_json` is an array of products with numeric prices.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_parse_list_products(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "medsupply_parse_list_products", |c, r| {
        c.parse_list_products(r)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn medsupply_parse_list_orders(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "medsupply_parse_list_orders", |c, r| {
        c.parse_list_orders(r)
    })
}

/// `data_json` is the created order. The draft is not touched; the host
/// clears it with `medsupply_draft_clear` once this succeeds.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_parse_create_order(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "medsupply_parse_create_order", |c, r| {
        c.parse_create_order(r)
    })
}

/// `data_json` is the flattened list of stops across all routes.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_parse_deliveries(
    client: *const FfiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiResult {
    parse_with(client, response, "medsupply_parse_deliveries", |c, r| {
        c.parse_deliveries(r)
    })
}

// ---------------------------------------------------------------------------
// Order draft
// ---------------------------------------------------------------------------

/// Create an empty draft. Free it with `medsupply_draft_free`.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_draft_new() -> *mut FfiDraft {
    catch_unwind(|| Box::into_raw(Box::new(FfiDraft { inner: Default::default() })))
        .unwrap_or(std::ptr::null_mut())
}

/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_draft_free(draft: *mut FfiDraft) {
    if !draft.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(draft) });
        });
    }
}

/// Append a line given as JSON. Returns false if `draft` is null or the
/// JSON is not a valid line; the draft is unchanged in that case.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_draft_add(draft: *mut FfiDraft, line_json: *const c_char) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if draft.is_null() {
            return false;
        }
        let Some(json) = read_str(line_json) else {
            return false;
        };
        match serde_json::from_str::<OrderDraftLine>(&json) {
            Ok(line) => {
                unsafe { &mut *draft }.inner.add(line);
                true
            }
            Err(e) => {
                warn!(error = %e, "rejecting malformed draft line");
                false
            }
        }
    }))
    .unwrap_or(false)
}

/// Drop every line for product `id`.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_draft_remove(draft: *mut FfiDraft, id: *const c_char) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        if draft.is_null() {
            return;
        }
        if let Some(id) = read_str(id) {
            unsafe { &mut *draft }.inner.remove(&id);
        }
    }));
}

#[unsafe(no_mangle)]
pub extern "C" fn medsupply_draft_clear(draft: *mut FfiDraft) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        if !draft.is_null() {
            unsafe { &mut *draft }.inner.clear();
        }
    }));
}

/// Number of lines; 0 for null.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_draft_len(draft: *const FfiDraft) -> u32 {
    catch_unwind(|| {
        if draft.is_null() {
            return 0;
        }
        unsafe { &*draft }.inner.len() as u32
    })
    .unwrap_or(0)
}

/// Lines as a JSON array, in insertion order. Free with
/// `medsupply_free_string`. Null if `draft` is null.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_draft_lines_json(draft: *const FfiDraft) -> *mut c_char {
    catch_unwind(|| {
        if draft.is_null() {
            return std::ptr::null_mut();
        }
        match serde_json::to_string(unsafe { &*draft }.inner.lines()) {
            Ok(json) => c_string(json),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Validate the draft and turn it into an order body for the signed-in user.
///
/// `user_json` is the profile from `medsupply_parse_current_user`;
/// `submission_json` may be null and otherwise names `tipo`, `cliente_id`,
/// `vendedor_id`, `bodega_origen_id` and `observaciones` as needed. On
/// success `data_json` is the body to pass to `medsupply_build_create_order`.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_compose_order(
    draft: *const FfiDraft,
    user_json: *const c_char,
    submission_json: *const c_char,
) -> *mut FfiResult {
    catch_unwind(|| {
        if draft.is_null() {
            return FfiResult::null_arg("draft");
        }
        let Some(user_raw) = read_str(user_json) else {
            return FfiResult::null_arg("user_json");
        };
        let user: UserInfo = match serde_json::from_str(&user_raw) {
            Ok(user) => user,
            Err(e) => return FfiResult::invalid_arg(format!("user_json: {e}")),
        };
        let submission: OrderSubmission = match read_str(submission_json) {
            None => OrderSubmission::default(),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(s) => s,
                Err(e) => return FfiResult::invalid_arg(format!("submission_json: {e}")),
            },
        };
        match compose_order(&user, &unsafe { &*draft }.inner, &submission) {
            Ok(order) => FfiResult::ok_json(&order),
            Err(e) => FfiResult::from_error(e.into()),
        }
    })
    .unwrap_or_else(|_| FfiResult::panic("panic in medsupply_compose_order"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `medsupply_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.path.is_null() {
            drop(unsafe { CString::from_raw(req.path) });
        }
        if !req.body.is_null() {
            drop(unsafe { CString::from_raw(req.body) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let slice = std::ptr::slice_from_raw_parts_mut(req.headers, req.headers_len as usize);
            let headers = unsafe { Box::from_raw(slice) };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free a result returned by any `medsupply_parse_*` or compose function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data_json.is_null() {
            drop(unsafe { CString::from_raw(result.data_json) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn medsupply_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
