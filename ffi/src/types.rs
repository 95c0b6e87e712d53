//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests cross as plain data (`*mut c_char` strings, a header array and a
//! C enum for the method). Parsed payloads cross as JSON text inside a single
//! `FfiResult` envelope: the host already speaks JSON for its UI layer, and
//! one envelope keeps the free logic to a single function. Conversion helpers
//! live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use medsupply_core::{ApiError, GatewayClient, HttpMethod, HttpRequest, OrderDraft};
use serde::Serialize;

/// Opaque handle to a `GatewayClient`. C callers receive a pointer to this
/// and pass it back into every build/parse function.
pub struct FfiClient {
    pub(crate) inner: GatewayClient,
}

/// Opaque handle to an `OrderDraft` owned by the host's order screen.
pub struct FfiDraft {
    pub(crate) inner: OrderDraft,
}

/// Convert a Rust string into an owned C string. Interior NUL bytes cannot
/// be represented and are dropped.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let mut bytes = s.into();
    bytes.retain(|b| *b != 0);
    CString::new(bytes).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `medsupply_build_*` functions. The host executes the request
/// and passes the response back through the matching `medsupply_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The host fills this in after executing a request and passes a pointer to
/// a `medsupply_parse_*` function. The FFI layer reads but does not free
/// these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Http = 1,
    Connectivity = 2,
    Precondition = 3,
    Validation = 4,
    Deserialization = 5,
    Serialization = 6,
    NullArg = 7,
    InvalidArg = 8,
    Panic = 9,
}

/// Result envelope for parse and compose operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data_json`
/// holds the payload as JSON (null when there is none). On failure
/// `error_message` is a human-readable C string, `http_status` carries the
/// gateway status for `Http` errors, and `data_json` is null.
#[repr(C)]
pub struct FfiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_json: *mut c_char,
}

impl FfiResult {
    fn boxed(error_code: FfiErrorCode, message: Option<String>, http_status: u16, data: Option<String>) -> *mut Self {
        Box::into_raw(Box::new(FfiResult {
            error_code,
            error_message: message.map_or(std::ptr::null_mut(), |m| c_string(m)),
            http_status,
            data_json: data.map_or(std::ptr::null_mut(), |d| c_string(d)),
        }))
    }

    /// Success carrying `value` serialized as JSON.
    pub(crate) fn ok_json<T: Serialize>(value: &T) -> *mut Self {
        match serde_json::to_string(value) {
            Ok(json) => Self::boxed(FfiErrorCode::Ok, None, 0, Some(json)),
            Err(e) => Self::boxed(FfiErrorCode::Serialization, Some(e.to_string()), 0, None),
        }
    }

    /// Success with no payload (e.g. registration).
    pub(crate) fn ok_empty() -> *mut Self {
        Self::boxed(FfiErrorCode::Ok, None, 0, None)
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let code = match &err {
            ApiError::Http { .. } => FfiErrorCode::Http,
            ApiError::Connectivity { .. } => FfiErrorCode::Connectivity,
            ApiError::Precondition(_) => FfiErrorCode::Precondition,
            ApiError::Validation(_) => FfiErrorCode::Validation,
            ApiError::Deserialization(_) => FfiErrorCode::Deserialization,
            ApiError::Serialization(_) => FfiErrorCode::Serialization,
        };
        let status = err.status().unwrap_or(0);
        Self::boxed(code, Some(err.to_string()), status, None)
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, Some(format!("null argument: {name}")), 0, None)
    }

    pub(crate) fn invalid_arg(message: String) -> *mut Self {
        Self::boxed(FfiErrorCode::InvalidArg, Some(message), 0, None)
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg.to_string()), 0, None)
    }
}
