//! Client core for the medical-supply ordering gateway.
//!
//! # Overview
//! Sales representatives and institutional customers browse products, place
//! orders, register client visits and check scheduled deliveries through a
//! single REST gateway. This crate holds everything below the screens: the
//! request/response contracts, the persisted credentials, the cached user
//! profile and the order being composed.
//!
//! # Design
//! - `GatewayClient` is stateless and does no I/O: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse` (host-does-IO).
//! - `Gateway` executes those requests through a `Transport` and owns the
//!   `CredentialStore` and `UserCache`, so separate instances never share
//!   state.
//! - `OrderDraft` is a plain owned value; whoever drives the order flow
//!   holds it and lends it out.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod clock;
pub mod config;
pub mod country;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod number;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use client::{flatten_routes, AuthContext, GatewayClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, ConfigError};
pub use country::Country;
pub use draft::{OrderDraft, OrderDraftLine};
pub use error::{ApiError, ValidationError};
pub use gateway::{compose_order, Gateway, OrderSubmission};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use session::UserCache;
pub use store::{CredentialStore, FileStore, KeyValueStore, MemoryStore, StoreError};
pub use transport::UreqTransport;
pub use types::{
    AuthSession, CreateOrder, CreateOrderItem, CreateVisit, Delivery, Order, OrderFilter,
    OrderItem, OrderKind, Page, Product, ProductDetail, ProductLocation, ProductOverview,
    Registration, Role, Route, RouteStop, UserInfo, UserSummary, Visit, VisitFilter, VisitStatus,
};
