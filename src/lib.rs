//! Textgate - an HTTP API gateway for a text-processing backend.
//!
//! Textgate sits between browser clients and a backend text-processing
//! service. It validates and forwards requests, multiplexes several backend
//! capabilities (style conversion, quality analysis, retrieval-augmented
//! question answering, document ingestion, user-profile storage) behind one
//! stable contract, and guarantees that every failure, whether a validation
//! error, a downstream service error, or a network failure, reaches the
//! client in one uniform envelope.
//!
//! # Features
//! - Typed request envelopes with constraint collection (all violations
//!   reported at once, backend never called on invalid input)
//! - Single canonical error shape for every failure, with a fixed
//!   status-name table and 4xx detail sanitization
//! - JSON and multipart forwarding with a strict header allowlist
//! - Per-operation timeouts and boundary-enforced body-size limits
//! - Request timing / request-id middleware applied to every route
//! - Configuration via file + `TEXTGATE_*` environment variables, with
//!   production-mode startup validation
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use textgate::{AppState, ReqwestBackendClient, build_router, config::GatewayConfig};
//!
//! # fn main() -> eyre::Result<()> {
//! let config = Arc::new(GatewayConfig::default());
//! let backend = Arc::new(ReqwestBackendClient::new(
//!     &config.backend_base_url(),
//!     config.request_timeout(),
//! )?);
//! let app = build_router(AppState::new(backend, config));
//! // Serve `app` with axum (see the binary crate for the full wiring).
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters**
//! (implementations) while keeping validation and error normalization inside
//! `core`. The gateway holds no durable state; everything is request-scoped
//! except the startup-resolved configuration.
pub mod config;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;
pub mod ports;

// Re-export the specific types needed by the binary crate and embedders
pub use crate::{
    adapters::{AppState, ReqwestBackendClient, build_router},
    core::{CanonicalError, GatewayError, normalize},
    ports::backend::{BackendClient, BackendError, BackendResponse},
    utils::GracefulShutdown,
};
