//! # Filegate Gateway
//!
//! HTTP gateway exposing directory-scoped file operations over S3.
//!
//! This crate provides:
//! - **File API**: upload, retrieve and remove files; remove whole folders
//! - **Authentication**: JWT bearer tokens with per-client role claims
//! - **Authorization**: path rules gating uploads and removals on `ADMIN`
//! - **Rate Limiting**: Per-caller request throttling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                  Filegate Gateway                   │
//! ├─────────────────────────────────────────────────────┤
//! │  Auth Middleware │ Rate Limiter │ Multipart Reader  │
//! ├─────────────────────────────────────────────────────┤
//! │                  filegate-core                      │
//! │     (key building, upload/fetch/delete)             │
//! ├─────────────────────────────────────────────────────┤
//! │                  filegate-store                     │
//! │             (S3, in-memory)                         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod routes;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::{ApiError, ErrorCode};
pub use routes::create_router;
pub use server::{run_server, run_server_with_shutdown};
pub use state::{AppState, Principal};
