//! orgguard-server: Request handlers and service wiring
//!
//! This crate contains the layer between transport and the authorization
//! engine:
//! - Group management handler
//! - Client event ingestion handler
//! - Storage adapters for the policy engine
//! - Configuration and logging bootstrap
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               orgguard-server                │
//! ├─────────────────────────────────────────────┤
//! │  config.rs        - Configuration           │
//! │  observability.rs - Logging bootstrap       │
//! │  adapters.rs      - Storage → domain        │
//! │  service.rs       - Wiring                  │
//! │  handlers/                                  │
//! │    groups/  - Group endpoints               │
//! │    events/  - Event ingestion               │
//! └─────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod observability;
pub mod service;

// Re-exports for convenience
pub use config::{ConfigLoadError, ServerConfig};
pub use service::{OrgGuardService, ServiceError};
