//! orgguard-storage: Storage abstraction layer
//!
//! This crate provides the persistence boundary for the access gate and the
//! event pipeline:
//! - Entities (organizations, groups, ciphers, event records)
//! - `DataStore` trait for resource lookups and group writes
//! - `EventSink` trait for durable event batches
//! - In-memory implementations for tests and local runs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              orgguard-storage                │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - DataStore / EventSink        │
//! │  memory.rs   - In-memory implementations    │
//! │  error.rs    - StorageError                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Lookups are caller-agnostic. Authorization is always layered on top by the
//! access gate, except for the user-scoped cipher fetch whose contract is to
//! return only ciphers the user can see.

pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::{MemoryDataStore, MemoryEventSink};
pub use traits::{
    Cipher, CipherAccess, CollectionAccessSelection, DataStore, EventRecord, EventSink, Group,
    GroupDetails, Organization,
};
