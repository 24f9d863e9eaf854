//! Reflex: analytic query engine for wiki editing history.
//!
//! Answers "who edited what, when", "who reverted whom", and "who
//! belongs to which project, and for how long" over a historical
//! edit-activity dataset.
//!
//! # Core Concepts
//!
//! - **Wiki week**: whole 7-day periods since 2001-01-01, the canonical
//!   time unit for every window and comparison.
//! - **Fragments**: per-dimension filter predicates, AND-composed into
//!   one retrieval request against the store adapter.
//! - **Membership ledger**: ordered link added/removed events, replayed
//!   per request into time-bounded project memberships.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use reflex::{OpenStore, ReflexApi, SqliteStore};
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let api = ReflexApi::new(Arc::new(store));
//! // Api is ready to serve requests
//! ```

pub mod activity;
pub mod api;
pub mod config;
pub mod envelope;
pub mod member;
pub mod namespace;
pub mod presence;
pub mod query;
pub mod store;

pub use api::{ApiError, ApiResult, ReflexApi};
pub use envelope::{Envelope, ErrorStatus};
pub use member::{MemberMap, MemberTo, MembershipRecord};
pub use query::{GroupSpec, TimeWindow};
pub use store::{EditStore, OpenStore, SqliteStore, StoreError, StoreResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
