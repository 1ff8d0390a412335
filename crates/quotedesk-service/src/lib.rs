//! # quotedesk-service: Quote Orchestration
//!
//! Sequences the pure engine in `quotedesk-core` for its callers and owns
//! everything the engine refuses to do: locking, storage, time and logging.
//!
//! ## Module Organization
//! ```text
//! quotedesk_service/
//! ├── lib.rs          ◄─── You are here (exports)
//! ├── config.rs       ◄─── ServiceConfig from QUOTEDESK_* env vars
//! ├── error.rs        ◄─── ServiceError, ApiError for the dashboard
//! ├── store.rs        ◄─── QuoteBook: per-quote Mutex, version, history
//! ├── service.rs      ◄─── QuoteService operations, expiry sweep task
//! ├── telemetry.rs    ◄─── tracing subscriber setup
//! └── bin/
//!     └── walkthrough.rs ◄─ end-to-end lifecycle demo
//! ```
//!
//! ## Example
//! ```rust
//! use quotedesk_service::{QuoteService, ServiceConfig};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let service = QuoteService::with_system_clock(ServiceConfig::default());
//! let quote = service.create_quote("acme", None).await.unwrap();
//! assert_eq!(quote.quote.quote_number, "Q-000001");
//! # });
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ApiError, ErrorCode, ServiceError, ServiceResult};
pub use service::{spawn_expiry_sweep, QuoteService};
pub use store::{QuoteBook, QuoteSnapshot};
pub use telemetry::init_tracing;
