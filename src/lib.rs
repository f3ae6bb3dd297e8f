//! zone-reconcile - Reconcile desired DNS records against whole-zone stores.
//!
//! Many DNS backends can only return every record of a zone and replace
//! every record of a zone. This crate turns append, set and delete requests
//! into the exact snapshot to write back, submits it under optimistic
//! locking, and reports which records were actually affected.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Reconciler                              │
//! │                                                                  │
//! │   ZoneLock (caller)   RetryPolicy          CancellationToken     │
//! │        │                   │                       │             │
//! │        ▼                   ▼                       ▼             │
//! │  ┌───────────┐   ┌──────────────────┐   ┌───────────────────┐    │
//! │  │  fetch +  │──▶│  plan ChangeList │──▶│ submit snapshot   │    │
//! │  │ normalize │   │ append/set/delete│   │ Conflict → retry  │    │
//! │  └───────────┘   └──────────────────┘   └─────────┬─────────┘    │
//! │                                                   ▼              │
//! │                                        affected records          │
//! └──────────────────────────────────────────────────────────────────┘
//!                         │ Client trait │
//!                         ▼              ▼
//!                   provider API     FileClient
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use tokio_util::sync::CancellationToken;
//! use zone_reconcile::{FileClient, Record, Reconciler, ZoneLock, ZoneRwLock};
//!
//! # async fn example() -> zone_reconcile::Result<()> {
//! let reconciler = Reconciler::new(FileClient::new("zones"))
//!     .with_lock(ZoneLock::read_write(ZoneRwLock::new()));
//! let cancel = CancellationToken::new();
//!
//! let created = reconciler
//!     .set_records(
//!         "example.com.",
//!         &[Record::address("www", "192.0.2.3".parse().unwrap(), 3600)],
//!         &cancel,
//!     )
//!     .await?;
//! println!("{} records changed", created.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod append;
pub mod change_list;
pub mod client;
pub mod config;
pub mod debug;
pub mod delete;
pub mod error;
pub mod lock;
pub mod matching;
pub mod metrics;
pub mod reconcile;
pub mod record;
pub mod retry;
pub mod set;
pub mod store;
pub mod telemetry;
pub mod zones;

// Re-export main types
pub use change_list::{ChangeList, ChangeRecord, ChangeState, StateSet};
pub use client::{Client, ZoneAwareClient};
pub use config::{Config, LockMode, RetryConfig, StoreConfig, TelemetryConfig};
pub use debug::{DebugTransport, OutputLevel};
pub use error::{Error, Result};
pub use lock::{LockGuard, Locker, SharedLocker, ZoneLock, ZoneMutex, ZoneRwLock};
pub use reconcile::Reconciler;
pub use record::{Record, RecordData, RecordError, RecordParser, Rr, StandardParser, TypedRecord};
pub use retry::RetryPolicy;
pub use store::FileClient;
pub use zones::Zone;
