//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the seams between the monitoring core and the systems it
//! talks to. Adapters implement them; the application layer consumes them.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │  manager / monitors /   │
//!     ┌──────────────┤  cleanup scheduler      ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌──────────┐           ┌─────────────┐              ┌───────────┐
//! │ Database │           │ Alert sink  │              │  Memory   │
//! │ service  │           │             │              │ reclaimer │
//! └──────────┘           └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`DatabaseService`] - Queries, transactions and probes against the shared database
//! - [`RetryClassifier`] - Decides whether a backend failure is worth retrying
//! - [`AlertSink`] - Receives threshold alerts from the performance monitor
//! - [`MemoryReclaimer`] - Best-effort request to return freed memory to the OS

pub mod outbound;

pub use outbound::alert::{AlertSink, AlertSinkRegistry, LogAlertSink, NullAlertSink};
pub use outbound::classifier::{DefaultRetryClassifier, ErrorClass, RetryClassifier};
pub use outbound::database::{BackendError, DatabaseService, StepFailure, TransactionStep};
pub use outbound::reclaim::{MemoryReclaimer, NoopReclaimer};
