//! Krypt client core.
//!
//! The client lets a user connect a wallet, submit value transfers annotated
//! with a keyword and message, and view the transfer history recorded on a
//! ledger contract:
//! - Tracks the wallet session (`krypt-wallet-core`)
//! - Drives the two-phase submission: native transfer, then ledger record
//! - Materializes the ledger's records for display
//! - Keeps the last-known transaction count as a local hint
//!
//! [`KryptClient`] is the surface a UI layer depends on.

mod binding;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod orchestrator;
pub mod shutdown;
pub mod tracing_spans;

pub use client::KryptClient;
pub use config::ClientConfig;
pub use error::NodeError;
pub use history::{normalize, HistoryMaterializer, Records};
pub use orchestrator::{SubmissionReceipt, TransactionOrchestrator};
pub use shutdown::{ShutdownController, ShutdownSignal};
