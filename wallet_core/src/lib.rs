//! Wallet core library for krypt.
//!
//! Provides everything the client needs from the browser-style wallet:
//! - The [`WalletProvider`] capability trait (a single `request` primitive)
//! - [`WalletCapability`], typed access to accounts, authorization, value
//!   transfers, read-only calls and receipts
//! - [`HttpProvider`], a JSON-RPC implementation backed by a node with
//!   managed accounts
//! - [`SessionManager`], the wallet session state machine

pub mod encoding;
pub mod error;
pub mod http;
pub mod provider;
pub mod session;

pub use error::WalletError;
pub use http::HttpProvider;
pub use provider::{
    CallRequest, TransactionReceipt, TransactionRequest, WalletCapability, WalletProvider,
};
pub use session::SessionManager;
