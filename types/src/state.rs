//! Session and submission state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Address;

/// Wallet session lifecycle.
///
/// ```text
/// Checking ──(no wallet)──────────▶ Unavailable
///    │  └──(zero accounts)────────▶ Disconnected ──(connect approved)──┐
///    └─────(account returned)─────▶ Connected ◀────────────────────────┘
///                                      └──(wallet reports zero accounts)──▶ Disconnected
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "account", rename_all = "snake_case")]
pub enum SessionState {
    /// Probing the wallet capability at startup.
    Checking,
    /// No wallet capability is present (or it cannot be reached).
    Unavailable,
    /// A wallet is present but has not authorized any account.
    Disconnected,
    /// A wallet has authorized this account.
    Connected(Address),
}

impl SessionState {
    /// The active account, if connected.
    pub fn account(&self) -> Option<Address> {
        match self {
            Self::Connected(account) => Some(*account),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    /// Flattened view for consumers.
    pub fn session(&self) -> Session {
        Session {
            account_address: self.account(),
            connected: self.is_connected(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Unavailable => "unavailable",
            Self::Disconnected => "disconnected",
            Self::Connected(_) => "connected",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected(account) => write!(f, "connected ({account})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// The session as seen by the UI layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub account_address: Option<Address>,
    pub connected: bool,
}

/// Aggregate write-path state.
///
/// `pending` is true strictly while a ledger write is awaiting settlement.
/// `count` mirrors the ledger's transaction counter (or the local hint before
/// the first authoritative read).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionState {
    pub pending: bool,
    pub count: u64,
}
