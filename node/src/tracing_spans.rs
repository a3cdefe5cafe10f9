//! [`tracing::Span`] constructors for client operations.
//!
//! Consistent span names and fields let log output from one submission be
//! filtered and correlated end to end.

use krypt_types::Address;
use tracing::{info_span, Span};

/// Span covering one `submit` from validation to history refresh.
pub fn submit_span(recipient: &str, amount: &str) -> Span {
    info_span!("submit", recipient = %recipient, amount = %amount)
}

/// Span covering an explicit wallet connect.
pub fn connect_span() -> Span {
    info_span!("connect")
}

/// Span covering a history refresh.
pub fn refresh_span(account: Option<Address>) -> Span {
    match account {
        Some(account) => info_span!("refresh", account = %account),
        None => info_span!("refresh"),
    }
}
