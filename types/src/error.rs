//! Error taxonomy surfaced to the UI layer.
//!
//! Every failure of `connect`, `submit` or a ledger operation is classified
//! into one of these variants. Read-path failures during history refresh are
//! logged and never reach the caller.

use thiserror::Error;

use crate::{AddressError, AmountError, TxHash};

#[derive(Debug, Error)]
pub enum KryptError {
    #[error("no wallet capability is available")]
    NoWalletCapability,

    #[error("wallet connection failed: {0}")]
    WalletConnectionFailed(String),

    #[error("wallet is not connected")]
    NotConnected,

    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(#[from] AddressError),

    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),

    #[error("native transfer failed: {0}")]
    NativeTransferFailed(String),

    /// The ledger write failed. When `native_tx` is set, the native transfer
    /// was already sent and is not reversed: value moved without a ledger record.
    #[error("ledger call failed{}: {reason}", native_note(.native_tx))]
    LedgerCallFailed {
        native_tx: Option<TxHash>,
        reason: String,
    },

    #[error("ledger read failed: {0}")]
    LedgerReadFailed(String),

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    /// The ledger write did not settle within the bounded wait. It may still
    /// confirm later.
    #[error("ledger call {tx} not confirmed after {waited_secs}s{}", native_note(.native_tx))]
    LedgerCallTimeout {
        tx: TxHash,
        waited_secs: u64,
        native_tx: Option<TxHash>,
    },
}

impl KryptError {
    /// Whether value may have moved (native transfer sent) without a
    /// matching ledger record.
    pub fn value_moved_without_record(&self) -> bool {
        matches!(
            self,
            Self::LedgerCallFailed { native_tx: Some(_), .. }
                | Self::LedgerCallTimeout { native_tx: Some(_), .. }
        )
    }

    /// Attach the hash of an already-sent native transfer to a ledger write error.
    pub fn after_native_transfer(self, native: TxHash) -> Self {
        match self {
            Self::LedgerCallFailed { reason, .. } => Self::LedgerCallFailed {
                native_tx: Some(native),
                reason,
            },
            Self::LedgerCallTimeout { tx, waited_secs, .. } => Self::LedgerCallTimeout {
                tx,
                waited_secs,
                native_tx: Some(native),
            },
            other => other,
        }
    }
}

fn native_note(native_tx: &Option<TxHash>) -> String {
    match native_tx {
        Some(hash) => format!(" (native transfer {hash} was already sent and is not reversed)"),
        None => String::new(),
    }
}
