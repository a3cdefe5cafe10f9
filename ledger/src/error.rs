use krypt_types::{KryptError, TxHash};
use krypt_wallet_core::WalletError;
use std::time::Duration;
use thiserror::Error;

use crate::abi::AbiError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no wallet capability is available")]
    NoWalletCapability,

    #[error("signer unavailable: {0}")]
    SignerUnavailable(String),

    /// The wallet answered but no account is authorized (revoked or never
    /// granted).
    #[error("signer unavailable: wallet exposes no authorized account")]
    NoAuthorizedAccount,

    #[error("ledger call failed: {0}")]
    CallFailed(#[source] WalletError),

    #[error("ledger call {tx} reverted")]
    Reverted { tx: TxHash },

    #[error("ledger call {tx} not confirmed after {waited:?}")]
    Timeout { tx: TxHash, waited: Duration },

    #[error("ledger read failed: {0}")]
    ReadFailed(#[source] WalletError),

    #[error("ledger returned malformed data: {0}")]
    Decode(#[from] AbiError),
}

impl From<LedgerError> for KryptError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NoWalletCapability => KryptError::NoWalletCapability,
            LedgerError::SignerUnavailable(reason) => KryptError::SignerUnavailable(reason),
            LedgerError::NoAuthorizedAccount => {
                KryptError::SignerUnavailable("wallet exposes no authorized account".to_string())
            }
            LedgerError::CallFailed(_) | LedgerError::Reverted { .. } => {
                KryptError::LedgerCallFailed {
                    native_tx: None,
                    reason: e.to_string(),
                }
            }
            LedgerError::Timeout { tx, waited } => KryptError::LedgerCallTimeout {
                tx,
                waited_secs: waited.as_secs(),
                native_tx: None,
            },
            LedgerError::ReadFailed(_) | LedgerError::Decode(_) => {
                KryptError::LedgerReadFailed(e.to_string())
            }
        }
    }
}
