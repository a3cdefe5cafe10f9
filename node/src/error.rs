use thiserror::Error;

/// Errors raised while assembling a client from configuration.
///
/// Runtime failures of `connect`/`submit` are classified as
/// [`krypt_types::KryptError`] instead.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("ledger interface error: {0}")]
    Interface(#[from] krypt_ledger::InterfaceError),

    #[error("wallet provider error: {0}")]
    Wallet(#[from] krypt_wallet_core::WalletError),

    #[error("store error: {0}")]
    Store(#[from] krypt_store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
