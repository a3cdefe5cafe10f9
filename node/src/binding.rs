//! Ledger binding tied to the wallet session.

use krypt_ledger::{LedgerClient, LedgerError, LedgerHandle};
use krypt_wallet_core::SessionManager;

/// Bind the ledger to the wallet's current signer. A wallet that answers
/// with zero accounts has revoked this client, so the session is cleared.
pub(crate) async fn bind(
    ledger: &LedgerClient,
    session: &SessionManager,
) -> Result<LedgerHandle, LedgerError> {
    let bound = ledger.bind().await;
    if let Err(LedgerError::NoAuthorizedAccount) = &bound {
        tracing::info!("wallet reports no authorized account, clearing session");
        session.revoke();
    }
    bound
}
