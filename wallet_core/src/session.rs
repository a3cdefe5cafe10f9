//! Wallet session state machine.
//!
//! The [`SessionManager`] is the only writer of [`SessionState`]. Consumers
//! read the current state or subscribe to changes through a `watch` channel.
//!
//! Passive probes (`check`, `sync`) never fail: wallet errors are logged and
//! folded into a state. The explicit `connect` surfaces its errors.

use krypt_types::{Address, KryptError, Session, SessionState};
use tokio::sync::watch;

use crate::provider::WalletCapability;

pub struct SessionManager {
    capability: Option<WalletCapability>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a manager in the `Checking` state. Pass `None` when no wallet
    /// capability is present in the environment.
    pub fn new(capability: Option<WalletCapability>) -> Self {
        let (state, _) = watch::channel(SessionState::Checking);
        Self { capability, state }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn session(&self) -> Session {
        self.state().session()
    }

    /// Get a receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The connected account, or `NotConnected`.
    pub fn require_account(&self) -> Result<Address, KryptError> {
        self.state().account().ok_or(KryptError::NotConnected)
    }

    /// Startup probe: leave `Checking` via a passive account query.
    pub async fn check(&self) -> SessionState {
        let Some(wallet) = &self.capability else {
            tracing::info!("no wallet capability present; install a wallet to continue");
            return self.transition(SessionState::Unavailable);
        };

        let next = match wallet.accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(account) => SessionState::Connected(*account),
                None => {
                    tracing::info!("wallet present but no accounts authorized");
                    SessionState::Disconnected
                }
            },
            Err(e) if e.is_unreachable() => {
                tracing::warn!(provider = wallet.name(), "wallet unreachable: {e}");
                SessionState::Unavailable
            }
            Err(e) => {
                tracing::warn!(provider = wallet.name(), "passive account check failed: {e}");
                SessionState::Disconnected
            }
        };
        self.transition(next)
    }

    /// Re-run the passive account query to pick up changes made in the
    /// wallet: revocation (zero accounts), an account switch, or an
    /// authorization granted outside this client.
    ///
    /// Errors leave the current state unchanged.
    pub async fn sync(&self) -> SessionState {
        let Some(wallet) = &self.capability else {
            return self.transition(SessionState::Unavailable);
        };

        match wallet.accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(account) => self.transition(SessionState::Connected(*account)),
                None => self.transition(SessionState::Disconnected),
            },
            Err(e) => {
                tracing::warn!(provider = wallet.name(), "session sync failed: {e}");
                self.state()
            }
        }
    }

    /// Explicitly ask the wallet to authorize an account, prompting the user.
    ///
    /// On approval the first returned account becomes the session account.
    pub async fn connect(&self) -> Result<Address, KryptError> {
        let wallet = self
            .capability
            .as_ref()
            .ok_or(KryptError::NoWalletCapability)?;

        let accounts = wallet
            .request_accounts()
            .await
            .map_err(|e| KryptError::WalletConnectionFailed(e.to_string()))?;

        let account = accounts.first().copied().ok_or_else(|| {
            KryptError::WalletConnectionFailed("wallet approved no accounts".to_string())
        })?;

        self.transition(SessionState::Connected(account));
        Ok(account)
    }

    /// Adopt an account observed through another path (e.g. the signer a
    /// ledger binding resolved to).
    pub fn adopt(&self, account: Address) {
        self.transition(SessionState::Connected(account));
    }

    /// The wallet reported zero authorized accounts: a connected session
    /// falls back to `Disconnected`. Other states are left alone.
    pub fn revoke(&self) {
        if self.state().is_connected() {
            self.transition(SessionState::Disconnected);
        }
    }

    fn transition(&self, next: SessionState) -> SessionState {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::info!(from = %previous, to = %next, "session state changed");
        }
        next
    }
}
