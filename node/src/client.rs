//! The consumer-facing client.
//!
//! [`KryptClient`] wires the session manager, ledger client, orchestrator and
//! history materializer around one shared session. A UI layer depends only
//! on this type: three operations (`connect`, `submit`, `refresh`) plus
//! observable session state, submission state and records.

use std::sync::Arc;
use std::time::Duration;

use krypt_ledger::LedgerClient;
use krypt_store::{FileHintStore, HintStore};
use krypt_types::{
    Address, KryptError, Session, SessionState, SubmissionState, TransactionDraft,
};
use krypt_wallet_core::{HttpProvider, SessionManager, WalletCapability, WalletProvider};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use crate::config::ClientConfig;
use crate::history::{HistoryMaterializer, Records};
use crate::orchestrator::{SubmissionReceipt, TransactionOrchestrator};
use crate::shutdown::ShutdownSignal;
use crate::tracing_spans::{connect_span, refresh_span};
use crate::NodeError;

pub struct KryptClient {
    config: ClientConfig,
    session: Arc<SessionManager>,
    history: Arc<HistoryMaterializer>,
    orchestrator: TransactionOrchestrator,
    hints: Arc<dyn HintStore>,
}

impl KryptClient {
    /// Assemble a client. Pass `None` for `provider` when the environment
    /// offers no wallet.
    pub fn new(
        config: ClientConfig,
        provider: Option<Arc<dyn WalletProvider>>,
        hints: Arc<dyn HintStore>,
    ) -> Result<Self, NodeError> {
        let contract = config.ledger_contract()?;
        let capability = provider.map(WalletCapability::new);

        let ledger = LedgerClient::new(capability.clone(), contract)
            .with_poll_interval(config.receipt_poll_interval());
        let session = Arc::new(SessionManager::new(capability));
        let history = Arc::new(HistoryMaterializer::new(ledger.clone(), session.clone()));
        let orchestrator = TransactionOrchestrator::new(
            ledger,
            session.clone(),
            history.clone(),
            hints.clone(),
            config.gas_limit_hint,
            config.confirmation_timeout(),
        );

        Ok(Self {
            config,
            session,
            history,
            orchestrator,
            hints,
        })
    }

    /// Build the production client: a JSON-RPC wallet at `rpc_url` (if set)
    /// and the file-backed hint store.
    pub fn from_config(config: ClientConfig) -> Result<Self, NodeError> {
        let provider = match &config.rpc_url {
            Some(url) => {
                let http = HttpProvider::new(url.clone(), config.request_timeout())?;
                Some(Arc::new(http) as Arc<dyn WalletProvider>)
            }
            None => None,
        };
        let hints = Arc::new(FileHintStore::new(config.hint_file.clone()));
        Self::new(config, provider, hints)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Startup: seed the count from the local hint, probe the wallet
    /// passively and, if an account is already authorized, load the ledger
    /// count and history.
    pub async fn start(&self) -> SessionState {
        match self.hints.load_count() {
            Ok(Some(count)) => self.orchestrator.seed_count(count),
            Ok(None) => {}
            Err(e) => tracing::warn!("ignoring unreadable count hint: {e}"),
        }

        let state = self.session.check().await;
        if state.is_connected() {
            self.orchestrator.sync_count().await;
            self.history.refresh().await;
        }
        state
    }

    /// Ask the wallet to authorize an account, then load history for it.
    pub async fn connect(&self) -> Result<Address, KryptError> {
        async {
            let account = self.session.connect().await?;
            self.orchestrator.sync_count().await;
            self.history.refresh().await;
            Ok::<_, KryptError>(account)
        }
        .instrument(connect_span())
        .await
    }

    /// Submit a transfer. See [`TransactionOrchestrator::submit`].
    pub async fn submit(&self, draft: &TransactionDraft) -> Result<SubmissionReceipt, KryptError> {
        self.orchestrator.submit(draft).await
    }

    /// Re-read the ledger's records. Without a connected account this is a
    /// no-op returning the current sequence.
    pub async fn refresh(&self) -> Records {
        let account = self.session.state().account();
        if account.is_none() {
            tracing::info!("refresh skipped: wallet not connected");
            return self.history.records();
        }
        self.history.refresh().instrument(refresh_span(account)).await
    }

    /// Pick up account changes made in the wallet (revocation, switch,
    /// authorization granted elsewhere). Records are reloaded when a new
    /// account becomes active.
    pub async fn sync_session(&self) -> SessionState {
        let before = self.session.state().account();
        let state = self.session.sync().await;
        if let Some(account) = state.account().filter(|a| Some(*a) != before) {
            self.orchestrator.sync_count().await;
            self.history
                .refresh()
                .instrument(refresh_span(Some(account)))
                .await;
        }
        state
    }

    /// Re-sync the session every `interval` until `shutdown` fires.
    pub async fn watch_session(&self, interval: Duration, mut shutdown: ShutdownSignal) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.triggered() => break,
                _ = ticker.tick() => {
                    self.sync_session().await;
                }
            }
        }
        tracing::debug!("session watch stopped");
    }

    // ── Observable state ───────────────────────────────────────────────

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> Session {
        self.session.session()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.orchestrator.state()
    }

    pub fn records(&self) -> Records {
        self.history.records()
    }

    pub fn history(&self) -> &HistoryMaterializer {
        &self.history
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn subscribe_submission(&self) -> watch::Receiver<SubmissionState> {
        self.orchestrator.subscribe()
    }

    pub fn subscribe_records(&self) -> watch::Receiver<Records> {
        self.history.subscribe()
    }
}
