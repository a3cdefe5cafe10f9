//! Two-phase transfer submission.
//!
//! A submission moves value twice: a native transfer to the recipient,
//! then a bookkeeping write on the ledger contract. The phases are not
//! atomic. Once the native transfer is accepted it cannot be reversed, so a
//! later ledger failure is reported with the native transfer's hash
//! attached (see [`KryptError::value_moved_without_record`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use krypt_ledger::{LedgerClient, LedgerHandle, TransactionReceipt};
use krypt_store::HintStore;
use krypt_types::{
    to_ledger_units, Address, KryptError, SubmissionState, TransactionDraft, TxHash,
};
use krypt_wallet_core::{SessionManager, TransactionRequest};
use tokio::sync::watch;
use tracing::Instrument;

use crate::binding;
use crate::history::HistoryMaterializer;
use crate::tracing_spans::submit_span;

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub native_tx: TxHash,
    pub ledger_receipt: TransactionReceipt,
    /// The ledger's transaction count after the write.
    pub count: u64,
}

pub struct TransactionOrchestrator {
    ledger: LedgerClient,
    session: Arc<SessionManager>,
    history: Arc<HistoryMaterializer>,
    hints: Arc<dyn HintStore>,
    state: watch::Sender<SubmissionState>,
    in_flight: AtomicBool,
    gas_limit_hint: u64,
    confirmation_timeout: Duration,
}

/// Clears the in-flight flag when a submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Holds `pending` true until dropped.
struct Pending<'a>(&'a watch::Sender<SubmissionState>);

impl<'a> Pending<'a> {
    fn raise(state: &'a watch::Sender<SubmissionState>) -> Self {
        state.send_modify(|s| s.pending = true);
        Self(state)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.pending = false);
    }
}

impl TransactionOrchestrator {
    pub fn new(
        ledger: LedgerClient,
        session: Arc<SessionManager>,
        history: Arc<HistoryMaterializer>,
        hints: Arc<dyn HintStore>,
        gas_limit_hint: u64,
        confirmation_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::default());
        Self {
            ledger,
            session,
            history,
            hints,
            state,
            in_flight: AtomicBool::new(false),
            gas_limit_hint,
            confirmation_timeout,
        }
    }

    pub fn state(&self) -> SubmissionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Seed `count` from the local hint before any ledger read.
    pub fn seed_count(&self, count: u64) {
        self.state.send_modify(|s| s.count = count);
    }

    /// Replace `count` with the ledger's counter. Read failures are logged
    /// and leave `count` unchanged.
    pub async fn sync_count(&self) -> u64 {
        match binding::bind(&self.ledger, &self.session).await {
            Ok(handle) => self.read_count(&handle).await,
            Err(e) => {
                tracing::warn!("transaction count not refreshed: {e}");
                self.state().count
            }
        }
    }

    async fn read_count(&self, handle: &LedgerHandle) -> u64 {
        match handle.fetch_transfer_count().await {
            Ok(count) => {
                self.state.send_modify(|s| s.count = count);
                if let Err(e) = self.hints.store_count(count) {
                    tracing::warn!("failed to store transaction count hint: {e}");
                }
                count
            }
            Err(e) => {
                tracing::warn!("transaction count not refreshed: {e}");
                self.state().count
            }
        }
    }

    /// Submit a transfer: native value transfer, then the ledger record.
    ///
    /// Only one submission runs at a time; a concurrent call fails with
    /// `SubmissionInProgress` before touching the wallet.
    pub async fn submit(&self, draft: &TransactionDraft) -> Result<SubmissionReceipt, KryptError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(KryptError::SubmissionInProgress);
        }
        let _in_flight = InFlight(&self.in_flight);

        let span = submit_span(&draft.recipient, &draft.amount);
        self.run(draft).instrument(span).await
    }

    async fn run(&self, draft: &TransactionDraft) -> Result<SubmissionReceipt, KryptError> {
        let account = self.session.require_account()?;
        let amount = to_ledger_units(&draft.amount)?;
        let recipient = Address::parse(&draft.recipient)?;

        let handle = binding::bind(&self.ledger, &self.session).await?;
        let signer = handle.signer();
        if signer != account {
            tracing::info!(session = %account, signer = %signer, "wallet signer changed, adopting it");
            self.session.adopt(signer);
        }

        let transfer =
            TransactionRequest::transfer(signer, recipient, amount, self.gas_limit_hint);
        let native_tx = handle
            .wallet()
            .send_transaction(&transfer)
            .await
            .map_err(|e| KryptError::NativeTransferFailed(e.to_string()))?;
        tracing::info!(tx = %native_tx, "native transfer accepted");

        let ledger_receipt = {
            let _pending = Pending::raise(&self.state);
            let written = handle
                .record_transfer(recipient, amount, &draft.message, &draft.keyword)
                .await
                .map_err(|e| KryptError::from(e).after_native_transfer(native_tx))?;
            tracing::info!(tx = %written.hash(), "ledger write pending");
            written
                .confirmed(self.confirmation_timeout)
                .await
                .map_err(|e| KryptError::from(e).after_native_transfer(native_tx))?
        };
        tracing::info!(tx = %ledger_receipt.transaction_hash, block = ledger_receipt.block_number, "ledger write confirmed");

        let count = self.read_count(&handle).await;
        self.history.refresh().await;

        Ok(SubmissionReceipt {
            native_tx,
            ledger_receipt,
            count,
        })
    }
}
