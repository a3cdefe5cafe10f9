//! History materializer: the display-ready view of the ledger's records.
//!
//! Refreshing is best-effort. A failed fetch is logged and the previously
//! materialized sequence stays in place, so consumers see stale-but-valid
//! data rather than an error.
//!
//! Refreshes may overlap (a user refresh racing the one after a submit).
//! Each takes a generation number when it starts, and a result is only
//! published if no later generation has published already.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use krypt_ledger::{LedgerClient, LedgerError, RawLedgerRecord};
use krypt_types::TransactionRecord;
use krypt_wallet_core::SessionManager;
use tokio::sync::watch;

use crate::binding;

pub type Records = Arc<Vec<TransactionRecord>>;

pub struct HistoryMaterializer {
    ledger: LedgerClient,
    session: Arc<SessionManager>,
    records: watch::Sender<Records>,
    refreshes: AtomicU64,
    published: AtomicU64,
}

impl HistoryMaterializer {
    pub fn new(ledger: LedgerClient, session: Arc<SessionManager>) -> Self {
        let (records, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            ledger,
            session,
            records,
            refreshes: AtomicU64::new(0),
            published: AtomicU64::new(0),
        }
    }

    /// The current materialized sequence.
    pub fn records(&self) -> Records {
        self.records.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Records> {
        self.records.subscribe()
    }

    /// Number of refreshes attempted so far.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    /// Re-read every ledger record and replace the materialized sequence.
    ///
    /// Never fails; on error the previous sequence is returned unchanged.
    /// A result overtaken by a refresh that started later is discarded and
    /// the newer sequence is returned instead.
    pub async fn refresh(&self) -> Records {
        let generation = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        match self.fetch().await {
            Ok(raw) => {
                let records: Records = Arc::new(raw.into_iter().filter_map(normalize).collect());
                let published = self.records.send_if_modified(|current| {
                    if generation <= self.published.load(Ordering::SeqCst) {
                        return false;
                    }
                    self.published.store(generation, Ordering::SeqCst);
                    *current = records.clone();
                    true
                });
                if !published {
                    tracing::debug!(generation, "discarding history overtaken by a later refresh");
                    return self.records();
                }
                tracing::debug!(records = records.len(), "history refreshed");
                records
            }
            Err(e) => {
                tracing::warn!("history refresh failed, keeping previous records: {e}");
                self.records()
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<RawLedgerRecord>, LedgerError> {
        binding::bind(&self.ledger, &self.session)
            .await?
            .fetch_all_transfers()
            .await
    }
}

/// Convert a raw ledger record for display: epoch seconds become a UTC
/// instant. Records whose timestamp is outside the representable range are
/// dropped.
pub fn normalize(raw: RawLedgerRecord) -> Option<TransactionRecord> {
    let Some(timestamp) = raw.timestamp.to_utc() else {
        tracing::warn!(sender = %raw.sender, secs = raw.timestamp.as_secs(), "skipping record with unrepresentable timestamp");
        return None;
    };
    Some(TransactionRecord {
        sender: raw.sender,
        receiver: raw.receiver,
        timestamp,
        message: raw.message,
        keyword: raw.keyword,
        amount: raw.amount,
    })
}
