//! Integration tests exercising the full client:
//! session probe → two-phase submission → ledger write → count and history.
//!
//! The wallet and the ledger contract behind it are simulated by
//! `NullWallet`, which answers with real ABI payloads, so these tests cover
//! the same encode/decode paths a live chain would.

use std::sync::Arc;
use std::time::Duration;

use krypt_ledger::RawLedgerRecord;
use krypt_node::{ClientConfig, KryptClient, ShutdownController};
use krypt_nullables::{NullHintStore, NullWallet};
use krypt_types::{
    Address, KryptError, LedgerUnits, SessionState, Timestamp, TransactionDraft,
};
use krypt_wallet_core::WalletProvider;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn addr(byte: u8) -> Address {
    Address::new([byte; 20])
}

fn account_a() -> Address {
    addr(0xaa)
}

fn account_b() -> Address {
    addr(0xbb)
}

fn contract() -> Address {
    addr(0xcc)
}

fn config() -> ClientConfig {
    ClientConfig {
        contract_address: Some(contract()),
        confirmation_timeout_secs: 1,
        receipt_poll_interval_ms: 10,
        ..ClientConfig::default()
    }
}

struct Harness {
    wallet: Arc<NullWallet>,
    hints: Arc<NullHintStore>,
    client: Arc<KryptClient>,
}

fn harness_with(wallet: NullWallet, hints: NullHintStore) -> Harness {
    let wallet = Arc::new(wallet);
    let hints = Arc::new(hints);
    let client = KryptClient::new(
        config(),
        Some(wallet.clone() as Arc<dyn WalletProvider>),
        hints.clone(),
    )
    .expect("client");
    Harness {
        wallet,
        hints,
        client: Arc::new(client),
    }
}

/// A started client whose wallet already authorized account A.
async fn connected(wallet: NullWallet) -> Harness {
    let h = harness_with(wallet.authorized(), NullHintStore::new());
    assert_eq!(h.client.start().await, SessionState::Connected(account_a()));
    h
}

fn wallet() -> NullWallet {
    NullWallet::new(contract(), vec![account_a()])
}

fn draft() -> TransactionDraft {
    TransactionDraft::new(account_b().to_string(), "0.01", "gift", "hi")
}

fn seeded_record(keyword: &str) -> RawLedgerRecord {
    RawLedgerRecord {
        sender: addr(0x11),
        receiver: addr(0x22),
        amount: LedgerUnits::new(1),
        message: "earlier".into(),
        timestamp: Timestamp::new(1_600_000_000),
        keyword: keyword.into(),
    }
}

// ---------------------------------------------------------------------------
// 1. Submission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn end_to_end_submit_records_transfer() {
    let h = connected(wallet().with_records(vec![seeded_record("a"), seeded_record("b")])).await;
    let n = h.client.submission_state().count;
    assert_eq!(n, 2);
    assert_eq!(h.client.records().len(), 2);

    h.wallet.clock().advance(60);
    let receipt = h.client.submit(&draft()).await.expect("submit");
    assert_eq!(receipt.count, n + 1);
    assert!(receipt.ledger_receipt.status);

    let state = h.client.submission_state();
    assert_eq!(state.count, n + 1);
    assert!(!state.pending);

    let records = h.client.records();
    let last = records.last().expect("new record");
    assert_eq!(last.sender, account_a());
    assert_eq!(last.receiver, account_b());
    assert_eq!(last.amount.to_string(), "0.01");
    assert_eq!(last.keyword, "gift");
    assert_eq!(last.message, "hi");
    assert_eq!(last.timestamp_display(), "2023-11-14 22:14:20 UTC");

    let native = h.wallet.native_transfers();
    assert_eq!(native.len(), 1);
    assert_eq!(native[0].hash, receipt.native_tx);
    assert_eq!(native[0].to, account_b());
    assert_eq!(native[0].value, LedgerUnits::new(10_000_000_000_000_000));

    assert_eq!(h.hints.count(), Some(n + 1));
}

#[tokio::test]
async fn successful_submit_refreshes_history_exactly_once() {
    let h = connected(wallet()).await;
    let before = h.client.history().refresh_count();
    h.client.submit(&draft()).await.unwrap();
    assert_eq!(h.client.history().refresh_count(), before + 1);
}

#[tokio::test]
async fn submit_while_pending_is_rejected_without_calls() {
    let h = connected(wallet()).await;
    h.wallet.hold_receipts();

    let client = h.client.clone();
    let first = tokio::spawn(async move { client.submit(&draft()).await });

    let mut submission = h.client.subscribe_submission();
    submission.wait_for(|s| s.pending).await.unwrap();

    h.wallet.clear_calls();
    let second = h.client.submit(&draft()).await;
    assert!(matches!(second, Err(KryptError::SubmissionInProgress)));
    assert!(h.wallet.calls().is_empty());

    h.wallet.release();
    let receipt = first.await.unwrap().expect("first submit completes");
    assert_eq!(receipt.count, 1);
    assert!(!h.client.submission_state().pending);
}

#[tokio::test]
async fn reverted_ledger_write_reports_native_transfer() {
    let h = connected(wallet()).await;
    h.wallet.revert_ledger_writes();

    let err = h.client.submit(&draft()).await.unwrap_err();
    let native = h.wallet.native_transfers()[0].hash;
    match &err {
        KryptError::LedgerCallFailed { native_tx, .. } => assert_eq!(*native_tx, Some(native)),
        other => panic!("expected LedgerCallFailed, got {other:?}"),
    }
    assert!(err.value_moved_without_record());

    let state = h.client.submission_state();
    assert!(!state.pending);
    assert_eq!(state.count, 0);
    assert!(h.wallet.records().is_empty());
    assert_eq!(h.hints.count(), Some(0));
}

#[tokio::test]
async fn declined_ledger_signature_is_ledger_call_failure() {
    let h = connected(wallet()).await;
    h.wallet.fail_ledger_writes();

    let err = h.client.submit(&draft()).await.unwrap_err();
    assert!(matches!(
        err,
        KryptError::LedgerCallFailed {
            native_tx: Some(_),
            ..
        }
    ));
    assert!(!h.client.submission_state().pending);
}

#[tokio::test]
async fn native_transfer_failure_never_raises_pending() {
    let h = connected(wallet()).await;
    h.wallet.fail_native_transfers();
    let mut submission = h.client.subscribe_submission();
    submission.borrow_and_update();

    let err = h.client.submit(&draft()).await.unwrap_err();
    assert!(matches!(err, KryptError::NativeTransferFailed(_)));
    assert!(!submission.has_changed().unwrap());
    assert!(h.wallet.records().is_empty());
}

#[tokio::test]
async fn unconfirmed_ledger_write_times_out() {
    let h = connected(wallet()).await;
    h.wallet.hold_receipts();

    let err = h.client.submit(&draft()).await.unwrap_err();
    match &err {
        KryptError::LedgerCallTimeout {
            waited_secs,
            native_tx,
            ..
        } => {
            assert_eq!(*waited_secs, 1);
            assert!(native_tx.is_some());
        }
        other => panic!("expected LedgerCallTimeout, got {other:?}"),
    }
    assert!(!h.client.submission_state().pending);

    // The write may still land after the client gave up waiting.
    h.wallet.release();
    assert_eq!(h.client.refresh().await.len(), 1);
}

#[tokio::test]
async fn cancelled_submit_clears_pending() {
    let h = connected(wallet()).await;
    h.wallet.hold_receipts();

    let client = h.client.clone();
    let task = tokio::spawn(async move { client.submit(&draft()).await });
    h.client
        .subscribe_submission()
        .wait_for(|s| s.pending)
        .await
        .unwrap();

    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    assert!(!h.client.submission_state().pending);

    h.wallet.release();
    h.client.submit(&draft()).await.expect("next submit is accepted");
}

#[tokio::test]
async fn invalid_amounts_are_rejected_before_any_call() {
    let h = connected(wallet()).await;
    for amount in ["abc", "-1", "0.0000000000000000001", ""] {
        h.wallet.clear_calls();
        let mut bad = draft();
        bad.amount = amount.into();
        let err = h.client.submit(&bad).await.unwrap_err();
        assert!(matches!(err, KryptError::InvalidAmount(_)), "{amount}: {err}");
        assert!(h.wallet.calls().is_empty(), "{amount} made calls");
    }
}

#[tokio::test]
async fn invalid_recipient_is_rejected_before_any_call() {
    let h = connected(wallet()).await;
    h.wallet.clear_calls();
    let mut bad = draft();
    bad.recipient = "0xB".into();
    assert!(matches!(
        h.client.submit(&bad).await,
        Err(KryptError::InvalidRecipient(_))
    ));
    assert!(h.wallet.calls().is_empty());
}

#[tokio::test]
async fn submit_requires_connected_session() {
    let h = harness_with(wallet(), NullHintStore::new());
    assert_eq!(h.client.start().await, SessionState::Disconnected);
    assert!(matches!(
        h.client.submit(&draft()).await,
        Err(KryptError::NotConnected)
    ));
}

#[tokio::test]
async fn switched_wallet_account_signs_and_is_adopted() {
    let h = connected(NullWallet::new(contract(), vec![account_a(), addr(0xdd)])).await;
    h.wallet.set_accounts(vec![addr(0xdd), account_a()]);

    h.client.submit(&draft()).await.unwrap();
    assert_eq!(h.wallet.records()[0].sender, addr(0xdd));
    assert_eq!(h.wallet.native_transfers()[0].from, addr(0xdd));
    assert_eq!(h.client.session_state(), SessionState::Connected(addr(0xdd)));
}

#[tokio::test]
async fn hint_write_failure_does_not_fail_submit() {
    let h = connected(wallet()).await;
    h.hints.fail_writes();
    let receipt = h.client.submit(&draft()).await.unwrap();
    assert_eq!(receipt.count, 1);
}

#[tokio::test]
async fn failed_count_read_after_confirmed_write_keeps_count() {
    let h = connected(wallet()).await;
    assert_eq!(h.hints.count(), Some(0));
    h.wallet.hold_receipts();

    let client = h.client.clone();
    let submit = tokio::spawn(async move { client.submit(&draft()).await });
    h.client
        .subscribe_submission()
        .wait_for(|s| s.pending)
        .await
        .unwrap();

    h.wallet.fail_reads(true);
    h.wallet.release();

    let receipt = submit.await.unwrap().expect("confirmed write succeeds");
    assert!(receipt.ledger_receipt.status);
    assert_eq!(receipt.count, 0);
    assert_eq!(h.client.submission_state().count, 0);
    assert!(!h.client.submission_state().pending);
    assert_eq!(h.hints.count(), Some(0));
    assert_eq!(h.wallet.records().len(), 1);
}

#[tokio::test]
async fn submit_after_revocation_clears_session() {
    let h = connected(wallet()).await;
    h.wallet.revoke();

    let err = h.client.submit(&draft()).await.unwrap_err();
    assert!(matches!(err, KryptError::SignerUnavailable(_)));
    assert!(!err.value_moved_without_record());
    assert_eq!(h.client.session_state(), SessionState::Disconnected);
    assert!(h.wallet.native_transfers().is_empty());
}

// ---------------------------------------------------------------------------
// 2. Session and history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_of_empty_ledger_is_empty() {
    let h = connected(wallet()).await;
    assert!(h.client.refresh().await.is_empty());
}

#[tokio::test]
async fn refresh_without_session_makes_no_ledger_call() {
    let h = harness_with(wallet().with_records(vec![seeded_record("x")]), NullHintStore::new());
    h.client.start().await;
    assert!(h.client.refresh().await.is_empty());
    assert_eq!(h.wallet.call_count("eth_call"), 0);
}

#[tokio::test]
async fn startup_with_authorized_account_loads_history() {
    let h = connected(wallet().with_records(vec![seeded_record("x")])).await;
    assert_eq!(h.client.records()[0].keyword, "x");
    assert_eq!(h.client.submission_state().count, 1);
}

#[tokio::test]
async fn absent_wallet_is_unavailable() {
    let hints = Arc::new(NullHintStore::new());
    let client = KryptClient::new(config(), None, hints).unwrap();
    assert_eq!(client.start().await, SessionState::Unavailable);
    assert!(matches!(
        client.connect().await,
        Err(KryptError::NoWalletCapability)
    ));
}

#[tokio::test]
async fn hint_seeds_count_until_ledger_answers() {
    let h = harness_with(wallet(), NullHintStore::with_count(5));
    h.client.start().await;
    assert_eq!(h.client.submission_state().count, 5);

    h.client.connect().await.unwrap();
    assert_eq!(h.client.submission_state().count, 0);
    assert_eq!(h.hints.count(), Some(0));
}

#[tokio::test]
async fn connect_adopts_account_and_loads_history() {
    let h = harness_with(wallet().with_records(vec![seeded_record("x")]), NullHintStore::new());
    assert_eq!(h.client.start().await, SessionState::Disconnected);
    assert!(h.client.records().is_empty());

    assert_eq!(h.client.connect().await.unwrap(), account_a());
    assert_eq!(h.client.session().account_address, Some(account_a()));
    assert_eq!(h.client.records().len(), 1);
}

#[tokio::test]
async fn rejected_connect_is_surfaced() {
    let h = harness_with(wallet(), NullHintStore::new());
    h.client.start().await;
    h.wallet.reject_connect();
    assert!(matches!(
        h.client.connect().await,
        Err(KryptError::WalletConnectionFailed(_))
    ));
    assert_eq!(h.client.session_state(), SessionState::Disconnected);
}

#[tokio::test]
async fn refresh_after_revocation_clears_session() {
    let h = connected(wallet().with_records(vec![seeded_record("x")])).await;
    h.wallet.revoke();

    assert_eq!(h.client.refresh().await.len(), 1);
    assert_eq!(h.client.session_state(), SessionState::Disconnected);
    assert!(!h.client.session().connected);
}

#[tokio::test]
async fn sync_session_reflects_revocation() {
    let h = connected(wallet()).await;
    h.wallet.revoke();
    assert_eq!(h.client.sync_session().await, SessionState::Disconnected);
    assert!(!h.client.session().connected);
}

#[tokio::test]
async fn session_watch_observes_revocation_until_shutdown() {
    let h = connected(wallet()).await;
    let shutdown = ShutdownController::new();

    let client = h.client.clone();
    let signal = shutdown.subscribe();
    let watcher =
        tokio::spawn(async move { client.watch_session(Duration::from_millis(10), signal).await });

    h.wallet.revoke();
    tokio::time::timeout(
        Duration::from_secs(2),
        h.client
            .subscribe_session()
            .wait_for(|s| *s == SessionState::Disconnected),
    )
    .await
    .expect("revocation observed")
    .unwrap();

    shutdown.shutdown();
    watcher.await.unwrap();
}

#[tokio::test]
async fn production_client_without_rpc_url_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        hint_file: dir.path().join("hint.json"),
        ..config()
    };
    let client = KryptClient::from_config(config).unwrap();
    assert_eq!(client.start().await, SessionState::Unavailable);
    assert_eq!(client.submission_state().count, 0);
}
