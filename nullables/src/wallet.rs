//! Nullable wallet: an in-memory EIP-1193 provider fronting a simulated
//! ledger contract.
//!
//! Contract calls are decoded and answered with the real ABI codec, so the
//! client under test exercises the same encoding paths it would against a
//! live chain. Every request is logged for assertions such as "no network
//! call was made".

use async_trait::async_trait;
use krypt_ledger::abi::{self, keccak256};
use krypt_ledger::{LedgerInterface, RawLedgerRecord, TransactionReceipt};
use krypt_types::{Address, LedgerUnits, TxHash};
use krypt_wallet_core::{CallRequest, TransactionRequest, WalletError, WalletProvider};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::NullClock;

const INVALID_PARAMS: i64 = -32602;
const GENESIS_SECS: u64 = 1_700_000_000;

/// A plain value transfer the wallet has executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTransfer {
    pub hash: TxHash,
    pub from: Address,
    pub to: Address,
    pub value: LedgerUnits,
}

/// A sent transaction waiting to be mined.
struct Queued {
    hash: TxHash,
    record: Option<RawLedgerRecord>,
    reverts: bool,
}

#[derive(Default)]
struct State {
    accounts: Vec<Address>,
    authorized: bool,
    reject_connect: bool,
    fail_native: bool,
    fail_ledger_write: bool,
    revert_ledger: bool,
    hold_receipts: bool,
    fail_reads: bool,
    records: Vec<RawLedgerRecord>,
    native: Vec<NativeTransfer>,
    queued: Vec<Queued>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    calls: Vec<String>,
    nonce: u64,
    block: u64,
}

pub struct NullWallet {
    contract: Address,
    interface: LedgerInterface,
    clock: Arc<NullClock>,
    state: Mutex<State>,
}

impl NullWallet {
    /// A wallet holding `accounts` (first is the active one), not yet
    /// authorized for this client.
    pub fn new(contract: Address, accounts: Vec<Address>) -> Self {
        Self {
            contract,
            interface: LedgerInterface::default(),
            clock: Arc::new(NullClock::new(GENESIS_SECS)),
            state: Mutex::new(State {
                accounts,
                ..State::default()
            }),
        }
    }

    /// Pre-authorize the accounts, as after a connect in an earlier session.
    pub fn authorized(self) -> Self {
        self.state.lock().unwrap().authorized = true;
        self
    }

    /// Seed the contract with existing records.
    pub fn with_records(self, records: Vec<RawLedgerRecord>) -> Self {
        self.state.lock().unwrap().records = records;
        self
    }

    /// The clock stamping ledger records.
    pub fn clock(&self) -> &NullClock {
        &self.clock
    }

    // ── Controls ────────────────────────────────────────────────────────

    /// The user declines the next and all further authorization prompts.
    pub fn reject_connect(&self) {
        self.state.lock().unwrap().reject_connect = true;
    }

    pub fn fail_native_transfers(&self) {
        self.state.lock().unwrap().fail_native = true;
    }

    /// The user declines signing the ledger write.
    pub fn fail_ledger_writes(&self) {
        self.state.lock().unwrap().fail_ledger_write = true;
    }

    /// Ledger writes are mined with a failed status.
    pub fn revert_ledger_writes(&self) {
        self.state.lock().unwrap().revert_ledger = true;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    /// Stop mining: sent transactions stay without a receipt until
    /// [`release`](Self::release).
    pub fn hold_receipts(&self) {
        self.state.lock().unwrap().hold_receipts = true;
    }

    /// Mine everything queued and resume mining on send.
    pub fn release(&self) {
        let mut state = self.state.lock().unwrap();
        state.hold_receipts = false;
        let queued = std::mem::take(&mut state.queued);
        for q in queued {
            Self::mine(&mut state, q);
        }
    }

    /// The user revokes this client's authorization in the wallet.
    pub fn revoke(&self) {
        self.state.lock().unwrap().authorized = false;
    }

    /// Replace the wallet's account list (an account switch when the first
    /// entry changes).
    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    // ── Observations ────────────────────────────────────────────────────

    /// Methods requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Number of requests made for `method`.
    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|m| *m == method)
            .count()
    }

    /// The contract's record list.
    pub fn records(&self) -> Vec<RawLedgerRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn native_transfers(&self) -> Vec<NativeTransfer> {
        self.state.lock().unwrap().native.clone()
    }

    // ── Simulation ──────────────────────────────────────────────────────

    fn next_hash(state: &mut State) -> TxHash {
        state.nonce += 1;
        TxHash::new(keccak256(&state.nonce.to_be_bytes()))
    }

    fn mine(state: &mut State, queued: Queued) {
        state.block += 1;
        let status = !queued.reverts;
        if let (true, Some(record)) = (status, queued.record) {
            state.records.push(record);
        }
        state.receipts.insert(
            queued.hash,
            TransactionReceipt {
                transaction_hash: queued.hash,
                block_number: state.block,
                status,
                gas_used: 21_000,
            },
        );
    }

    fn authorized_accounts(state: &State) -> Value {
        if !state.authorized {
            return json!([]);
        }
        json!(state
            .accounts
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>())
    }

    fn send_transaction(&self, state: &mut State, params: Value) -> Result<Value, WalletError> {
        let tx: TransactionRequest = parse_param(params)?;
        if !state.authorized || !state.accounts.contains(&tx.from) {
            return Err(WalletError::Rpc {
                code: 4100,
                message: format!("{} is not authorized", tx.from),
            });
        }

        let hash = Self::next_hash(state);
        let mut reverts = false;
        let record = match tx.data.as_deref() {
            Some(data) if tx.to == self.contract => {
                if state.fail_ledger_write {
                    return Err(WalletError::user_rejected("User denied transaction signature."));
                }
                // Undecodable calldata is accepted and then reverts on chain.
                let call = abi::decode_add_to_blockchain(self.interface.add_to_blockchain, data);
                reverts = state.revert_ledger || call.is_err();
                match call {
                    Ok(call) => Some(RawLedgerRecord {
                        sender: tx.from,
                        receiver: call.receiver,
                        amount: call.amount,
                        message: call.message,
                        timestamp: self.clock.now(),
                        keyword: call.keyword,
                    }),
                    Err(e) => {
                        tracing::debug!("null wallet: undecodable contract call: {e}");
                        None
                    }
                }
            }
            _ => {
                if state.fail_native {
                    return Err(WalletError::user_rejected("User denied transaction signature."));
                }
                state.native.push(NativeTransfer {
                    hash,
                    from: tx.from,
                    to: tx.to,
                    value: tx.value.unwrap_or(LedgerUnits::ZERO),
                });
                None
            }
        };

        let queued = Queued {
            hash,
            record,
            reverts,
        };
        if state.hold_receipts {
            state.queued.push(queued);
        } else {
            Self::mine(state, queued);
        }
        Ok(json!(hash))
    }

    fn call(&self, state: &State, params: Value) -> Result<Value, WalletError> {
        if state.fail_reads {
            return Err(WalletError::Rpc {
                code: -32000,
                message: "execution reverted".into(),
            });
        }
        let call: CallRequest = parse_param(params)?;
        if call.to != self.contract {
            return Ok(json!("0x"));
        }
        let out = if call.data == self.interface.get_all_transactions {
            abi::encode_transfer_list(&state.records)
        } else if call.data == self.interface.get_transaction_count {
            abi::encode_uint(state.records.len() as u128)
        } else {
            return Err(WalletError::Rpc {
                code: -32000,
                message: "execution reverted: unknown selector".into(),
            });
        };
        Ok(json!(format!("0x{}", hex::encode(out))))
    }

    fn receipt(&self, state: &State, params: Value) -> Result<Value, WalletError> {
        let hash: TxHash = parse_param(params)?;
        Ok(state
            .receipts
            .get(&hash)
            .map(|r| json!(r))
            .unwrap_or(Value::Null))
    }
}

#[async_trait]
impl WalletProvider for NullWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());

        match method {
            "eth_accounts" => Ok(Self::authorized_accounts(&state)),
            "eth_requestAccounts" => {
                if state.reject_connect {
                    return Err(WalletError::user_rejected("User rejected the request."));
                }
                state.authorized = true;
                Ok(Self::authorized_accounts(&state))
            }
            "eth_sendTransaction" => self.send_transaction(&mut state, params),
            "eth_call" => self.call(&state, params),
            "eth_getTransactionReceipt" => self.receipt(&state, params),
            other => Err(WalletError::Rpc {
                code: WalletError::METHOD_NOT_FOUND,
                message: format!("the method {other} does not exist"),
            }),
        }
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Deserialize the first positional parameter.
fn parse_param<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, WalletError> {
    let first = params.get(0).cloned().unwrap_or(Value::Null);
    serde_json::from_value(first).map_err(|e| WalletError::Rpc {
        code: INVALID_PARAMS,
        message: format!("invalid params: {e}"),
    })
}
