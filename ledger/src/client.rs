//! Ledger contract client.
//!
//! A [`LedgerClient`] knows where the contract lives and which wallet to use.
//! Every operation starts by binding a [`LedgerHandle`] to the wallet's
//! current signer, so an account switch in the wallet is picked up on the
//! next call.

use krypt_types::{Address, LedgerUnits, TxHash};
use krypt_wallet_core::{CallRequest, TransactionReceipt, TransactionRequest, WalletCapability};
use std::time::Duration;
use tokio::time::Instant;

use crate::abi;
use crate::error::LedgerError;
use crate::interface::LedgerInterface;
use crate::record::RawLedgerRecord;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Deployment coordinates of the ledger contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerContract {
    pub address: Address,
    pub interface: LedgerInterface,
}

impl LedgerContract {
    pub fn new(address: Address, interface: LedgerInterface) -> Self {
        Self { address, interface }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerClient {
    capability: Option<WalletCapability>,
    contract: LedgerContract,
    poll_interval: Duration,
}

impl LedgerClient {
    pub fn new(capability: Option<WalletCapability>, contract: LedgerContract) -> Self {
        Self {
            capability,
            contract,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Interval between receipt polls while awaiting settlement.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Resolve the wallet's current signer and bind the contract to it.
    pub async fn bind(&self) -> Result<LedgerHandle, LedgerError> {
        let wallet = self
            .capability
            .clone()
            .ok_or(LedgerError::NoWalletCapability)?;

        let accounts = wallet
            .accounts()
            .await
            .map_err(|e| LedgerError::SignerUnavailable(e.to_string()))?;
        let signer = accounts
            .first()
            .copied()
            .ok_or(LedgerError::NoAuthorizedAccount)?;

        tracing::debug!(signer = %signer, contract = %self.contract.address, "ledger bound");
        Ok(LedgerHandle {
            wallet,
            signer,
            contract: self.contract,
            poll_interval: self.poll_interval,
        })
    }
}

/// The ledger contract bound to one signer.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    wallet: WalletCapability,
    signer: Address,
    contract: LedgerContract,
    poll_interval: Duration,
}

impl LedgerHandle {
    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn wallet(&self) -> &WalletCapability {
        &self.wallet
    }

    /// Submit `addToBlockchain`; the returned handle awaits its settlement.
    pub async fn record_transfer(
        &self,
        receiver: Address,
        amount: LedgerUnits,
        message: &str,
        keyword: &str,
    ) -> Result<PendingTransfer, LedgerError> {
        let data = abi::encode_add_to_blockchain(
            self.contract.interface.add_to_blockchain,
            &receiver,
            amount,
            message,
            keyword,
        );
        let tx = TransactionRequest::contract_call(self.signer, self.contract.address, data);
        let hash = self
            .wallet
            .send_transaction(&tx)
            .await
            .map_err(LedgerError::CallFailed)?;

        tracing::info!(tx = %hash, receiver = %receiver, amount = %amount, "ledger write submitted");
        Ok(PendingTransfer {
            hash,
            wallet: self.wallet.clone(),
            poll_interval: self.poll_interval,
        })
    }

    /// Every transfer ever recorded, in ledger order.
    pub async fn fetch_all_transfers(&self) -> Result<Vec<RawLedgerRecord>, LedgerError> {
        let data = self.read(self.contract.interface.get_all_transactions).await?;
        Ok(abi::decode_transfer_list(&data)?)
    }

    /// Number of transfers recorded.
    pub async fn fetch_transfer_count(&self) -> Result<u64, LedgerError> {
        let data = self.read(self.contract.interface.get_transaction_count).await?;
        Ok(abi::decode_uint64(&data)?)
    }

    async fn read(&self, selector: [u8; 4]) -> Result<Vec<u8>, LedgerError> {
        let call = CallRequest {
            from: Some(self.signer),
            to: self.contract.address,
            data: selector.to_vec(),
        };
        self.wallet.call(&call).await.map_err(LedgerError::ReadFailed)
    }
}

/// A submitted ledger write awaiting inclusion.
#[derive(Debug)]
pub struct PendingTransfer {
    hash: TxHash,
    wallet: WalletCapability,
    poll_interval: Duration,
}

impl PendingTransfer {
    pub fn hash(&self) -> TxHash {
        self.hash
    }

    /// Poll for the receipt until the write is mined or `timeout` elapses.
    pub async fn confirmed(self, timeout: Duration) -> Result<TransactionReceipt, LedgerError> {
        let started = Instant::now();
        match tokio::time::timeout(timeout, self.poll()).await {
            Ok(result) => result,
            Err(_) => {
                let waited = started.elapsed();
                tracing::warn!(tx = %self.hash, ?waited, "ledger write not confirmed in time");
                Err(LedgerError::Timeout {
                    tx: self.hash,
                    waited,
                })
            }
        }
    }

    async fn poll(&self) -> Result<TransactionReceipt, LedgerError> {
        loop {
            match self
                .wallet
                .transaction_receipt(self.hash)
                .await
                .map_err(LedgerError::CallFailed)?
            {
                Some(receipt) if receipt.status => {
                    tracing::debug!(tx = %self.hash, block = receipt.block_number, "ledger write mined");
                    return Ok(receipt);
                }
                Some(_) => return Err(LedgerError::Reverted { tx: self.hash }),
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}
