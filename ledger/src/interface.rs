//! Ledger interface descriptor.
//!
//! The contract is addressed through three function selectors. They are
//! derived from the canonical signatures, optionally checked against a JSON
//! ABI descriptor (a bare ABI array or a build artifact with an `abi` field)
//! supplied at configuration time.

use serde::Deserialize;
use thiserror::Error;

use crate::abi::selector;

pub const ADD_TO_BLOCKCHAIN: &str = "addToBlockchain(address,uint256,string,string)";
pub const GET_ALL_TRANSACTIONS: &str = "getAllTransactions()";
pub const GET_TRANSACTION_COUNT: &str = "getTransactionCount()";

const TRANSFER_LIST: &str = "(address,address,uint256,string,uint256,string)[]";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterfaceError {
    #[error("invalid ABI descriptor: {0}")]
    Malformed(String),

    #[error("ABI descriptor has no function {0}")]
    MissingFunction(&'static str),

    #[error("function {name} has signature {found}, expected {expected}")]
    Mismatch {
        name: &'static str,
        expected: String,
        found: String,
    },
}

/// Selectors for the three ledger calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerInterface {
    pub add_to_blockchain: [u8; 4],
    pub get_all_transactions: [u8; 4],
    pub get_transaction_count: [u8; 4],
}

impl Default for LedgerInterface {
    fn default() -> Self {
        Self {
            add_to_blockchain: selector(ADD_TO_BLOCKCHAIN),
            get_all_transactions: selector(GET_ALL_TRANSACTIONS),
            get_transaction_count: selector(GET_TRANSACTION_COUNT),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Descriptor {
    Bare(Vec<AbiEntry>),
    Artifact { abi: Vec<AbiEntry> },
}

#[derive(Deserialize)]
struct AbiEntry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
    #[serde(default)]
    outputs: Vec<AbiParam>,
}

#[derive(Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    components: Vec<AbiParam>,
}

impl AbiParam {
    /// Canonical type string, expanding tuples (`tuple[]` -> `(...)[]`).
    fn canonical(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => format!("({}){suffix}", canonical_list(&self.components)),
            None => self.kind.clone(),
        }
    }
}

fn canonical_list(params: &[AbiParam]) -> String {
    params
        .iter()
        .map(AbiParam::canonical)
        .collect::<Vec<_>>()
        .join(",")
}

impl LedgerInterface {
    /// Verify a JSON ABI descriptor and derive the selectors from it.
    pub fn from_abi_json(json: &str) -> Result<Self, InterfaceError> {
        let entries = match serde_json::from_str::<Descriptor>(json)
            .map_err(|e| InterfaceError::Malformed(e.to_string()))?
        {
            Descriptor::Bare(entries) => entries,
            Descriptor::Artifact { abi } => abi,
        };

        let function = |name: &'static str| {
            entries
                .iter()
                .find(|e| e.kind == "function" && e.name == name)
                .ok_or(InterfaceError::MissingFunction(name))
        };

        let add = function("addToBlockchain")?;
        let all = function("getAllTransactions")?;
        let count = function("getTransactionCount")?;

        let add_sig = expect(add, "addToBlockchain", ADD_TO_BLOCKCHAIN, "")?;
        let all_sig = expect(all, "getAllTransactions", GET_ALL_TRANSACTIONS, TRANSFER_LIST)?;
        let count_sig = expect(count, "getTransactionCount", GET_TRANSACTION_COUNT, "uint256")?;

        Ok(Self {
            add_to_blockchain: selector(&add_sig),
            get_all_transactions: selector(&all_sig),
            get_transaction_count: selector(&count_sig),
        })
    }
}

/// Check an entry's inputs (and outputs, when `outputs` is non-empty)
/// against the expected shape; returns the canonical signature.
fn expect(
    entry: &AbiEntry,
    name: &'static str,
    signature: &str,
    outputs: &str,
) -> Result<String, InterfaceError> {
    let found = format!("{}({})", entry.name, canonical_list(&entry.inputs));
    if found != signature {
        return Err(InterfaceError::Mismatch {
            name,
            expected: signature.to_string(),
            found,
        });
    }

    if !outputs.is_empty() {
        let found_outputs = canonical_list(&entry.outputs);
        if found_outputs != outputs {
            return Err(InterfaceError::Mismatch {
                name,
                expected: format!("{signature} returns ({outputs})"),
                found: format!("{found} returns ({found_outputs})"),
            });
        }
    }
    Ok(found)
}
