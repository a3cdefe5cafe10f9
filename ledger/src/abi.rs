//! Solidity ABI codec for the ledger contract's three calls.
//!
//! Only the shapes the ledger uses are supported:
//! - calldata `addToBlockchain(address,uint256,string,string)`
//! - return `uint256`
//! - return `(address,address,uint256,string,uint256,string)[]`
//!
//! Integers wider than the Rust target type are rejected, never truncated.

use krypt_types::{Address, LedgerUnits, Timestamp};
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::record::RawLedgerRecord;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// Head words per encoded transfer tuple.
const TRANSFER_HEAD_WORDS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("payload truncated: need {needed} bytes at offset {offset}, have {len}")]
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },

    #[error("integer does not fit in {bits} bits")]
    Overflow { bits: u32 },

    #[error("address word has non-zero padding")]
    BadAddress,

    #[error("string is not valid UTF-8")]
    Utf8,

    #[error("calldata selector {found} does not match {expected}")]
    Selector { expected: String, found: String },
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Four-byte function selector for a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

// ── Encoding ────────────────────────────────────────────────────────────

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Length word followed by the bytes, right-padded to a word boundary.
fn string_tail(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&uint_word(bytes.len() as u128));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}

/// Calldata for `addToBlockchain(receiver, amount, message, keyword)`.
pub fn encode_add_to_blockchain(
    selector: [u8; 4],
    receiver: &Address,
    amount: LedgerUnits,
    message: &str,
    keyword: &str,
) -> Vec<u8> {
    let message_tail = string_tail(message);
    let keyword_tail = string_tail(keyword);
    let head_len = 4 * WORD;

    let mut out = Vec::with_capacity(4 + head_len + message_tail.len() + keyword_tail.len());
    out.extend_from_slice(&selector);
    out.extend_from_slice(&address_word(receiver));
    out.extend_from_slice(&uint_word(amount.raw()));
    out.extend_from_slice(&uint_word(head_len as u128));
    out.extend_from_slice(&uint_word((head_len + message_tail.len()) as u128));
    out.extend_from_slice(&message_tail);
    out.extend_from_slice(&keyword_tail);
    out
}

/// Return data for a single `uint256`.
pub fn encode_uint(value: u128) -> Vec<u8> {
    uint_word(value).to_vec()
}

fn encode_transfer(record: &RawLedgerRecord) -> Vec<u8> {
    let message_tail = string_tail(&record.message);
    let keyword_tail = string_tail(&record.keyword);
    let head_len = TRANSFER_HEAD_WORDS * WORD;

    let mut out = Vec::with_capacity(head_len + message_tail.len() + keyword_tail.len());
    out.extend_from_slice(&address_word(&record.sender));
    out.extend_from_slice(&address_word(&record.receiver));
    out.extend_from_slice(&uint_word(record.amount.raw()));
    out.extend_from_slice(&uint_word(head_len as u128));
    out.extend_from_slice(&uint_word(u128::from(record.timestamp.as_secs())));
    out.extend_from_slice(&uint_word((head_len + message_tail.len()) as u128));
    out.extend_from_slice(&message_tail);
    out.extend_from_slice(&keyword_tail);
    out
}

/// Return data for `getAllTransactions()`.
pub fn encode_transfer_list(records: &[RawLedgerRecord]) -> Vec<u8> {
    let tuples: Vec<Vec<u8>> = records.iter().map(encode_transfer).collect();

    let mut out = Vec::new();
    out.extend_from_slice(&uint_word(WORD as u128));
    out.extend_from_slice(&uint_word(records.len() as u128));

    // Tuple offsets are relative to the start of the offset table.
    let mut offset = records.len() * WORD;
    for tuple in &tuples {
        out.extend_from_slice(&uint_word(offset as u128));
        offset += tuple.len();
    }
    for tuple in tuples {
        out.extend_from_slice(&tuple);
    }
    out
}

// ── Decoding ────────────────────────────────────────────────────────────

struct Reader<'a> {
    data: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], AbiError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(AbiError::Truncated {
                offset,
                needed: len,
                len: self.data.len(),
            })
    }

    fn word(&self, offset: usize) -> Result<&'a [u8], AbiError> {
        self.bytes(offset, WORD)
    }

    fn uint128(&self, offset: usize) -> Result<u128, AbiError> {
        let word = self.word(offset)?;
        if word[..16].iter().any(|&b| b != 0) {
            return Err(AbiError::Overflow { bits: 128 });
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(low))
    }

    fn uint64(&self, offset: usize) -> Result<u64, AbiError> {
        u64::try_from(self.uint128(offset)?).map_err(|_| AbiError::Overflow { bits: 64 })
    }

    fn usize(&self, offset: usize) -> Result<usize, AbiError> {
        usize::try_from(self.uint64(offset)?).map_err(|_| AbiError::Overflow {
            bits: usize::BITS,
        })
    }

    fn address(&self, offset: usize) -> Result<Address, AbiError> {
        let word = self.word(offset)?;
        if word[..12].iter().any(|&b| b != 0) {
            return Err(AbiError::BadAddress);
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address::new(bytes))
    }

    /// A dynamic string whose length word sits at `offset`.
    fn string(&self, offset: usize) -> Result<String, AbiError> {
        let len = self.usize(offset)?;
        let raw = self.bytes(offset + WORD, len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| AbiError::Utf8)
    }
}

/// Decode a single `uint256` return value that must fit a `u64`.
pub fn decode_uint64(data: &[u8]) -> Result<u64, AbiError> {
    Reader::new(data).uint64(0)
}

/// Decode the return data of `getAllTransactions()`.
pub fn decode_transfer_list(data: &[u8]) -> Result<Vec<RawLedgerRecord>, AbiError> {
    let reader = Reader::new(data);
    let array = reader.usize(0)?;
    let count = reader.usize(array)?;
    let table = array + WORD;

    let mut records = Vec::with_capacity(count.min(data.len() / WORD));
    for i in 0..count {
        let tuple = table.saturating_add(reader.usize(table + i * WORD)?);
        records.push(RawLedgerRecord {
            sender: reader.address(tuple)?,
            receiver: reader.address(tuple + WORD)?,
            amount: LedgerUnits::new(reader.uint128(tuple + 2 * WORD)?),
            message: reader.string(tuple.saturating_add(reader.usize(tuple + 3 * WORD)?))?,
            timestamp: Timestamp::new(reader.uint64(tuple + 4 * WORD)?),
            keyword: reader.string(tuple.saturating_add(reader.usize(tuple + 5 * WORD)?))?,
        });
    }
    Ok(records)
}

/// Arguments of an `addToBlockchain` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToBlockchainCall {
    pub receiver: Address,
    pub amount: LedgerUnits,
    pub message: String,
    pub keyword: String,
}

/// Decode `addToBlockchain` calldata, checking its selector.
pub fn decode_add_to_blockchain(
    expected_selector: [u8; 4],
    calldata: &[u8],
) -> Result<AddToBlockchainCall, AbiError> {
    let found = Reader::new(calldata).bytes(0, 4)?;
    if found != expected_selector {
        return Err(AbiError::Selector {
            expected: hex::encode(expected_selector),
            found: hex::encode(found),
        });
    }

    let args = Reader::new(&calldata[4..]);
    Ok(AddToBlockchainCall {
        receiver: args.address(0)?,
        amount: LedgerUnits::new(args.uint128(WORD)?),
        message: args.string(args.usize(2 * WORD)?)?,
        keyword: args.string(args.usize(3 * WORD)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(n: u8, message: &str, keyword: &str) -> RawLedgerRecord {
        RawLedgerRecord {
            sender: Address::new([n; 20]),
            receiver: Address::new([n + 1; 20]),
            amount: LedgerUnits::new(u128::from(n) * 1_000),
            message: message.to_string(),
            timestamp: Timestamp::new(1_700_000_000 + u64::from(n)),
            keyword: keyword.to_string(),
        }
    }

    #[test]
    fn known_selectors() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
    }

    #[test]
    fn add_to_blockchain_layout() {
        let receiver = Address::new([0xbb; 20]);
        let data = encode_add_to_blockchain(
            [1, 2, 3, 4],
            &receiver,
            LedgerUnits::new(5),
            "hi",
            "gift",
        );
        // selector + 4 head words + 2 * (length word + one padded word)
        assert_eq!(data.len(), 4 + 4 * WORD + 4 * WORD);
        assert_eq!(&data[..4], &[1, 2, 3, 4]);
        assert_eq!(&data[4 + 12..4 + WORD], receiver.as_bytes());
        assert_eq!(data[4 + 2 * WORD - 1], 5);
        assert_eq!(data[4 + 3 * WORD - 1], 0x80);
        assert_eq!(data[4 + 4 * WORD - 1], 0xc0);
        assert_eq!(&data[4 + 5 * WORD..4 + 5 * WORD + 2], b"hi");

        let call = decode_add_to_blockchain([1, 2, 3, 4], &data).unwrap();
        assert_eq!(call.receiver, receiver);
        assert_eq!(call.message, "hi");
        assert_eq!(call.keyword, "gift");
    }

    #[test]
    fn wrong_selector_is_rejected() {
        let data = encode_add_to_blockchain([1, 2, 3, 4], &Address::ZERO, LedgerUnits::ZERO, "", "");
        assert!(matches!(
            decode_add_to_blockchain([9, 9, 9, 9], &data),
            Err(AbiError::Selector { .. })
        ));
    }

    #[test]
    fn transfer_list_preserves_order_and_fields() {
        let records = vec![
            record(1, "first", "a"),
            record(2, "a message longer than thirty-two bytes of text", ""),
            record(3, "", "kw"),
        ];
        let decoded = decode_transfer_list(&encode_transfer_list(&records)).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn empty_list_decodes_to_empty() {
        let data = encode_transfer_list(&[]);
        assert_eq!(data.len(), 2 * WORD);
        assert!(decode_transfer_list(&data).unwrap().is_empty());
    }

    #[test]
    fn empty_return_data_is_truncated() {
        assert!(matches!(
            decode_transfer_list(&[]),
            Err(AbiError::Truncated { .. })
        ));
        assert!(decode_uint64(&[]).is_err());
    }

    #[test]
    fn oversized_integers_are_rejected() {
        let mut word = [0u8; WORD];
        word[0] = 1;
        assert_eq!(decode_uint64(&word), Err(AbiError::Overflow { bits: 128 }));

        let word = uint_word(u128::from(u64::MAX) + 1);
        assert_eq!(decode_uint64(&word), Err(AbiError::Overflow { bits: 64 }));
    }

    #[test]
    fn count_decodes() {
        assert_eq!(decode_uint64(&encode_uint(42)).unwrap(), 42);
    }

    #[test]
    fn bogus_offset_does_not_panic() {
        let mut data = encode_transfer_list(&[record(1, "m", "k")]);
        // Point the array offset far past the payload.
        data[WORD - 2] = 0xff;
        data[WORD - 1] = 0xff;
        assert!(decode_transfer_list(&data).is_err());
    }
}
