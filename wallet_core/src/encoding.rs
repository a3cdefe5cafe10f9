//! Hex encodings used on the wallet wire.
//!
//! Quantities are `0x`-prefixed big-endian hex with no leading zeros
//! (`0x0` for zero). Byte strings are `0x`-prefixed hex of even length.

/// Encode an integer as a minimal hex quantity.
pub fn to_quantity(value: u128) -> String {
    format!("{value:#x}")
}

/// Decode a hex quantity into a `u128`.
pub fn parse_quantity(raw: &str) -> Result<u128, String> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| format!("quantity must start with 0x: {raw}"))?;
    if digits.is_empty() {
        return Err(format!("empty quantity: {raw}"));
    }
    u128::from_str_radix(digits, 16).map_err(|e| format!("invalid quantity {raw}: {e}"))
}

/// Decode a hex quantity that must fit in a `u64`.
pub fn parse_quantity_u64(raw: &str) -> Result<u64, String> {
    let value = parse_quantity(raw)?;
    u64::try_from(value).map_err(|_| format!("quantity out of range: {raw}"))
}

/// Encode bytes as `0x`-prefixed hex.
pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode `0x`-prefixed hex into bytes. `0x` alone is the empty string.
pub fn parse_hex_data(raw: &str) -> Result<Vec<u8>, String> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| format!("data must start with 0x: {raw}"))?;
    hex::decode(digits).map_err(|e| format!("invalid hex data: {e}"))
}
