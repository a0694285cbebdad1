use primitive_types::U256;

use crate::error::CodecError;

/// Byte width of every integer field in channel and settlement messages.
pub const FIELD_SIZE: usize = 32;

const HEX_PREFIX: &str = "0x";

/// Big-endian 32-byte representation of `value`.
pub fn to_field_bytes(value: &U256) -> [u8; FIELD_SIZE] {
    let mut out = [0u8; FIELD_SIZE];
    value.to_big_endian(&mut out);
    out
}

/// Exactly 64 lowercase hex characters, left-padded with zeros, no prefix.
pub fn to_field_hex(value: &U256) -> String {
    hex::encode(to_field_bytes(value))
}

/// Removes a leading `0x`. A `0x` anywhere else in the string is kept.
pub fn strip_prefix(hex_string: &str) -> &str {
    hex_string.strip_prefix(HEX_PREFIX).unwrap_or(hex_string)
}

/// Decodes a hex byte string with optional leading `0x`. Odd-length input is rejected.
pub fn decode_hex(hex_string: &str) -> Result<Vec<u8>, CodecError> {
    Ok(hex::decode(strip_prefix(hex_string))?)
}

/// Reads a big-endian integer of at most 32 significant bytes.
pub fn field_from_bytes(bytes: &[u8]) -> Result<U256, CodecError> {
    let first_significant = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    #[allow(clippy::indexing_slicing, reason = "position is within bounds")]
    let significant = &bytes[first_significant..];
    if significant.len() > FIELD_SIZE {
        return Err(CodecError::FieldOverflow(hex::encode(significant)));
    }
    Ok(U256::from_big_endian(significant))
}

/// Inverse of [`to_field_hex`]; also accepts shorter or `0x`-prefixed input. A number may have
/// an odd digit count, read as if it had a leading zero nibble.
pub fn field_from_hex(hex_string: &str) -> Result<U256, CodecError> {
    let digits = strip_prefix(hex_string);
    let bytes = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))?
    } else {
        hex::decode(digits)?
    };
    field_from_bytes(&bytes)
}

/// Parses an arbitrarily large decimal or `0x`-prefixed hex integer into a 32-byte field.
pub fn parse_field(text: &str) -> Result<U256, CodecError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CodecError::InvalidNumber(text.to_string()));
    }
    if text.starts_with(HEX_PREFIX) {
        return field_from_hex(text).map_err(|e| match e {
            CodecError::InvalidHex(_) => CodecError::InvalidNumber(text.to_string()),
            other => other,
        });
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::InvalidNumber(text.to_string()));
    }
    U256::from_dec_str(text).map_err(|_| CodecError::FieldOverflow(text.to_string()))
}
