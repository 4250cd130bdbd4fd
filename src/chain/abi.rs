//! Minimal ABI encoding for the read-only calls the projector makes.

use crate::domain::{Address, RawAmount};
use alloy_primitives::U256;

pub const SYMBOL: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
pub const NAME: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];
pub const DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];
pub const UNDERLYING: [u8; 4] = [0x6f, 0x30, 0x7d, 0xc3];
pub const VOTING_ESCROW: [u8; 4] = [0xdf, 0xe0, 0x50, 0x31];
pub const GAUGE_RELATIVE_WEIGHT: [u8; 4] = [0x62, 0x07, 0xd8, 0x66];
pub const GET_LAST_USER_SLOPE: [u8; 4] = [0x7c, 0x74, 0xa1, 0x74];
pub const LOCKED_END: [u8; 4] = [0xad, 0xc6, 0x35, 0x89];

const WORD: usize = 32;

/// `0x`-prefixed calldata for a selector with optional address arguments.
pub fn encode_call(selector: [u8; 4], args: &[&Address]) -> String {
    let mut data = selector.to_vec();
    for arg in args {
        let mut word = [0u8; WORD];
        // Address strings are validated on construction; fall back to zero on the impossible path
        if let Ok(bytes) = hex::decode(&arg.as_str()[2..]) {
            word[WORD - bytes.len()..].copy_from_slice(&bytes);
        }
        data.extend_from_slice(&word);
    }
    format!("0x{}", hex::encode(data))
}

/// Decode the hex payload of an `eth_call` result.
pub fn decode_hex(result: &str) -> Option<Vec<u8>> {
    let digits = result.strip_prefix("0x").unwrap_or(result);
    hex::decode(digits).ok()
}

pub fn decode_uint(data: &[u8]) -> Option<RawAmount> {
    let word = data.get(..WORD)?;
    U256::try_from_be_slice(word).map(RawAmount)
}

/// Decode a `uint8`; wider values are malformed.
pub fn decode_uint8(data: &[u8]) -> Option<u8> {
    decode_uint(data)?
        .to_u128()
        .and_then(|v| u8::try_from(v).ok())
}

/// Decode an `int128` (sign-extended to one word).
pub fn decode_int128(data: &[u8]) -> Option<i128> {
    let word = data.get(..WORD)?;
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    let value = i128::from_be_bytes(low);
    let extension = if value < 0 { 0xff } else { 0x00 };
    if word[..16].iter().any(|b| *b != extension) {
        return None;
    }
    Some(value)
}

pub fn decode_address(data: &[u8]) -> Option<Address> {
    let word = data.get(..WORD)?;
    Some(Address::from_bytes(&word[12..]))
}

/// Decode a `string` return, accepting the legacy `bytes32` form some tokens use.
pub fn decode_string(data: &[u8]) -> Option<String> {
    if data.len() == WORD {
        let trimmed: Vec<u8> = data.iter().copied().take_while(|b| *b != 0).collect();
        return String::from_utf8(trimmed).ok();
    }

    let offset = word_as_usize(data.get(..WORD)?)?;
    let len_word = data.get(offset..offset.checked_add(WORD)?)?;
    let len = word_as_usize(len_word)?;
    let start = offset + WORD;
    let bytes = data.get(start..start.checked_add(len)?)?;
    String::from_utf8(bytes.to_vec()).ok()
}

fn word_as_usize(word: &[u8]) -> Option<usize> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return None;
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(tail)).ok()
}
