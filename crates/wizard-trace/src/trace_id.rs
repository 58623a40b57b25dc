//! Short, URL-safe trace identifiers.
//!
//! Generated ids are a random v4 UUID rendered in base57, which gives a
//! 22-character token without the visually ambiguous characters
//! `0`, `1`, `I`, `O` and `l`.

use uuid::Uuid;

/// Base57 alphabet, in ascending digit order.
const ALPHABET: &[u8; 57] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Length of a generated trace id. `57^22 > 2^128`, so every UUID fits.
pub const TRACE_ID_LEN: usize = 22;

/// Generate a fresh trace id.
pub fn generate() -> String {
    encode(Uuid::new_v4().as_u128())
}

/// Resolve an optional inbound trace id.
///
/// Absent or empty values produce a freshly generated id. Anything else
/// is taken verbatim.
pub fn resolve(trace_id: Option<&str>) -> String {
    match trace_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => generate(),
    }
}

/// Encode a 128-bit value as a left-padded base57 string.
fn encode(mut value: u128) -> String {
    let base = ALPHABET.len() as u128;
    let mut digits = Vec::with_capacity(TRACE_ID_LEN);

    while value > 0 {
        digits.push(ALPHABET[(value % base) as usize]);
        value /= base;
    }
    while digits.len() < TRACE_ID_LEN {
        digits.push(ALPHABET[0]);
    }

    digits.reverse();
    digits.into_iter().map(char::from).collect()
}
