//! Lobby payload decoder.
//!
//! Player announcements carry a handful of named fields inside an otherwise
//! opaque binary blob. Each field starts with its ASCII key followed by a
//! length-prefixed value. Two length encodings are in use:
//!
//! - compact: a zero byte, then a one-byte length
//! - extended: a two-byte little-endian length
//!
//! Nothing in the payload says which encoding applies. A zero first byte
//! always selects the compact form, so an extended length below 256 is
//! misread. This matches what the game clients send in practice.
//!
//! The numeric `userId` field is a type-tag byte followed by a big-endian
//! `i64`.

use super::DecodedIdentity;

/// Key of the player display name.
pub const NAME_KEY: &[u8] = b"names";
/// Key of the player country code.
pub const COUNTRY_KEY: &[u8] = b"countrys";
/// Key of the device identifier.
pub const DEVICE_ID_KEY: &[u8] = b"deviceIds";
/// Key of the numeric account identifier.
pub const USER_ID_KEY: &[u8] = b"userId";

/// Length encoding found in front of a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthForm {
    Compact,
    Extended,
}

/// Decode a player identity from a lobby payload.
///
/// Returns `None` unless name, country and device id are all present and
/// non-empty. A missing user id does not suppress the identity.
pub fn decode(payload: &[u8]) -> Option<DecodedIdentity> {
    let name = extract_string(payload, NAME_KEY);
    let country = extract_string(payload, COUNTRY_KEY);
    let device_id = extract_string(payload, DEVICE_ID_KEY);

    if name.is_empty() || country.is_empty() || device_id.is_empty() {
        return None;
    }

    Some(DecodedIdentity {
        name,
        country,
        device_id,
        user_id: extract_i64(payload, USER_ID_KEY),
    })
}

/// Extract the length-prefixed string following `key`.
///
/// Absent keys, truncated lengths and values running past the end of the
/// payload all yield an empty string.
pub fn extract_string(payload: &[u8], key: &[u8]) -> String {
    let Some(index) = find(payload, key) else {
        return String::new();
    };

    let Some((_, len, start)) = read_length(payload, index + key.len()) else {
        return String::new();
    };

    match payload.get(start..start + len) {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => String::new(),
    }
}

/// Extract the signed 64-bit integer following `key` and its tag byte.
pub fn extract_i64(payload: &[u8], key: &[u8]) -> Option<i64> {
    let index = find(payload, key)?;
    let start = index + key.len() + 1;
    let bytes: [u8; 8] = payload.get(start..start + 8)?.try_into().ok()?;
    Some(i64::from_be_bytes(bytes))
}

/// Read the length prefix at `cursor`.
///
/// Returns the encoding used, the value length and the offset of the value.
pub fn read_length(payload: &[u8], cursor: usize) -> Option<(LengthForm, usize, usize)> {
    let prefix = payload.get(cursor..cursor + 2)?;

    if prefix[0] == 0 {
        Some((LengthForm::Compact, prefix[1] as usize, cursor + 2))
    } else {
        let len = u16::from_le_bytes([prefix[0], prefix[1]]);
        Some((LengthForm::Extended, len as usize, cursor + 2))
    }
}

/// Position of the first byte-exact occurrence of `needle`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }

    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
