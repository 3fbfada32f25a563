//! Canonical unpadded base64 for the salt and hash segments.
//!
//! A segment is canonical when padding it, decoding it and re-encoding the
//! bytes without padding reproduces it exactly.

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD},
};

/// Appends `=` until the length is a multiple of 4.
pub fn pad(text: &str) -> String {
    match text.len() % 4 {
        1 => format!("{text}==="),
        2 => format!("{text}=="),
        3 => format!("{text}="),
        _ => text.to_string(),
    }
}

/// Removes trailing `=`.
pub fn strip(text: &str) -> &str {
    text.trim_end_matches('=')
}

/// Encodes bytes as unpadded standard base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD_NO_PAD.encode(bytes)
}

/// Decodes a canonical segment, `None` for anything else.
pub fn decode(text: &str) -> Option<Vec<u8>> {
    let bytes = STANDARD.decode(pad(text)).ok()?;
    (strip(&STANDARD.encode(&bytes)) == text).then_some(bytes)
}

pub fn is_canonical(text: &str) -> bool {
    decode(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_reaches_multiple_of_four() {
        assert_eq!(pad(""), "");
        assert_eq!(pad("QUJD"), "QUJD");
        assert_eq!(pad("QUJDR"), "QUJDR===");
        assert_eq!(pad("QUI"), "QUI=");
        assert_eq!(pad("QQ"), "QQ==");
    }

    #[test]
    fn strip_removes_trailing_padding_only() {
        assert_eq!(strip("QQ=="), "QQ");
        assert_eq!(strip("QUI="), "QUI");
        assert_eq!(strip("QUJD"), "QUJD");
        assert_eq!(strip("Q=Q="), "Q=Q");
    }

    #[test]
    fn encode_has_no_padding() {
        assert_eq!(encode(b"A"), "QQ");
        assert_eq!(encode(b"AB"), "QUI");
        assert_eq!(encode(b"ABC"), "QUJD");
    }

    #[test]
    fn canonical_segments_decode() {
        assert_eq!(decode("QQ"), Some(b"A".to_vec()));
        assert_eq!(decode("QWJjZGVmZ2hpamtsbW5vcA"), Some(b"Abcdefghijklmnop".to_vec()));
        assert!(is_canonical(""));
    }

    #[test]
    fn padded_segments_are_not_canonical() {
        assert!(!is_canonical("QQ=="));
        assert!(!is_canonical("QUI="));
    }

    #[test]
    fn non_zero_trailing_bits_are_not_canonical() {
        // "QR" and "QQ" both decode to b"A" in lenient decoders
        assert!(!is_canonical("QR"));
    }

    #[test]
    fn foreign_characters_are_not_canonical() {
        assert!(!is_canonical("QQ$"));
        assert!(!is_canonical("-_-_"));
        assert!(!is_canonical("QU JD"));
        assert!(!is_canonical("not base64!"));
    }

    #[test]
    fn impossible_length_is_not_canonical() {
        assert!(!is_canonical("QUJDR"));
    }
}
