//! Plain text and markup.

use crate::error::{DecodeError, DecodeResult};

/// Decode a response body as UTF-8 text.
///
/// A leading byte order mark is stripped.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidUtf8`] if the body is not valid UTF-8.
pub fn decode_text(data: &[u8]) -> DecodeResult<String> {
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    match std::str::from_utf8(data) {
        Ok(text) => Ok(text.to_owned()),
        Err(e) => Err(DecodeError::InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text() {
        assert_eq!(decode_text(b"hello").unwrap(), "hello");
        assert_eq!(decode_text(b"").unwrap(), "");
    }

    #[test]
    fn test_strips_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBF<p>").unwrap(), "<p>");
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(
            decode_text(b"ab\xFF"),
            Err(DecodeError::InvalidUtf8 { valid_up_to: 2 })
        );
    }
}
