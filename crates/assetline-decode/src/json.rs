//! JSON documents.

use crate::error::DecodeResult;

/// Parse a response body as a JSON document.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidJson`](crate::DecodeError::InvalidJson) with
/// the position of the first syntax error.
pub fn decode_json(data: &[u8]) -> DecodeResult<serde_json::Value> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DecodeError;

    #[test]
    fn test_decode_object() {
        let value = decode_json(br#"{"a":1}"#).unwrap();
        assert_eq!(value, serde_json::json!({ "a": 1 }));
    }

    #[test]
    fn test_decode_reports_position() {
        let err = decode_json(b"{\n  \"a\": }").unwrap_err();
        match err {
            DecodeError::InvalidJson { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_empty_is_error() {
        assert!(matches!(
            decode_json(b""),
            Err(DecodeError::InvalidJson { .. })
        ));
    }
}
