//! Decoders must reject garbage with an error, never a panic.

use assetline_decode::{ImageKind, decode_image, decode_json, decode_text};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_json_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_json(&data);
    }

    #[test]
    fn test_text_matches_std(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let expected = std::str::from_utf8(&data).is_ok();
        prop_assert_eq!(decode_text(&data).is_ok(), expected);
    }

    #[test]
    fn test_image_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode_image(&data, Some(ImageKind::Png));
    }
}
