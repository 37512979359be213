//! Raster image decoding.
//!
//! Supports the formats a browser-style loader sees most often:
//! - JPEG
//! - PNG
//! - GIF (first frame)
//! - WebP
//!
//! Every format decodes to RGBA pixel data.

use std::fmt;

use image::ImageFormat;

use crate::error::{DecodeError, DecodeResult};

/// Image container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageKind {
    /// Map a normalised content type such as `image/png` to an image kind.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// The canonical content type for this kind.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::WebP => "image/webp",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
            Self::WebP => ImageFormat::WebP,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded image data.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Format the image was decoded from.
    pub kind: ImageKind,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
}

impl DecodedImage {
    /// Check if the pixel buffer size matches the dimensions.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.data.len() == (self.width as usize) * (self.height as usize) * 4
    }
}

// Pixel buffers are large; keep debug output readable.
impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("kind", &self.kind)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Detect the image kind from the leading magic bytes.
#[must_use]
pub fn detect_image_kind(data: &[u8]) -> Option<ImageKind> {
    match image::guess_format(data).ok()? {
        ImageFormat::Jpeg => Some(ImageKind::Jpeg),
        ImageFormat::Png => Some(ImageKind::Png),
        ImageFormat::Gif => Some(ImageKind::Gif),
        ImageFormat::WebP => Some(ImageKind::WebP),
        _ => None,
    }
}

/// Decode an image to RGBA.
///
/// `hint` is usually derived from the response content type. Servers lie
/// about image types often enough that the magic bytes win when they
/// disagree with the hint.
///
/// # Errors
///
/// Returns [`DecodeError::EmptyBody`] for an empty buffer and
/// [`DecodeError::InvalidImage`] if the format is unknown or decoding fails.
pub fn decode_image(data: &[u8], hint: Option<ImageKind>) -> DecodeResult<DecodedImage> {
    if data.is_empty() {
        return Err(DecodeError::EmptyBody);
    }

    let kind = detect_image_kind(data)
        .or(hint)
        .ok_or_else(|| DecodeError::InvalidImage {
            kind: "unknown",
            detail: "unrecognised image signature".to_string(),
        })?;

    let decoded = image::load_from_memory_with_format(data, kind.format()).map_err(|e| {
        DecodeError::InvalidImage {
            kind: kind.name(),
            detail: e.to_string(),
        }
    })?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        kind,
        width,
        height,
        data: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let png = encode_png(3, 2);
        let decoded = decode_image(&png, Some(ImageKind::Png)).unwrap();
        assert_eq!(decoded.kind, ImageKind::Png);
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert!(decoded.is_valid());
        assert_eq!(&decoded.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_signature_overrides_hint() {
        let png = encode_png(1, 1);
        let decoded = decode_image(&png, Some(ImageKind::Jpeg)).unwrap();
        assert_eq!(decoded.kind, ImageKind::Png);
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_image_kind(&encode_png(1, 1)), Some(ImageKind::Png));
        assert_eq!(detect_image_kind(b"GIF89a"), Some(ImageKind::Gif));
        assert_eq!(detect_image_kind(b"hello"), None);
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(decode_image(&[], None), Err(DecodeError::EmptyBody));
    }

    #[test]
    fn test_truncated_png() {
        let png = encode_png(4, 4);
        let err = decode_image(&png[..png.len() / 2], None).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidImage { kind: "png", .. }));
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(ImageKind::from_content_type("image/webp"), Some(ImageKind::WebP));
        assert_eq!(ImageKind::from_content_type("text/plain"), None);
        for kind in [ImageKind::Jpeg, ImageKind::Png, ImageKind::Gif, ImageKind::WebP] {
            assert_eq!(ImageKind::from_content_type(kind.content_type()), Some(kind));
        }
    }
}
