//! Decoders for fetched asset payloads.
//!
//! This crate provides pure synchronous functions that turn the raw body of
//! a fetched resource into a usable value. The async loader decides when and
//! on which thread these run.
//!
//! # Design principles
//!
//! - **Synchronous**: No async, no threading primitives
//! - **Caller-controlled scheduling**: The loader moves heavy decodes off its executor
//! - **Shareable failures**: [`DecodeError`] is `Clone` so one failure can reach many waiters

mod error;
mod json;
mod raster;
mod text;

pub use error::{DecodeError, DecodeResult};
pub use json::decode_json;
pub use raster::{DecodedImage, ImageKind, decode_image, detect_image_kind};
pub use text::decode_text;
