//! One-line summaries of loaded assets.

use assetline::{Asset, Content};

/// Describe an asset for terminal output.
pub fn summarize(asset: &Asset) -> String {
    format!(
        "{} ({}): {}",
        asset.uri,
        asset.content_type,
        describe(&asset.content)
    )
}

fn describe(content: &Content) -> String {
    match content {
        Content::Json(value) => {
            let kind = match value {
                serde_json::Value::Object(map) => format!("object with {} keys", map.len()),
                serde_json::Value::Array(items) => format!("array of {}", items.len()),
                other => other.to_string(),
            };
            format!("json {kind}")
        }
        Content::Text(text) => format!("text, {} lines", text.lines().count()),
        Content::Image(image) => format!("{} image {}x{}", image.kind, image.width, image.height),
        Content::Bytes(bytes) => format!("{} bytes", bytes.len()),
        Content::Custom(_) => "custom payload".to_string(),
    }
}
