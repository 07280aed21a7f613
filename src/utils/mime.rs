//! MIME type detection utilities

/// Fallback used when neither the server nor the bytes reveal an image type.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Guess MIME by inspecting bytes (magic numbers)
pub fn guess_mime_from_bytes(bytes: &[u8]) -> Option<String> {
    infer::get(bytes).map(|k| k.mime_type().to_string())
}

/// Mime type of a downloaded image.
///
/// Prefers the response `Content-Type` (parameters stripped), then magic
/// numbers, then `image/png`. Generic types such as `application/octet-stream`
/// do not count as an answer from the server.
pub fn resolve_image_mime(content_type: Option<&str>, bytes: &[u8]) -> String {
    if let Some(ct) = content_type
        && let Some(essence) = ct.split(';').next().map(str::trim)
        && !essence.is_empty()
        && essence != "application/octet-stream"
        && essence != "binary/octet-stream"
    {
        return essence.to_ascii_lowercase();
    }
    guess_mime_from_bytes(bytes).unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn header_wins_and_is_normalized() {
        assert_eq!(
            resolve_image_mime(Some("Image/JPEG; charset=binary"), PNG_MAGIC),
            "image/jpeg"
        );
    }

    #[test]
    fn sniffs_when_header_is_missing_or_generic() {
        assert_eq!(resolve_image_mime(None, JPEG_MAGIC), "image/jpeg");
        assert_eq!(
            resolve_image_mime(Some("application/octet-stream"), PNG_MAGIC),
            "image/png"
        );
    }

    #[test]
    fn falls_back_to_png() {
        assert_eq!(resolve_image_mime(None, b"not an image"), DEFAULT_IMAGE_MIME);
    }
}
