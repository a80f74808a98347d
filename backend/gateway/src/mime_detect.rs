//! MIME detection for uploaded order documents.
//!
//! Order: the declared content type, then the file's magic bytes, then its
//! extension. `application/octet-stream` counts as undeclared.

use std::path::Path;

const GENERIC: &str = "application/octet-stream";

/// Detect MIME type by leading bytes.
pub fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    match data {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some("image/tiff"),
        [b'B', b'M', ..] => Some("image/bmp"),
        [b'%', b'P', b'D', b'F', ..] => Some("application/pdf"),
        _ => None,
    }
}

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        "pdf"          => "application/pdf",
        "txt"          => "text/plain",
        "xlsx"         => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _              => GENERIC,
    }
}

/// Whether a MIME type is for an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Best MIME type for an upload.
pub fn resolve_upload_mime(
    content_type: Option<&str>,
    data: &[u8],
    file_name: Option<&str>,
) -> String {
    let declared = content_type
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_lowercase())
        .filter(|ct| !ct.is_empty() && ct != GENERIC);
    if let Some(declared) = declared {
        return declared;
    }
    if let Some(sniffed) = sniff_mime_type(data) {
        return sniffed.to_string();
    }
    file_name
        .map(|name| detect_mime_type(Path::new(name)))
        .unwrap_or(GENERIC)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A];

    #[test]
    fn sniffs_common_images() {
        assert_eq!(sniff_mime_type(PNG), Some("image/png"));
        assert_eq!(sniff_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_mime_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime_type(b"hello"), None);
    }

    #[test]
    fn declared_type_wins() {
        assert_eq!(resolve_upload_mime(Some("image/jpeg"), PNG, Some("a.gif")), "image/jpeg");
        assert_eq!(resolve_upload_mime(Some("Image/PNG; q=1"), b"", None), "image/png");
    }

    #[test]
    fn octet_stream_falls_back_to_bytes_then_extension() {
        assert_eq!(resolve_upload_mime(Some(GENERIC), PNG, None), "image/png");
        assert_eq!(resolve_upload_mime(None, b"????", Some("fax.TIF")), "image/tiff");
        assert_eq!(resolve_upload_mime(None, b"????", Some("notes")), GENERIC);
    }

    #[test]
    fn text_is_not_an_image() {
        let mime = resolve_upload_mime(Some("text/plain"), b"order", Some("order.txt"));
        assert!(!is_image(&mime));
    }
}
