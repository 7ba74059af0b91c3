//! MIME and extension detection for staged images.

use std::path::Path;

use image::ImageFormat;

/// Detect an image MIME type by file extension, for upload headers.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// File extension for raw image bytes. Chat clients send JPEG almost always,
/// so unknown content is staged as `jpg`.
pub fn image_extension(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "png",
        Ok(ImageFormat::Gif) => "gif",
        Ok(ImageFormat::WebP) => "webp",
        Ok(ImageFormat::Bmp) => "bmp",
        Ok(ImageFormat::Tiff) => "tiff",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(detect_mime_type(Path::new("a/123_face.JPG")), "image/jpeg");
        assert_eq!(detect_mime_type(Path::new("x.png")), "image/png");
        assert_eq!(detect_mime_type(Path::new("noext")), "application/octet-stream");
        assert_eq!(detect_mime_type(Path::new("x.webp")), "image/webp");
    }

    #[test]
    fn extension_from_magic_bytes() {
        assert_eq!(image_extension(b"\x89PNG\r\n\x1a\n\0\0"), "png");
        assert_eq!(image_extension(b"\xff\xd8\xff\xe0\0\0"), "jpg");
        assert_eq!(image_extension(b"garbage"), "jpg");
    }
}
