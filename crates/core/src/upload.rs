//! Image upload policy: MIME allow-list, size limit, content sniffing and
//! stored file naming.

use image::ImageFormat;

/// MIME types accepted for record images.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Default maximum upload size (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Reasons an upload is refused before it reaches storage.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("File is too large ({size} bytes, maximum is {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Only image files are allowed (got '{0}')")]
    UnsupportedType(String),

    #[error("File content does not match declared type '{0}'")]
    ContentMismatch(String),

    #[error("Uploaded file is empty")]
    Empty,
}

/// Validation rules applied to every upload.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Check an upload and return the file extension to store it under.
    ///
    /// The declared MIME type must be on the allow-list and the bytes must
    /// sniff as the same image format.
    pub fn check(&self, mime: &str, bytes: &[u8]) -> Result<&'static str, UploadRejection> {
        if bytes.is_empty() {
            return Err(UploadRejection::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }

        let mime = mime.trim().to_ascii_lowercase();
        let declared = declared_format(&mime)
            .ok_or_else(|| UploadRejection::UnsupportedType(mime.clone()))?;

        match image::guess_format(bytes) {
            Ok(actual) if actual == declared => Ok(extension_for(actual)),
            _ => Err(UploadRejection::ContentMismatch(mime)),
        }
    }
}

fn declared_format(mime: &str) -> Option<ImageFormat> {
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return None;
    }
    match mime {
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/png" => Some(ImageFormat::Png),
        "image/webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        _ => "jpg",
    }
}

/// Generate a collision-free stored file name.
pub fn stored_filename(extension: &str) -> String {
    format!("{}.{extension}", uuid::Uuid::new_v4())
}

/// Reject names that could escape the upload directory.
pub fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_png_is_accepted() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.check("image/png", PNG_HEADER), Ok("png"));
    }

    #[test]
    fn test_jpg_alias_is_accepted() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.check("image/jpg", JPEG_HEADER), Ok("jpg"));
        assert_eq!(policy.check("IMAGE/JPEG", JPEG_HEADER), Ok("jpg"));
    }

    #[test]
    fn test_disallowed_mime_is_rejected() {
        let policy = UploadPolicy::default();
        assert_matches!(
            policy.check("application/pdf", PNG_HEADER),
            Err(UploadRejection::UnsupportedType(_))
        );
        assert_matches!(
            policy.check("image/gif", b"GIF89a...."),
            Err(UploadRejection::UnsupportedType(_))
        );
    }

    #[test]
    fn test_mismatched_content_is_rejected() {
        let policy = UploadPolicy::default();
        assert_matches!(
            policy.check("image/png", JPEG_HEADER),
            Err(UploadRejection::ContentMismatch(_))
        );
        assert_matches!(
            policy.check("image/png", b"<svg></svg>"),
            Err(UploadRejection::ContentMismatch(_))
        );
    }

    #[test]
    fn test_size_limit() {
        let policy = UploadPolicy::new(8);
        assert_matches!(
            policy.check("image/png", PNG_HEADER),
            Err(UploadRejection::TooLarge { size: 12, max: 8 })
        );
        assert_eq!(policy.check("image/png", &[]), Err(UploadRejection::Empty));
    }

    #[test]
    fn test_stored_filename_is_safe_and_unique() {
        let a = stored_filename("png");
        let b = stored_filename("png");
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
        assert!(is_safe_filename(&a));
    }

    #[test]
    fn test_unsafe_filenames() {
        assert!(!is_safe_filename("../etc/passwd"));
        assert!(!is_safe_filename(".env"));
        assert!(!is_safe_filename("a/b.png"));
        assert!(!is_safe_filename(""));
    }
}
