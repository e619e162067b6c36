//! Image format (MIME type) helpers.

/// Extension used when a format has no known file extension.
pub const FALLBACK_EXTENSION: &str = "png";

/// Map a GetMap `FORMAT` MIME type to a file extension.
///
/// Only exact, parameter-free MIME types are recognised; anything else
/// (e.g. `image/png; mode=8bit`) returns `None`.
pub fn file_extension(format: &str) -> Option<&'static str> {
    match format {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpeg"),
        "image/gif" => Some("gif"),
        "image/tiff" => Some("tiff"),
        _ => None,
    }
}

/// Like [`file_extension`], falling back to [`FALLBACK_EXTENSION`].
pub fn file_extension_or_default(format: &str) -> &'static str {
    file_extension(format).unwrap_or(FALLBACK_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(file_extension("image/png"), Some("png"));
        assert_eq!(file_extension("image/jpeg"), Some("jpeg"));
        assert_eq!(file_extension("image/gif"), Some("gif"));
        assert_eq!(file_extension("image/tiff"), Some("tiff"));
    }

    #[test]
    fn test_unknown_falls_back_to_png() {
        assert_eq!(file_extension("image/png; mode=8bit"), None);
        assert_eq!(file_extension_or_default("image/png; mode=8bit"), "png");
        assert_eq!(file_extension_or_default("application/x-pdf"), "png");
    }
}
