//! Source file reading and text extraction.
//!
//! Reading never fails: unreadable, binary or unsupported files yield an
//! empty string and a warning.

use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    PlainText,
    Pdf,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("txt") => Self::PlainText,
            Some("pdf") => Self::Pdf,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::PlainText => "text",
            Self::Pdf => "pdf",
            Self::Unknown => "unknown",
        }
    }

    /// Whether corpus loading picks this type up.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// Read a file as text.
pub fn read_text(path: &Path) -> String {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read {:?}: {}", path, e);
            return String::new();
        }
    };

    match ContentType::from_path(path) {
        ContentType::Pdf => extract_pdf(path, &bytes),
        ContentType::Markdown | ContentType::PlainText => decode_utf8(path, bytes),
        ContentType::Unknown => {
            let text = decode_utf8(path, bytes);
            if is_likely_text(&text) {
                text
            } else {
                tracing::warn!("Skipping likely binary file: {:?}", path);
                String::new()
            }
        }
    }
}

fn extract_pdf(path: &Path, bytes: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Failed to extract PDF text from {:?}: {}", path, e);
            String::new()
        }
    }
}

fn decode_utf8(path: &Path, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{:?} is not valid UTF-8: {}", path, e);
            String::new()
        }
    }
}

fn is_likely_text(data: &str) -> bool {
    !data.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            ContentType::from_path(Path::new("policy.md")),
            ContentType::Markdown
        );
        assert_eq!(
            ContentType::from_path(Path::new("REPORT.PDF")),
            ContentType::Pdf
        );
        assert_eq!(
            ContentType::from_path(Path::new("notes.txt")),
            ContentType::PlainText
        );
        assert!(!ContentType::from_path(Path::new("image.png")).is_supported());
    }

    #[test]
    fn test_read_markdown_verbatim() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("kyc.md");
        fs::write(&path, "# KYC\n\nVerify every client.").unwrap();
        assert_eq!(read_text(&path), "# KYC\n\nVerify every client.");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert_eq!(read_text(&temp.path().join("absent.txt")), "");
    }

    #[test]
    fn test_invalid_utf8_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.txt");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x41]).unwrap();
        assert_eq!(read_text(&path), "");
    }

    #[test]
    fn test_binary_unknown_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");
        fs::write(&path, b"abc\0def").unwrap();
        assert_eq!(read_text(&path), "");
    }

    #[test]
    fn test_corrupt_pdf_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.pdf");
        fs::write(&path, b"not really a pdf").unwrap();
        assert_eq!(read_text(&path), "");
    }
}
