//! File type detection: content sniffing with extension fallback.
//!
//! `detect` never fails. Sniffing inspects a fixed magic-byte table; when it
//! cannot decide (text-like content, truncated buffers), the lower-cased
//! filename extension is checked against the supported set. Anything else
//! resolves to [`TypeTag::Unknown`].

use std::fmt;
use std::path::Path;

use tracing::debug;

/// Broad grouping of supported file types, mirrored in the upload allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Documents,
    Spreadsheets,
    Images,
    Data,
    Code,
}

/// Canonical identifier for a file's detected kind. Closed set; assigned once
/// per file and never revised afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Pdf,
    Docx,
    Txt,
    Md,
    Csv,
    Xlsx,
    Xls,
    Png,
    Jpg,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Json,
    Yaml,
    Xml,
    Py,
    Js,
    Html,
    Css,
    Java,
    C,
    Cpp,
    Cs,
    Go,
    Php,
    Rb,
    Swift,
    Unknown,
}

impl TypeTag {
    /// All tags a file can actually be detected as (everything but Unknown).
    pub const SUPPORTED: [TypeTag; 28] = [
        TypeTag::Pdf,
        TypeTag::Docx,
        TypeTag::Txt,
        TypeTag::Md,
        TypeTag::Csv,
        TypeTag::Xlsx,
        TypeTag::Xls,
        TypeTag::Png,
        TypeTag::Jpg,
        TypeTag::Gif,
        TypeTag::Bmp,
        TypeTag::Tiff,
        TypeTag::Webp,
        TypeTag::Json,
        TypeTag::Yaml,
        TypeTag::Xml,
        TypeTag::Py,
        TypeTag::Js,
        TypeTag::Html,
        TypeTag::Css,
        TypeTag::Java,
        TypeTag::C,
        TypeTag::Cpp,
        TypeTag::Cs,
        TypeTag::Go,
        TypeTag::Php,
        TypeTag::Rb,
        TypeTag::Swift,
    ];

    /// Parse a filename extension (already lower-cased, no dot).
    pub fn from_extension(ext: &str) -> Option<TypeTag> {
        let tag = match ext {
            "pdf" => TypeTag::Pdf,
            "docx" => TypeTag::Docx,
            "txt" => TypeTag::Txt,
            "md" => TypeTag::Md,
            "csv" => TypeTag::Csv,
            "xlsx" => TypeTag::Xlsx,
            "xls" => TypeTag::Xls,
            "png" => TypeTag::Png,
            "jpg" | "jpeg" => TypeTag::Jpg,
            "gif" => TypeTag::Gif,
            "bmp" => TypeTag::Bmp,
            "tiff" => TypeTag::Tiff,
            "webp" => TypeTag::Webp,
            "json" => TypeTag::Json,
            "yaml" | "yml" => TypeTag::Yaml,
            "xml" => TypeTag::Xml,
            "py" => TypeTag::Py,
            "js" => TypeTag::Js,
            "html" => TypeTag::Html,
            "css" => TypeTag::Css,
            "java" => TypeTag::Java,
            "c" => TypeTag::C,
            "cpp" => TypeTag::Cpp,
            "cs" => TypeTag::Cs,
            "go" => TypeTag::Go,
            "php" => TypeTag::Php,
            "rb" => TypeTag::Rb,
            "swift" => TypeTag::Swift,
            _ => return None,
        };
        Some(tag)
    }

    /// Canonical extension used when deriving output filenames.
    pub fn extension(&self) -> &'static str {
        match self {
            TypeTag::Pdf => "pdf",
            TypeTag::Docx => "docx",
            TypeTag::Txt => "txt",
            TypeTag::Md => "md",
            TypeTag::Csv => "csv",
            TypeTag::Xlsx => "xlsx",
            TypeTag::Xls => "xls",
            TypeTag::Png => "png",
            TypeTag::Jpg => "jpg",
            TypeTag::Gif => "gif",
            TypeTag::Bmp => "bmp",
            TypeTag::Tiff => "tiff",
            TypeTag::Webp => "webp",
            TypeTag::Json => "json",
            TypeTag::Yaml => "yaml",
            TypeTag::Xml => "xml",
            TypeTag::Py => "py",
            TypeTag::Js => "js",
            TypeTag::Html => "html",
            TypeTag::Css => "css",
            TypeTag::Java => "java",
            TypeTag::C => "c",
            TypeTag::Cpp => "cpp",
            TypeTag::Cs => "cs",
            TypeTag::Go => "go",
            TypeTag::Php => "php",
            TypeTag::Rb => "rb",
            TypeTag::Swift => "swift",
            TypeTag::Unknown => "bin",
        }
    }

    /// Canonical MIME label for download responses.
    pub fn mime(&self) -> &'static str {
        match self {
            TypeTag::Pdf => "application/pdf",
            TypeTag::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            TypeTag::Txt => "text/plain",
            TypeTag::Md => "text/markdown",
            TypeTag::Csv => "text/csv",
            TypeTag::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            TypeTag::Xls => "application/vnd.ms-excel",
            TypeTag::Png => "image/png",
            TypeTag::Jpg => "image/jpeg",
            TypeTag::Gif => "image/gif",
            TypeTag::Bmp => "image/bmp",
            TypeTag::Tiff => "image/tiff",
            TypeTag::Webp => "image/webp",
            TypeTag::Json => "application/json",
            TypeTag::Yaml => "text/yaml",
            TypeTag::Xml => "application/xml",
            TypeTag::Py => "text/x-python",
            TypeTag::Js => "application/javascript",
            TypeTag::Html => "text/html",
            TypeTag::Css => "text/css",
            TypeTag::Java => "text/x-java-source",
            TypeTag::C => "text/x-c",
            TypeTag::Cpp => "text/x-c++",
            TypeTag::Cs => "text/x-csharp",
            TypeTag::Go => "text/x-go",
            TypeTag::Php => "application/x-httpd-php",
            TypeTag::Rb => "application/x-ruby",
            TypeTag::Swift => "text/x-swift",
            TypeTag::Unknown => "application/octet-stream",
        }
    }

    pub fn category(&self) -> Option<FileCategory> {
        let cat = match self {
            TypeTag::Pdf | TypeTag::Docx | TypeTag::Txt | TypeTag::Md => FileCategory::Documents,
            TypeTag::Csv | TypeTag::Xlsx | TypeTag::Xls => FileCategory::Spreadsheets,
            TypeTag::Png
            | TypeTag::Jpg
            | TypeTag::Gif
            | TypeTag::Bmp
            | TypeTag::Tiff
            | TypeTag::Webp => FileCategory::Images,
            TypeTag::Json | TypeTag::Yaml | TypeTag::Xml => FileCategory::Data,
            TypeTag::Py
            | TypeTag::Js
            | TypeTag::Html
            | TypeTag::Css
            | TypeTag::Java
            | TypeTag::C
            | TypeTag::Cpp
            | TypeTag::Cs
            | TypeTag::Go
            | TypeTag::Php
            | TypeTag::Rb
            | TypeTag::Swift => FileCategory::Code,
            TypeTag::Unknown => return None,
        };
        Some(cat)
    }

    pub fn is_image(&self) -> bool {
        matches!(self.category(), Some(FileCategory::Images))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == TypeTag::Unknown {
            write!(f, "unknown")
        } else {
            write!(f, "{}", self.extension())
        }
    }
}

/// Detect the type of a file from its content and filename.
///
/// Content sniffing wins when it recognises the buffer; otherwise the filename
/// extension decides, and failing that the result is [`TypeTag::Unknown`].
/// This function never errors.
pub fn detect(bytes: &[u8], filename: &str) -> TypeTag {
    let ext_tag = extension_tag(filename);

    let tag = match sniff_mime(bytes) {
        Some(mime) => match mime_to_tag(mime) {
            Some(tag) => tag,
            None => ext_tag.unwrap_or(TypeTag::Unknown),
        },
        // Sniffing came up empty: text-like or unrecognised content.
        None => ext_tag.unwrap_or(TypeTag::Unknown),
    };

    debug!(filename, %tag, size = bytes.len(), "Detected file type");
    tag
}

fn extension_tag(filename: &str) -> Option<TypeTag> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .and_then(|e| TypeTag::from_extension(&e))
}

/// Sniff a MIME string from leading magic bytes. Returns `None` when the
/// content does not match any known signature (plain text included).
fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    if is_pdf_magic(bytes) {
        return Some("application/pdf");
    }
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if bytes.starts_with(b"\xFF\xD8\xFF") {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    if bytes.starts_with(b"II*\x00") || bytes.starts_with(b"MM\x00*") {
        return Some("image/tiff");
    }
    if bytes.starts_with(b"RIFF") && bytes.len() >= 12 && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"\xD0\xCF\x11\xE0") {
        // OLE2 compound file, the legacy Excel container.
        return Some("application/vnd.ms-excel");
    }
    if bytes.starts_with(b"PK\x03\x04") {
        return Some(sniff_zip_container(bytes));
    }
    None
}

/// Check for the `%PDF` signature, tolerating a BOM or leading whitespace.
fn is_pdf_magic(bytes: &[u8]) -> bool {
    let trimmed = if bytes.starts_with(b"\xEF\xBB\xBF") {
        &bytes[3..]
    } else {
        bytes
    };
    let trimmed = {
        let mut b = trimmed;
        while let Some((first, rest)) = b.split_first() {
            if first.is_ascii_whitespace() {
                b = rest;
            } else {
                break;
            }
        }
        b
    };
    trimmed.starts_with(b"%PDF")
}

/// Distinguish the OOXML flavours inside a ZIP container by looking for their
/// part-name prefixes; central directory entries keep the names in cleartext.
fn sniff_zip_container(bytes: &[u8]) -> &'static str {
    if contains_subslice(bytes, b"word/") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else if contains_subslice(bytes, b"xl/") {
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    } else {
        "application/octet-stream"
    }
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Map a sniffed MIME string (parameter suffix stripped) to a tag.
fn mime_to_tag(mime: &str) -> Option<TypeTag> {
    let mime = mime.split(';').next().unwrap_or(mime).trim();
    if mime.is_empty() || mime == "application/octet-stream" {
        return None;
    }
    let tag = match mime {
        "application/pdf" => TypeTag::Pdf,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => TypeTag::Docx,
        "text/plain" => TypeTag::Txt,
        "text/markdown" => TypeTag::Md,
        "text/csv" => TypeTag::Csv,
        "application/vnd.ms-excel" => TypeTag::Xls,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => TypeTag::Xlsx,
        "image/png" => TypeTag::Png,
        "image/jpeg" => TypeTag::Jpg,
        "image/gif" => TypeTag::Gif,
        "image/bmp" => TypeTag::Bmp,
        "image/tiff" => TypeTag::Tiff,
        "image/webp" => TypeTag::Webp,
        "application/json" => TypeTag::Json,
        "text/yaml" => TypeTag::Yaml,
        "application/xml" => TypeTag::Xml,
        "text/x-python" => TypeTag::Py,
        "application/javascript" => TypeTag::Js,
        "text/html" => TypeTag::Html,
        "text/css" => TypeTag::Css,
        "text/x-java-source" => TypeTag::Java,
        "text/x-c" => TypeTag::C,
        "text/x-c++" => TypeTag::Cpp,
        "text/x-csharp" => TypeTag::Cs,
        "text/x-go" => TypeTag::Go,
        "application/x-httpd-php" => TypeTag::Php,
        "application/x-ruby" => TypeTag::Rb,
        "text/x-swift" => TypeTag::Swift,
        _ => return None,
    };
    Some(tag)
}
