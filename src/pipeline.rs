//! Batch orchestration: detect → read → (convert → write) per input file.
//!
//! One file's failure never stops its siblings; each entry in the returned
//! report carries its own outcome. The pipeline holds no state between calls.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::content::{self, DecodedContent, ReadError};
use crate::convert::{self, ConvertError};
use crate::detect::{self, TypeTag};

/// An uploaded/input file: raw bytes plus the name they arrived under.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Failure of a single pipeline step for a single file.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("read failed: {0}")]
    Read(#[from] ReadError),
    #[error("conversion failed: {0}")]
    Convert(#[from] ConvertError),
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of previewing one file.
#[derive(Debug)]
pub struct InspectEntry {
    pub filename: String,
    pub tag: TypeTag,
    pub outcome: Result<DecodedContent, ReadError>,
}

#[derive(Debug, Default)]
pub struct InspectReport {
    pub entries: Vec<InspectEntry>,
}

/// A converted file written to disk.
#[derive(Debug)]
pub struct ConvertedFile {
    pub path: PathBuf,
    pub mime: &'static str,
    pub size: usize,
}

/// Outcome of converting one file.
#[derive(Debug)]
pub struct ConvertEntry {
    pub filename: String,
    pub tag: TypeTag,
    pub outcome: Result<ConvertedFile, PipelineError>,
}

#[derive(Debug, Default)]
pub struct ConvertReport {
    pub entries: Vec<ConvertEntry>,
}

impl ConvertReport {
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_err()).count()
    }
}

/// Detect and decode each file. Decode failures are recorded per entry and
/// processing continues with the remaining files.
pub fn inspect_batch(files: &[FileInput]) -> InspectReport {
    let mut report = InspectReport::default();
    for file in files {
        let tag = detect::detect(&file.data, &file.filename);
        let outcome = content::read(&file.data, tag);
        match &outcome {
            Ok(content) => info!(
                filename = %file.filename,
                %tag,
                kind = %content.kind(),
                "Inspected file"
            ),
            Err(e) => error!(filename = %file.filename, %tag, error = %e, "Failed to read file"),
        }
        report.entries.push(InspectEntry {
            filename: file.filename.clone(),
            tag,
            outcome,
        });
    }
    report
}

/// Detect, decode and convert each file to `target`, writing the result next
/// to `out_dir` under the derived `<stem>_converted.<ext>` name. Failures are
/// per entry; sibling files still convert.
pub fn convert_batch(files: &[FileInput], target: TypeTag, out_dir: &Path) -> ConvertReport {
    let mut report = ConvertReport::default();
    for file in files {
        let tag = detect::detect(&file.data, &file.filename);
        let outcome = convert_one(file, tag, target, out_dir);
        match &outcome {
            Ok(converted) => info!(
                filename = %file.filename,
                %target,
                output = %converted.path.display(),
                size = converted.size,
                "Converted file"
            ),
            Err(e) => {
                error!(filename = %file.filename, %tag, %target, error = %e, "Conversion failed")
            }
        }
        report.entries.push(ConvertEntry {
            filename: file.filename.clone(),
            tag,
            outcome,
        });
    }
    report
}

fn convert_one(
    file: &FileInput,
    tag: TypeTag,
    target: TypeTag,
    out_dir: &Path,
) -> Result<ConvertedFile, PipelineError> {
    let content = content::read(&file.data, tag)?;
    let result = convert::convert(&content, tag, target)?;

    // Stage through a temp file in the target directory so a failed write
    // never leaves a partial output behind; the temp file is removed on every
    // early-return path when it drops.
    std::fs::create_dir_all(out_dir)?;
    let mut staged = tempfile::NamedTempFile::new_in(out_dir)?;
    staged.write_all(&result.bytes)?;

    let final_path = out_dir.join(output_filename(&file.filename, target));
    staged
        .persist(&final_path)
        .map_err(|e| PipelineError::Io(e.error))?;

    Ok(ConvertedFile {
        path: final_path,
        mime: result.mime,
        size: result.bytes.len(),
    })
}

/// Derived download name: `<original-stem>_converted.<target-extension>`.
pub fn output_filename(original: &str, target: TypeTag) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    format!("{stem}_converted.{}", target.extension())
}

/// Short human-readable preview of decoded content, used by the CLI.
pub fn render_preview(content: &DecodedContent) -> String {
    const TEXT_PREVIEW_LINES: usize = 20;
    const TABLE_PREVIEW_ROWS: usize = 5;

    match content {
        DecodedContent::Text(text) => {
            let mut lines: Vec<&str> = text.lines().take(TEXT_PREVIEW_LINES + 1).collect();
            let truncated = lines.len() > TEXT_PREVIEW_LINES;
            lines.truncate(TEXT_PREVIEW_LINES);
            let mut out = lines.join("\n");
            if truncated {
                out.push_str("\n…");
            }
            out
        }
        DecodedContent::Table(table) => {
            let (rows, cols) = table.dimensions();
            let mut out = format!("table: {rows} rows x {cols} columns\n");
            out.push_str(&table.headers.join(" | "));
            for row in table.rows.iter().take(TABLE_PREVIEW_ROWS) {
                out.push('\n');
                out.push_str(&row.join(" | "));
            }
            if rows > TABLE_PREVIEW_ROWS {
                out.push_str("\n…");
            }
            out
        }
        DecodedContent::Mapping(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).collect();
            format!("mapping: {} keys ({})", keys.len(), keys.join(", "))
        }
        DecodedContent::RawBytes { bytes, tag } => {
            if tag.is_image() {
                format!("{tag} image, {} bytes", bytes.len())
            } else {
                format!("binary content, {} bytes", bytes.len())
            }
        }
    }
}
