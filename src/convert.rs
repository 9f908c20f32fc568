//! Conversion of decoded content into a requested output format.
//!
//! A dispatch table over (representation kind, target format). Each arm wraps
//! a format library; no codec logic lives here. Identity conversions (target
//! equals the detected type) re-emit the decoded value in its natural byte
//! form, which is semantic passthrough, not a byte-identity guarantee.

use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run};
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Point, Pt, TextItem,
};
use serde_json::Value;
use tracing::{debug, error};

use crate::content::{cell_string, ContentKind, DecodedContent, Table};
use crate::detect::TypeTag;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const FONT_SIZE_PT: f32 = 12.0;
const LINE_HEIGHT_PT: f32 = 14.0;
/// Characters that fit one body line at the fixed font and page width.
const WRAP_COLUMNS: usize = 90;

/// Error raised when decoded content cannot be encoded into the target.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{kind} content cannot be converted to {target}")]
    Unsupported { kind: ContentKind, target: TypeTag },
    #[error("{0} is not a supported conversion target")]
    UnsupportedTarget(TypeTag),
    #[error("csv encode failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("xlsx encode failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("json encode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml encode failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("docx encode failed: {0}")]
    Docx(String),
    #[error("i/o error during encode: {0}")]
    Io(#[from] std::io::Error),
}

/// Encoded output plus its MIME label. Produced fresh per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Convert decoded content to the target format.
///
/// `current` is the file's detected type; when it equals `target` the value is
/// re-emitted without transformation.
pub fn convert(
    value: &DecodedContent,
    current: TypeTag,
    target: TypeTag,
) -> Result<ConversionResult, ConvertError> {
    if target == current {
        debug!(%target, "Identity conversion, passing value through");
        return passthrough(value, current);
    }

    let result = match target {
        TypeTag::Pdf => to_pdf(value),
        TypeTag::Docx => to_docx(value),
        TypeTag::Txt => to_txt(value),
        TypeTag::Csv => to_csv(value),
        TypeTag::Xlsx => to_xlsx(value),
        TypeTag::Json => to_json(value),
        TypeTag::Yaml => to_yaml(value),
        other => Err(ConvertError::UnsupportedTarget(other)),
    };
    if let Err(e) = &result {
        error!(kind = %value.kind(), %target, error = %e, "Conversion failed");
    }
    result
}

/// Natural byte form of a decoded value for its own type.
fn passthrough(value: &DecodedContent, tag: TypeTag) -> Result<ConversionResult, ConvertError> {
    let bytes = match value {
        DecodedContent::Text(text) => text.clone().into_bytes(),
        DecodedContent::RawBytes { bytes, .. } => bytes.clone(),
        DecodedContent::Table(table) => match tag {
            TypeTag::Xlsx | TypeTag::Xls => encode_xlsx(table)?,
            TypeTag::Json => encode_json_pretty(&table.records())?,
            TypeTag::Yaml => serde_yaml::to_string(&table.records())?.into_bytes(),
            _ => encode_csv(table)?,
        },
        DecodedContent::Mapping(map) => match tag {
            TypeTag::Yaml => serde_yaml::to_string(&Value::Object(map.clone()))?.into_bytes(),
            _ => encode_json_pretty(&Value::Object(map.clone()))?,
        },
    };
    Ok(ConversionResult {
        bytes,
        mime: tag.mime(),
    })
}

fn to_pdf(value: &DecodedContent) -> Result<ConversionResult, ConvertError> {
    let lines = document_lines(value, true);

    let usable_height_pt = Mm(PAGE_HEIGHT_MM - 2.0 * MARGIN_MM).into_pt().0;
    let lines_per_page = (usable_height_pt / LINE_HEIGHT_PT).max(1.0) as usize;

    let mut pages = Vec::new();
    let page_chunks: Vec<&[String]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(lines_per_page).collect()
    };
    for chunk in page_chunks {
        let mut ops = vec![
            Op::StartTextSection,
            Op::SetLineHeight {
                lh: Pt(LINE_HEIGHT_PT),
            },
            Op::SetFontSizeBuiltinFont {
                size: Pt(FONT_SIZE_PT),
                font: BuiltinFont::Helvetica,
            },
            Op::SetTextCursor {
                pos: Point {
                    x: Mm(MARGIN_MM).into_pt(),
                    y: Mm(PAGE_HEIGHT_MM - MARGIN_MM).into_pt(),
                },
            },
        ];
        for line in chunk {
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line.clone())],
                font: BuiltinFont::Helvetica,
            });
            ops.push(Op::AddLineBreak);
        }
        ops.push(Op::EndTextSection);
        pages.push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));
    }

    let mut doc = PdfDocument::new("Converted document");
    let mut warnings = Vec::new();
    let bytes = doc
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings);
    Ok(ConversionResult {
        bytes,
        mime: TypeTag::Pdf.mime(),
    })
}

fn to_docx(value: &DecodedContent) -> Result<ConversionResult, ConvertError> {
    let lines = document_lines(value, false);

    let mut docx = Docx::new();
    for line in &lines {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line.as_str())));
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut cursor)
        .map_err(|e| ConvertError::Docx(e.to_string()))?;
    Ok(ConversionResult {
        bytes: cursor.into_inner(),
        mime: TypeTag::Docx.mime(),
    })
}

fn to_txt(value: &DecodedContent) -> Result<ConversionResult, ConvertError> {
    let text = match value {
        DecodedContent::Text(text) => text.clone(),
        DecodedContent::Mapping(map) => mapping_lines(map).join("\n"),
        DecodedContent::Table(table) => table.to_text(),
        DecodedContent::RawBytes { .. } => {
            return Err(ConvertError::Unsupported {
                kind: ContentKind::RawBytes,
                target: TypeTag::Txt,
            })
        }
    };
    Ok(ConversionResult {
        bytes: text.into_bytes(),
        mime: TypeTag::Txt.mime(),
    })
}

fn to_csv(value: &DecodedContent) -> Result<ConversionResult, ConvertError> {
    let table = tabular_grid(value, TypeTag::Csv)?;
    Ok(ConversionResult {
        bytes: encode_csv(&table)?,
        mime: TypeTag::Csv.mime(),
    })
}

fn to_xlsx(value: &DecodedContent) -> Result<ConversionResult, ConvertError> {
    let table = tabular_grid(value, TypeTag::Xlsx)?;
    Ok(ConversionResult {
        bytes: encode_xlsx(&table)?,
        mime: TypeTag::Xlsx.mime(),
    })
}

fn to_json(value: &DecodedContent) -> Result<ConversionResult, ConvertError> {
    let json = structured_value(value, TypeTag::Json)?;
    Ok(ConversionResult {
        bytes: encode_json_pretty(&json)?,
        mime: TypeTag::Json.mime(),
    })
}

fn to_yaml(value: &DecodedContent) -> Result<ConversionResult, ConvertError> {
    let json = structured_value(value, TypeTag::Yaml)?;
    Ok(ConversionResult {
        bytes: serde_yaml::to_string(&json)?.into_bytes(),
        mime: TypeTag::Yaml.mime(),
    })
}

/// Body lines for document targets (pdf/docx). `wrap` applies the fixed-width
/// wrap policy used for PDF pages; DOCX leaves wrapping to the renderer.
fn document_lines(value: &DecodedContent, wrap: bool) -> Vec<String> {
    let raw: Vec<String> = match value {
        DecodedContent::Text(text) => text.lines().map(str::to_string).collect(),
        DecodedContent::Mapping(map) => mapping_lines(map),
        DecodedContent::Table(table) => table.to_text().lines().map(str::to_string).collect(),
        // Minimal placeholder document for content that has no text form.
        DecodedContent::RawBytes { bytes, tag } => {
            vec![format!("[{} content: {} bytes]", tag, bytes.len())]
        }
    };
    if !wrap {
        return raw;
    }
    let mut wrapped = Vec::new();
    for line in raw {
        wrap_line(&line, WRAP_COLUMNS, &mut wrapped);
    }
    wrapped
}

/// One `key: value` line per mapping entry, in insertion order.
fn mapping_lines(map: &serde_json::Map<String, Value>) -> Vec<String> {
    map.iter()
        .map(|(key, value)| format!("{key}: {}", cell_string(value)))
        .collect()
}

/// Split a line at word boundaries so it fits the page width; a single word
/// longer than the width is hard-split.
fn wrap_line(line: &str, width: usize, out: &mut Vec<String>) {
    if line.chars().count() <= width {
        out.push(line.to_string());
        return;
    }
    let start = out.len();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word_len > width {
            out.push(std::mem::take(&mut current));
        }
        if word_len > width {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(width) {
                out.push(piece.iter().collect());
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    // A long run of pure whitespace yields no words; keep it as a blank line.
    if out.len() == start {
        out.push(String::new());
    }
}

/// Coerce decoded content into a grid for spreadsheet targets. Mappings become
/// a key/value grid; text wraps into the single `Content` cell; raw bytes have
/// no meaningful tabular form.
fn tabular_grid(value: &DecodedContent, target: TypeTag) -> Result<Table, ConvertError> {
    match value {
        DecodedContent::Table(table) => Ok(table.clone()),
        DecodedContent::Mapping(map) => Ok(Table {
            headers: vec!["key".to_string(), "value".to_string()],
            rows: map
                .iter()
                .map(|(k, v)| vec![k.clone(), cell_string(v)])
                .collect(),
        }),
        DecodedContent::Text(text) => Ok(Table::single_cell(text.clone())),
        DecodedContent::RawBytes { .. } => Err(ConvertError::Unsupported {
            kind: ContentKind::RawBytes,
            target,
        }),
    }
}

/// Structured form for json/yaml targets.
fn structured_value(value: &DecodedContent, target: TypeTag) -> Result<Value, ConvertError> {
    match value {
        DecodedContent::Mapping(map) => Ok(Value::Object(map.clone())),
        DecodedContent::Table(table) => Ok(table.records()),
        DecodedContent::Text(text) => {
            let mut obj = serde_json::Map::new();
            obj.insert("content".to_string(), Value::String(text.clone()));
            Ok(Value::Object(obj))
        }
        DecodedContent::RawBytes { .. } => Err(ConvertError::Unsupported {
            kind: ContentKind::RawBytes,
            target,
        }),
    }
}

fn encode_csv(table: &Table) -> Result<Vec<u8>, ConvertError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if !table.headers.is_empty() {
        writer.write_record(&table.headers)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| ConvertError::Io(e.into_error()))
}

fn encode_xlsx(table: &Table) -> Result<Vec<u8>, ConvertError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header.as_str())?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            worksheet.write_string(row_idx as u32 + 1, col as u16, cell.as_str())?;
        }
    }
    Ok(workbook.save_to_buffer()?)
}

/// 2-space indented JSON, matching the download format of the original tool.
fn encode_json_pretty(value: &Value) -> Result<Vec<u8>, ConvertError> {
    Ok(serde_json::to_vec_pretty(value)?)
}
