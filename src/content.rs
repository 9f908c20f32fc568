//! Decoding of raw file bytes into an in-memory representation.
//!
//! The reader dispatches on the detected [`TypeTag`] and produces a
//! [`DecodedContent`], a tagged union over the four shapes the rest of the
//! pipeline understands: plain text, a table, a key-value mapping, or opaque
//! bytes. Decode errors propagate to the caller; the reader never retries.

use std::fmt;
use std::io::Cursor;

use calamine::{Reader, Xls, Xlsx};
use serde_json::Value;
use tracing::{debug, error};

use crate::detect::TypeTag;

/// Error raised when a file's bytes cannot be decoded for its detected type.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("pdf text extraction failed: {0}")]
    Pdf(#[from] pdf_extract::OutputError),
    #[error("docx parse failed: {0}")]
    Docx(#[from] docx_rs::ReaderError),
    #[error("csv parse failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet parse failed: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("json parse failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml parse failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Tabular data: a header row plus string-valued body rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Wrap a single scalar value into a one-cell table under a `Content`
    /// header. The converter's universal fallback shape.
    pub fn single_cell(value: impl Into<String>) -> Table {
        Table {
            headers: vec!["Content".to_string()],
            rows: vec![vec![value.into()]],
        }
    }

    /// Single `Content` column with one row per value.
    pub fn single_column(values: Vec<String>) -> Table {
        Table {
            headers: vec!["Content".to_string()],
            rows: values.into_iter().map(|v| vec![v]).collect(),
        }
    }

    /// (rows, columns) of the body, headers excluded.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows.len(), self.headers.len())
    }

    /// Plain-text serialization used when rendering into documents.
    pub fn to_text(&self) -> String {
        let mut out = self.headers.join(" | ");
        for row in &self.rows {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
        out
    }

    /// Records view: an array of one object per row, keyed by header. Cells
    /// beyond the header count are dropped; missing cells are omitted.
    pub fn records(&self) -> Value {
        let records: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (header, cell) in self.headers.iter().zip(row.iter()) {
                    obj.insert(header.clone(), Value::String(cell.clone()));
                }
                Value::Object(obj)
            })
            .collect();
        Value::Array(records)
    }
}

/// Decoded file content, tagged by representation kind. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedContent {
    Text(String),
    Table(Table),
    Mapping(serde_json::Map<String, Value>),
    /// Undecoded bytes: images keep their image tag, opaque binaries carry
    /// [`TypeTag::Unknown`].
    RawBytes { bytes: Vec<u8>, tag: TypeTag },
}

/// Representation kind of a [`DecodedContent`], without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Table,
    Mapping,
    RawBytes,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentKind::Text => "text",
            ContentKind::Table => "table",
            ContentKind::Mapping => "mapping",
            ContentKind::RawBytes => "raw bytes",
        };
        write!(f, "{label}")
    }
}

impl DecodedContent {
    pub fn kind(&self) -> ContentKind {
        match self {
            DecodedContent::Text(_) => ContentKind::Text,
            DecodedContent::Table(_) => ContentKind::Table,
            DecodedContent::Mapping(_) => ContentKind::Mapping,
            DecodedContent::RawBytes { .. } => ContentKind::RawBytes,
        }
    }
}

/// Decode raw bytes according to the detected type.
pub fn read(bytes: &[u8], tag: TypeTag) -> Result<DecodedContent, ReadError> {
    let content = match tag {
        TypeTag::Pdf => read_pdf(bytes)?,
        TypeTag::Docx => read_docx(bytes)?,
        TypeTag::Csv => read_csv(bytes)?,
        TypeTag::Xlsx => read_xlsx(bytes)?,
        TypeTag::Xls => read_xls(bytes)?,
        TypeTag::Json => read_json(bytes)?,
        TypeTag::Yaml => read_yaml(bytes)?,
        tag if tag.is_image() => DecodedContent::RawBytes {
            bytes: bytes.to_vec(),
            tag,
        },
        // Plain text, markdown, xml, source code, unknown.
        _ => read_text(bytes),
    };
    debug!(%tag, kind = %content.kind(), "Decoded file content");
    Ok(content)
}

fn read_pdf(bytes: &[u8]) -> Result<DecodedContent, ReadError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        error!(error = %e, "Failed to extract text from PDF");
        e
    })?;
    Ok(DecodedContent::Text(text))
}

fn read_docx(bytes: &[u8]) -> Result<DecodedContent, ReadError> {
    let doc = docx_rs::read_docx(bytes).map_err(|e| {
        error!(error = %e, "Failed to parse DOCX");
        e
    })?;

    let mut paragraphs = Vec::new();
    for child in &doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(para) = child {
            let mut line = String::new();
            for p_child in &para.children {
                if let docx_rs::ParagraphChild::Run(run) = p_child {
                    for r_child in &run.children {
                        if let docx_rs::RunChild::Text(text) = r_child {
                            line.push_str(&text.text);
                        }
                    }
                }
            }
            paragraphs.push(line);
        }
    }
    Ok(DecodedContent::Text(paragraphs.join("\n")))
}

fn read_csv(bytes: &[u8]) -> Result<DecodedContent, ReadError> {
    let mut reader = csv::ReaderBuilder::new().from_reader(bytes);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(DecodedContent::Table(Table { headers, rows }))
}

fn read_xlsx(bytes: &[u8]) -> Result<DecodedContent, ReadError> {
    let workbook = Xlsx::new(Cursor::new(bytes.to_vec())).map_err(calamine::Error::from)?;
    read_first_sheet(workbook)
}

fn read_xls(bytes: &[u8]) -> Result<DecodedContent, ReadError> {
    let workbook = Xls::new(Cursor::new(bytes.to_vec())).map_err(calamine::Error::from)?;
    read_first_sheet(workbook)
}

/// First worksheet only: first row becomes the header row.
fn read_first_sheet<R>(mut workbook: R) -> Result<DecodedContent, ReadError>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: Into<calamine::Error>,
{
    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Ok(DecodedContent::Table(Table {
            headers: Vec::new(),
            rows: Vec::new(),
        }));
    };
    let range = workbook.worksheet_range(first).map_err(Into::into)?;

    let mut iter = range.rows();
    let headers: Vec<String> = iter
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = iter
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    Ok(DecodedContent::Table(Table { headers, rows }))
}

fn read_json(bytes: &[u8]) -> Result<DecodedContent, ReadError> {
    let value: Value = serde_json::from_slice(bytes)?;
    Ok(match value {
        Value::Object(map) => DecodedContent::Mapping(map),
        other => DecodedContent::Table(json_to_table(other)),
    })
}

/// Coerce a non-object JSON root into a table. Arrays of objects become a
/// records table; anything else wraps into the single `Content` column.
fn json_to_table(value: Value) -> Table {
    match value {
        Value::Array(items) if items.iter().all(|i| i.is_object()) && !items.is_empty() => {
            let mut headers: Vec<String> = Vec::new();
            for item in &items {
                if let Value::Object(obj) = item {
                    for key in obj.keys() {
                        if !headers.iter().any(|h| h == key) {
                            headers.push(key.clone());
                        }
                    }
                }
            }
            let rows = items
                .into_iter()
                .map(|item| {
                    let obj = item.as_object().cloned().unwrap_or_default();
                    headers
                        .iter()
                        .map(|h| obj.get(h).map(cell_string).unwrap_or_default())
                        .collect()
                })
                .collect();
            Table { headers, rows }
        }
        Value::Array(items) => Table::single_column(items.iter().map(cell_string).collect()),
        other => Table::single_cell(cell_string(&other)),
    }
}

/// String form of a JSON value as a table cell or document line; strings stay
/// unquoted.
pub(crate) fn cell_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_yaml(bytes: &[u8]) -> Result<DecodedContent, ReadError> {
    let value: Value = serde_yaml::from_slice(bytes)?;
    Ok(match value {
        Value::Object(map) => DecodedContent::Mapping(map),
        other => DecodedContent::Text(serde_yaml::to_string(&other)?),
    })
}

/// UTF-8 text when valid, opaque bytes otherwise. Never errors.
fn read_text(bytes: &[u8]) -> DecodedContent {
    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedContent::Text(text.to_string()),
        Err(_) => DecodedContent::RawBytes {
            bytes: bytes.to_vec(),
            tag: TypeTag::Unknown,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_parses_into_table() {
        let data = b"name,age\nalice,30\nbob,25\ncarol,41\n";
        let content = read(data, TypeTag::Csv).unwrap();
        let DecodedContent::Table(table) = content else {
            panic!("expected table");
        };
        assert_eq!(table.dimensions(), (3, 2));
        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.rows[0], vec!["alice", "30"]);
    }

    #[test]
    fn json_object_becomes_mapping() {
        let content = read(br#"{"a": 1, "b": "x"}"#, TypeTag::Json).unwrap();
        let DecodedContent::Mapping(map) = content else {
            panic!("expected mapping");
        };
        assert_eq!(map.get("a"), Some(&Value::from(1)));
        assert_eq!(map.get("b"), Some(&Value::from("x")));
    }

    #[test]
    fn json_array_of_objects_becomes_records_table() {
        let data = br#"[{"name":"alice","age":30},{"name":"bob","age":25}]"#;
        let DecodedContent::Table(table) = read(data, TypeTag::Json).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.headers, vec!["name", "age"]);
        assert_eq!(table.rows, vec![vec!["alice", "30"], vec!["bob", "25"]]);
    }

    #[test]
    fn json_scalar_root_wraps_into_single_cell() {
        let DecodedContent::Table(table) = read(b"42", TypeTag::Json).unwrap() else {
            panic!("expected table");
        };
        assert_eq!(table.headers, vec!["Content"]);
        assert_eq!(table.rows, vec![vec!["42"]]);
    }

    #[test]
    fn yaml_mapping_root_becomes_mapping() {
        let DecodedContent::Mapping(map) = read(b"a: 1\nb: two\n", TypeTag::Yaml).unwrap() else {
            panic!("expected mapping");
        };
        assert_eq!(map.get("b"), Some(&Value::from("two")));
    }

    #[test]
    fn yaml_sequence_root_becomes_text() {
        let content = read(b"- one\n- two\n", TypeTag::Yaml).unwrap();
        let DecodedContent::Text(text) = content else {
            panic!("expected text");
        };
        assert!(text.contains("one"));
        assert!(text.contains("two"));
    }

    #[test]
    fn invalid_utf8_text_degrades_to_raw_bytes() {
        let data = [0xFF, 0xFE, 0x00, 0x01];
        let content = read(&data, TypeTag::Txt).unwrap();
        assert_eq!(content.kind(), ContentKind::RawBytes);
        let DecodedContent::RawBytes { bytes, tag } = content else {
            unreachable!();
        };
        assert_eq!(bytes, data);
        assert_eq!(tag, TypeTag::Unknown);
    }

    #[test]
    fn image_bytes_pass_through_with_their_tag() {
        let data = b"\x89PNG\r\n\x1a\nrest";
        let DecodedContent::RawBytes { bytes, tag } = read(data, TypeTag::Png).unwrap() else {
            panic!("expected raw bytes");
        };
        assert_eq!(tag, TypeTag::Png);
        assert_eq!(bytes, data);
    }

    #[test]
    fn malformed_pdf_raises_read_error() {
        let err = read(b"%PDF-1.4 but not actually a pdf", TypeTag::Pdf).unwrap_err();
        assert!(matches!(err, ReadError::Pdf(_)));
    }

    #[test]
    fn malformed_json_raises_read_error() {
        let err = read(b"{not json", TypeTag::Json).unwrap_err();
        assert!(matches!(err, ReadError::Json(_)));
    }
}
