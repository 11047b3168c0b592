//! CSV import of tags.
//!
//! Accepts the export format: the same column names, matched
//! case-insensitively and in any order. Only `Name` is mandatory; unknown
//! columns are ignored. Every data row is validated on its own, so one bad
//! line never rejects the whole file.

use serde::Serialize;

use crate::status::ConnectionStatus;
use crate::tag::{validate_tag, DataType, TagCandidate, TagSource};

/// Errors that reject the whole file.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("CSV is empty")]
    Empty,

    #[error("CSV header must contain a Name column")]
    MissingNameColumn,

    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A validated tag ready to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDraft {
    pub name: String,
    pub data_type: DataType,
    pub address: Option<String>,
    pub value: Option<String>,
    pub comment: Option<String>,
    pub group_name: Option<String>,
    pub active: bool,
    pub retain: bool,
    pub data_source: TagSource,
    pub connection_status: ConnectionStatus,
}

/// A data row that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportLineError {
    /// 1-based line in the input, counting the header as line 1.
    pub line: u64,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub drafts: Vec<TagDraft>,
    pub errors: Vec<ImportLineError>,
}

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct Columns {
    name: usize,
    data_type: Option<usize>,
    address: Option<usize>,
    value: Option<usize>,
    comment: Option<usize>,
    group: Option<usize>,
    active: Option<usize>,
    retain: Option<usize>,
    data_source: Option<usize>,
    status: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, ImportError> {
        let find = |label: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(label));
        Ok(Self {
            name: find("Name").ok_or(ImportError::MissingNameColumn)?,
            data_type: find("Type"),
            address: find("Address"),
            value: find("Value"),
            comment: find("Comment"),
            group: find("Group"),
            active: find("Active"),
            retain: find("Retain"),
            data_source: find("DataSource"),
            status: find("Status"),
        })
    }
}

/// Read a keyword field (type, source, status, flag) at `index`, trimmed.
/// An absent or blank cell is `None`.
fn cell(record: &csv::StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Read a free-text field at `index` as written, surrounding spaces included.
/// An absent or blank cell is `None`.
fn text_cell(record: &csv::StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .filter(|value| !value.trim().is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn flag(
    record: &csv::StringRecord,
    index: Option<usize>,
    label: &str,
    default: bool,
    messages: &mut Vec<String>,
) -> bool {
    match cell(record, index) {
        None => default,
        Some(raw) => parse_flag(raw).unwrap_or_else(|| {
            messages.push(format!("{label} must be true or false, got \"{raw}\""));
            default
        }),
    }
}

fn draft_from_record(
    record: &csv::StringRecord,
    columns: &Columns,
) -> Result<TagDraft, Vec<String>> {
    let name = record.get(columns.name).unwrap_or_default().trim();
    let data_type = cell(record, columns.data_type).unwrap_or(DataType::Bool.as_str());
    let data_source = cell(record, columns.data_source).unwrap_or(TagSource::Internal.as_str());

    let mut messages = validate_tag(&TagCandidate {
        name: Some(name),
        data_type: Some(data_type),
        data_source: Some(data_source),
        ..Default::default()
    });

    let active = flag(record, columns.active, "Active", true, &mut messages);
    let retain = flag(record, columns.retain, "Retain", false, &mut messages);

    let connection_status = match cell(record, columns.status) {
        None => ConnectionStatus::Disconnected,
        Some(raw) => raw.parse::<ConnectionStatus>().unwrap_or_else(|e| {
            messages.push(e);
            ConnectionStatus::Disconnected
        }),
    };

    // validate_tag already reported unparseable enums.
    let (Ok(data_type), Ok(data_source)) = (
        data_type.parse::<DataType>(),
        data_source.parse::<TagSource>(),
    ) else {
        return Err(messages);
    };
    if !messages.is_empty() {
        return Err(messages);
    }

    Ok(TagDraft {
        name: name.to_string(),
        data_type,
        address: text_cell(record, columns.address).map(str::to_string),
        value: text_cell(record, columns.value).map(str::to_string),
        comment: text_cell(record, columns.comment).map(str::to_string),
        group_name: text_cell(record, columns.group).map(str::to_string),
        active,
        retain,
        data_source,
        connection_status,
    })
}

/// Parse CSV text into tag drafts plus per-line errors.
///
/// Blank rows are skipped. A malformed header or undecodable CSV rejects the
/// whole input.
pub fn import_csv(text: &str) -> Result<ImportReport, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let columns = Columns::resolve(reader.headers()?)?;
    let mut report = ImportReport::default();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        match draft_from_record(&record, &columns) {
            Ok(draft) => report.drafts.push(draft),
            Err(messages) => report.errors.push(ImportLineError { line, messages }),
        }
    }

    Ok(report)
}
