//! CSV ingestion and cleaning.
//!
//! The cleaned dataset is a CSV file with a header and five fields per record: title, text, subject,
//! date (`DD-MM-YYYY`) and label (`TRUE`/`FAKE`). Fields may be quoted; a quoted field can contain
//! commas, doubled quotes and line breaks. A quote inside an unquoted field is a literal character.
//! Malformed records are dropped, never fatal.

use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::io;
use std::io::prelude::*;

use chrono::NaiveDate;
use csv;
use log;
use serde;

use crate::record::{Article, Label, MISSING};
use crate::store::RecordStore;

/// Header of a cleaned dataset.
pub const HEADER: [&str; 5] = ["title", "text", "subject", "date", "label"];

/// Formats accepted by [`normalize_date`].
const DATE_FORMATS: [&str; 4] = ["%d-%m-%Y", "%Y-%m-%d", "%B %d, %Y", "%b %d, %Y"];

/// Load error.
#[derive(Debug)]
pub enum LoadError {
    /// Common I/O error.
    IO(io::Error),
    /// CSV reading or writing error that affects the whole stream.
    CSV(csv::Error),
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(match &self {
            LoadError::IO(err) => err,
            LoadError::CSV(err) => err,
        })
    }
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self {
            LoadError::IO(err) => write!(f, "I/O operation failed: {}", err),
            LoadError::CSV(err) => write!(f, "CSV stream error: {}", err),
        }
    }
}

/// Record counters of a load.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadSummary {
    /// Records stored.
    pub accepted: usize,
    /// Malformed records.
    pub dropped: usize,
    /// Well-formed records beyond the store limit.
    pub ignored: usize,
}

/// Cleans a single field: line breaks and tabs become a single space, other control characters
/// are dropped and surrounding whitespace is trimmed. An empty result becomes [`MISSING`].
pub fn clean_field(field: &str) -> String {
    let mut cleaned = String::with_capacity(field.len());
    let mut last_was_break = false;

    for ch in field.chars() {
        if ch == '\n' || ch == '\r' || ch == '\t' {
            if !last_was_break {
                cleaned.push(' ');
                last_was_break = true;
            }
        } else if !ch.is_control() && ch != '\u{feff}' {
            cleaned.push(ch);
            last_was_break = false;
        }
    }

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        MISSING.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parses one record of a cleaned dataset.
/// Returns [`None`] unless the record has exactly five fields and a `TRUE`/`FAKE` label.
pub fn parse_fields(record: &csv::StringRecord) -> Option<Article> {
    if record.len() != 5 {
        return None;
    }

    let label = Label::parse(&clean_field(&record[4]))?;

    Some(Article::new(
        clean_field(&record[0]),
        clean_field(&record[1]),
        clean_field(&record[2]),
        clean_field(&record[3]),
        label,
    ))
}

/// Parses a single CSV record given as text. See [`parse_fields`].
pub fn parse_record(raw_record: &str) -> Option<Article> {
    let mut reader = record_reader(raw_record.as_bytes(), false);
    let record = reader.records().next()?.ok()?;
    return parse_fields(&record);
}

/// Converts a date to `DD-MM-YYYY`. Accepts `DD-MM-YYYY`, `YYYY-MM-DD`, `Month D, YYYY`
/// and `Mon D, YYYY`. Returns [`None`] for anything else, including impossible calendar dates.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(|date| date.format("%d-%m-%Y").to_string())
}

fn record_reader<R: Read>(reader: R, has_headers: bool) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_reader(reader)
}

/// Reads the next record. Stream failures are returned as errors; a record that cannot be decoded
/// is reported as [`None`] and reading goes on with the next one.
fn next_record<R: Read>(
    records: &mut csv::StringRecordsIter<'_, R>,
) -> Option<Result<Option<csv::StringRecord>, LoadError>> {
    match records.next()? {
        Ok(record) => Some(Ok(Some(record))),
        Err(err) if err.is_io_error() => Some(Err(LoadError::CSV(err))),
        Err(err) => {
            log::trace!("undecodable record skipped: {}", err);
            Some(Ok(None))
        }
    }
}

/// Loads a cleaned dataset into a store. The first record is the header and is skipped;
/// empty lines are skipped silently.
pub fn load_into<S, R>(store: &mut S, reader: R) -> Result<LoadSummary, LoadError>
where
    S: RecordStore,
    R: Read,
{
    let mut summary = LoadSummary::default();
    let mut reader = record_reader(reader, true);
    let mut records = reader.records();

    let mut index = 0;
    while let Some(record) = next_record(&mut records) {
        index += 1;

        match record?.as_ref().and_then(parse_fields) {
            Some(article) => {
                if store.push(article) {
                    summary.accepted += 1;
                } else {
                    summary.ignored += 1;
                }
            }
            None => {
                log::trace!("malformed record {} dropped", index);
                summary.dropped += 1;
            }
        }
    }

    if summary.ignored > 0 {
        log::warn!("record limit {} reached, {} records ignored", store.limit(), summary.ignored);
    }
    log::info!(
        "{} records loaded ({} malformed records dropped)",
        summary.accepted,
        summary.dropped
    );

    return Ok(summary);
}

/// Cleans a raw source record (title, text, subject, date) and appends the label.
/// The date is normalized when possible. Returns [`None`] unless the record has exactly four fields.
pub fn clean_record(record: &csv::StringRecord, label: Label) -> Option<Vec<String>> {
    if record.len() != 4 {
        return None;
    }

    let mut fields: Vec<String> = record.iter().map(clean_field).collect();
    if let Some(date) = normalize_date(&fields[3]) {
        fields[3] = date;
    }
    fields.push(label.as_str().to_string());

    Some(fields)
}

/// Merges the raw fake and true sources into one cleaned dataset written to `output`.
/// Each source starts with a header record that is skipped.
pub fn merge_sources<F, T, W>(fake: F, truth: T, output: W) -> Result<LoadSummary, LoadError>
where
    F: Read,
    T: Read,
    W: Write,
{
    let mut summary = LoadSummary::default();
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(&HEADER).map_err(LoadError::CSV)?;
    append_source(fake, Label::Fake, &mut writer, &mut summary)?;
    append_source(truth, Label::True, &mut writer, &mut summary)?;
    writer.flush().map_err(LoadError::IO)?;

    log::info!(
        "sources merged: {} records written, {} malformed records dropped",
        summary.accepted,
        summary.dropped
    );

    return Ok(summary);
}

fn append_source<R, W>(
    source: R,
    label: Label,
    writer: &mut csv::Writer<W>,
    summary: &mut LoadSummary,
) -> Result<(), LoadError>
where
    R: Read,
    W: Write,
{
    let mut reader = record_reader(source, true);
    let mut records = reader.records();

    let mut index = 0;
    while let Some(record) = next_record(&mut records) {
        index += 1;

        match record?.and_then(|record| clean_record(&record, label)) {
            Some(fields) => {
                writer.write_record(&fields).map_err(LoadError::CSV)?;
                summary.accepted += 1;
            }
            None => {
                log::trace!("malformed {} source record {} dropped", label, index);
                summary.dropped += 1;
            }
        }
    }

    return Ok(());
}
