//! Delimited-file codec for dataset and checkpoint tables.
//!
//! Format, matching the files the rest of the toolchain exchanges:
//! - UTF-8, comma-delimited, `\n` line terminator
//! - every field quoted; `\` escapes embedded quotes and itself
//! - an empty field is a null value
//!
//! A leading byte-order mark (spreadsheet exports) is tolerated on read.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use bookfill_core::{Fields, Record};
use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use tracing::debug;

use crate::StoreError;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read every row of a table, keeping the header's column order.
pub fn read_table(path: &Path) -> Result<Vec<Fields>, StoreError> {
    if !path.exists() {
        return Err(StoreError::TableNotFound(path.to_path_buf()));
    }
    let mut input = BufReader::new(File::open(path)?);
    if input.fill_buf()?.starts_with(BOM) {
        input.consume(BOM.len());
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .double_quote(true)
        .escape(Some(b'\\'))
        .from_reader(input);

    let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let fields: Fields = header
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.as_str(), Some(value.to_string())))
            .collect();
        rows.push(fields);
    }

    debug!(path = %path.display(), rows = rows.len(), "read table");
    Ok(rows)
}

/// Read a dataset as records identified by `key_column`.
pub fn read_records(path: &Path, key_column: &str) -> Result<Vec<Record>, StoreError> {
    let rows = read_table(path)?;
    if let Some(first) = rows.first()
        && !first.contains(key_column)
    {
        return Err(StoreError::MissingColumn {
            path: path.to_path_buf(),
            column: key_column.to_string(),
        });
    }

    rows.into_iter()
        .enumerate()
        .map(|(i, fields)| {
            Record::new(key_column, fields).map_err(|source| StoreError::Record {
                path: path.to_path_buf(),
                row: i + 1,
                source,
            })
        })
        .collect()
}

/// Overwrite `path` with `rows`.
///
/// The header is the union of all rows' columns in first-seen order; a row
/// missing a column writes it as empty. The file is written to a temporary
/// sibling and renamed over `path`, so readers only ever see a complete table.
pub fn write_table<'a, I>(path: &Path, rows: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a Fields>,
{
    let rows: Vec<&Fields> = rows.into_iter().collect();
    let header = header_union(&rows);
    write_rows(path, &header, &rows)
}

fn write_rows(path: &Path, header: &[String], rows: &[&Fields]) -> Result<usize, StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .double_quote(false)
            .escape(b'\\')
            .terminator(Terminator::Any(b'\n'))
            .from_writer(tmp.as_file_mut());

        writer.write_record(header)?;
        for row in rows {
            writer.write_record(
                header
                    .iter()
                    .map(|column| escape_backslashes(row.get(column).unwrap_or(""))),
            )?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(rows.len())
}

/// Write a single-column table of keys. An empty list still writes the
/// header, so an empty quarantine round-trips.
pub fn write_keys(path: &Path, column: &str, keys: &[String]) -> Result<usize, StoreError> {
    let rows: Vec<Fields> = keys
        .iter()
        .map(|k| [(column, Some(k.clone()))].into_iter().collect())
        .collect();
    let rows: Vec<&Fields> = rows.iter().collect();
    write_rows(path, &[column.to_string()], &rows)
}

/// The writer escapes quotes but not the escape byte itself.
fn escape_backslashes(value: &str) -> String {
    value.replace('\\', "\\\\")
}

fn header_union(rows: &[&Fields]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for row in rows {
        for name in row.names() {
            if !header.iter().any(|h| h == name) {
                header.push(name.to_string());
            }
        }
    }
    header
}
