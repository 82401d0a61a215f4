//! Result Output
//!
//! Streams one record per document to a writer (stdout in the binary):
//! JSON lines, or CSV/TSV with a header row and a fixed column order.

use std::io::Write;

use crate::config::OutputFormat;
use crate::types::{ClassificationResult, Result};

/// Column order for delimited output
pub const COLUMNS: &[&str] = &[
    "original",
    "suggested_path",
    "suggested_name",
    "full_path",
    "domain",
    "category",
    "doctype",
    "vendor",
    "date",
    "subject",
    "status",
    "notes",
];

pub struct ResultWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    header_written: bool,
    records: usize,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            header_written: false,
            records: 0,
        }
    }

    /// Write one record and flush so downstream consumers see it immediately
    pub fn write(&mut self, result: &ClassificationResult) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, result)?;
                self.writer.write_all(b"\n")?;
            }
            OutputFormat::Csv | OutputFormat::Tsv => {
                if !self.header_written {
                    self.write_row(COLUMNS.iter().copied())?;
                    self.header_written = true;
                }
                let fields = row(result);
                self.write_row(fields.iter().map(String::as_str))?;
            }
        }
        self.writer.flush()?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_row<'a>(&mut self, fields: impl Iterator<Item = &'a str>) -> Result<()> {
        let (separator, escape): (&str, fn(&str) -> String) = match self.format {
            OutputFormat::Tsv => ("\t", escape_tsv),
            _ => (",", escape_csv),
        };
        let line = fields.map(escape).collect::<Vec<_>>().join(separator);
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

fn row(result: &ClassificationResult) -> Vec<String> {
    let meta = &result.metadata;
    vec![
        result.original.clone(),
        result.suggested_path.clone(),
        result.suggested_name.clone(),
        result.full_path.clone(),
        meta.domain.clone(),
        meta.category.clone(),
        meta.doctype.clone(),
        meta.vendor.clone(),
        meta.date.clone(),
        meta.subject.clone(),
        result.status.to_string(),
        result.notes.clone(),
    ]
}

/// RFC 4180 quoting for commas and quotes. Line breaks become spaces so each
/// record stays on one line.
fn escape_csv(field: &str) -> String {
    let field = field.replace(['\n', '\r'], " ");
    if field.contains([',', '"']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field
    }
}

/// Tabs and line breaks become spaces; TSV has no quoting
fn escape_tsv(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}
