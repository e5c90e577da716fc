//! Tabular export to CSV files
//!
//! File names are `<name><YYYYMMDDHHmmss>.csv` unless timestamps are disabled
//! (name only) or no name is given (timestamp only).

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use toolite_common::{Error, Result};
use tracing::debug;

/// Timestamp layout appended to file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// A 2-D table. Cells are JSON scalars; strings are written raw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: Option<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    pub fn new(rows: Vec<Vec<Value>>) -> Self {
        Self { name: None, rows }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Where and under which name exports are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output directory, created on demand
    pub dir: PathBuf,
    /// Base file name without extension
    pub file_name: Option<String>,
    /// Append a `YYYYMMDDHHmmss` timestamp to the file name
    pub with_timestamp: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file_name: None,
            with_timestamp: true,
        }
    }
}

impl ExportOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_timestamp(mut self, with_timestamp: bool) -> Self {
        self.with_timestamp = with_timestamp;
        self
    }

    /// File name stem for an export taken at `now`
    pub fn file_stem(&self, now: NaiveDateTime) -> String {
        let stamp = now.format(TIMESTAMP_FORMAT).to_string();
        match self.file_name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) if self.with_timestamp => format!("{}{}", name, stamp),
            Some(name) => name.to_string(),
            None => stamp,
        }
    }
}

/// Write `sheet` as one CSV file and return its path
pub fn export_csv(sheet: &Sheet, options: &ExportOptions) -> Result<PathBuf> {
    check_file_part("file name", options.file_name.as_deref())?;
    let stem = options.file_stem(Local::now().naive_local());
    let path = options.dir.join(format!("{}.csv", stem));
    fs::create_dir_all(&options.dir)?;
    write_sheet(&path, sheet)?;
    Ok(path)
}

/// Write one CSV file per sheet, named `<stem>_<sheet name>.csv`.
///
/// Unnamed sheets become `Sheet<n>` (1-based). Duplicate sheet names and
/// names that would leave `dir` are rejected before anything is written.
pub fn export_many(sheets: &[Sheet], options: &ExportOptions) -> Result<Vec<PathBuf>> {
    if sheets.is_empty() {
        return Err(Error::export("no sheets to export"));
    }
    check_file_part("file name", options.file_name.as_deref())?;
    for sheet in sheets {
        check_file_part("sheet name", sheet.name.as_deref())?;
    }

    let names: Vec<String> = sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| match sheet.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Sheet{}", i + 1),
        })
        .collect();
    let mut seen = HashSet::new();
    if let Some(dup) = names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(Error::export(format!("duplicate sheet name: {}", dup)));
    }

    let stem = options.file_stem(Local::now().naive_local());
    fs::create_dir_all(&options.dir)?;

    sheets
        .iter()
        .zip(&names)
        .map(|(sheet, name)| {
            let path = options.dir.join(format!("{}_{}.csv", stem, name));
            write_sheet(&path, sheet)?;
            Ok(path)
        })
        .collect()
}

/// Names become part of a single file name: no separators, no `.`/`..`
fn check_file_part(kind: &str, name: Option<&str>) -> Result<()> {
    let Some(name) = name else {
        return Ok(());
    };
    let bad = matches!(name, "." | "..")
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(Error::export(format!("invalid {}: {:?}", kind, name)));
    }
    Ok(())
}

fn write_sheet(path: &Path, sheet: &Sheet) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for row in &sheet.rows {
        writer.write_record(row.iter().map(cell_text))?;
    }
    writer.flush()?;
    debug!("Exported {} row(s) to {}", sheet.rows.len(), path.display());
    Ok(())
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
