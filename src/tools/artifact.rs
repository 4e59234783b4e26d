//! Persisted study sets: JSON storage, editing, and export.

use crate::error::{Result, StudyBoxError};
use crate::storage::write_atomic;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// A record in a saved study set (a flashcard or a quiz question).
pub trait StudyRecord: Serialize + DeserializeOwned + Clone {
    /// Header row for CSV export.
    fn csv_header() -> &'static [&'static str];

    /// Fields in header order.
    fn csv_row(&self) -> Vec<String>;

    /// Human-readable block for text export and display; `number` is 1-based.
    fn text_block(&self, number: usize) -> String;

    fn question(&self) -> &str;

    fn answer(&self) -> &str;

    fn set_question(&mut self, question: String);

    /// Replace the answer, validating it for the record type.
    fn set_answer(&mut self, answer: String) -> Result<()>;
}

/// Export targets for a study set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
    Clipboard,
}

impl std::str::FromStr for ExportFormat {
    type Err = StudyBoxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "txt" | "text" => Ok(ExportFormat::Text),
            "2" | "csv" => Ok(ExportFormat::Csv),
            "3" | "clipboard" | "copy" => Ok(ExportFormat::Clipboard),
            other => Err(StudyBoxError::InvalidInput(format!(
                "Unknown export format: {}",
                other
            ))),
        }
    }
}

/// Result of an export.
#[derive(Debug, Clone, PartialEq)]
pub enum Exported {
    File(PathBuf),
    Clipboard,
}

/// Write records as a JSON array.
pub fn save_records<T: StudyRecord>(path: &Path, records: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    write_atomic(path, json.as_bytes())?;
    debug!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read a JSON array of records.
pub fn load_records<T: StudyRecord>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Err(StudyBoxError::NotFound(format!(
            "Study set {} does not exist",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Edit one record in place and rewrite the file. `index` is 0-based.
///
/// `None` keeps the current value.
pub fn modify_record<T: StudyRecord>(
    path: &Path,
    index: usize,
    question: Option<String>,
    answer: Option<String>,
) -> Result<T> {
    let mut records: Vec<T> = load_records(path)?;
    let total = records.len();
    let record = records.get_mut(index).ok_or_else(|| {
        StudyBoxError::InvalidInput(format!(
            "Record {} does not exist (set has {})",
            index + 1,
            total
        ))
    })?;

    if let Some(question) = question.filter(|q| !q.trim().is_empty()) {
        record.set_question(question.trim().to_string());
    }
    if let Some(answer) = answer.filter(|a| !a.trim().is_empty()) {
        record.set_answer(answer.trim().to_string())?;
    }
    let updated = record.clone();

    save_records(path, &records)?;
    info!("Updated record {} in {}", index + 1, path.display());
    Ok(updated)
}

/// Plain-text rendering of a whole set.
pub fn render_text<T: StudyRecord>(title: &str, records: &[T]) -> String {
    let mut out = format!("{}\n{}\n\n", title, "=".repeat(title.chars().count()));
    for (i, record) in records.iter().enumerate() {
        out.push_str(&record.text_block(i + 1));
        out.push_str("\n\n");
    }
    out
}

/// CSV rendering of a whole set.
pub fn render_csv<T: StudyRecord>(records: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(T::csv_header())?;
    for record in records {
        writer.write_record(record.csv_row())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StudyBoxError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Export a saved set. Files are written next to the JSON artifact.
pub fn export_records<T: StudyRecord>(
    path: &Path,
    title: &str,
    format: ExportFormat,
) -> Result<Exported> {
    let records: Vec<T> = load_records(path)?;
    match format {
        ExportFormat::Text => {
            let dest = path.with_extension("txt");
            write_atomic(&dest, render_text(title, &records).as_bytes())?;
            info!("Exported {} records to {}", records.len(), dest.display());
            Ok(Exported::File(dest))
        }
        ExportFormat::Csv => {
            let dest = path.with_extension("csv");
            write_atomic(&dest, render_csv(&records)?.as_bytes())?;
            info!("Exported {} records to {}", records.len(), dest.display());
            Ok(Exported::File(dest))
        }
        ExportFormat::Clipboard => {
            copy_to_clipboard(&render_text(title, &records))?;
            Ok(Exported::Clipboard)
        }
    }
}

const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("clip", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Pipe text into the first clipboard utility that accepts it.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    for (program, args) in CLIPBOARD_COMMANDS {
        let child = Command::new(program)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let Ok(mut child) = child else {
            continue;
        };
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        if child.wait()?.success() {
            debug!("Copied {} bytes with {}", text.len(), program);
            return Ok(());
        }
    }

    Err(StudyBoxError::ToolNotFound(
        "No clipboard utility found (pbcopy, clip, wl-copy, xclip, xsel)".to_string(),
    ))
}
