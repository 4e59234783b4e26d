//! Menu steps shared by saved flashcard sets and quizzes.

use crate::cli::{Console, Output};
use crate::tools::artifact::{export_records, load_records, modify_record, render_text};
use crate::tools::text::preview;
use crate::tools::{ExportFormat, Exported, StudyRecord};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Print saved artifacts, newest last.
pub fn list_artifacts(paths: &[PathBuf], empty_hint: &str) {
    if paths.is_empty() {
        Output::info(empty_hint);
        return;
    }
    for (i, path) in paths.iter().enumerate() {
        let size = std::fs::metadata(path).ok().map(|m| m.len());
        Output::file_entry(i + 1, &file_name(path), size);
    }
}

/// Ask which artifact to use. ENTER picks the newest one.
pub fn pick_artifact(paths: &[PathBuf], empty_hint: &str, console: &mut Console) -> Result<Option<PathBuf>> {
    if paths.is_empty() {
        Output::info(empty_hint);
        return Ok(None);
    }
    list_artifacts(paths, empty_hint);
    let Some(answer) = console.prompt(&format!("Number (ENTER for newest, 1-{}):", paths.len()))? else {
        return Ok(None);
    };
    Ok(resolve_pick(paths, &answer))
}

fn resolve_pick(paths: &[PathBuf], answer: &str) -> Option<PathBuf> {
    if answer.trim().is_empty() {
        return paths.last().cloned();
    }
    match answer.trim().parse::<usize>() {
        Ok(n) if (1..=paths.len()).contains(&n) => Some(paths[n - 1].clone()),
        _ => {
            Output::warning(&format!("Invalid option '{}'.", answer));
            None
        }
    }
}

/// Print every record of a saved artifact.
pub fn view<T: StudyRecord>(path: &Path, title: &str) -> Result<()> {
    let records: Vec<T> = load_records(path)?;
    println!("\n{}", render_text(title, &records).trim_end());
    Ok(())
}

/// Edit the question and/or answer of one record. Blank input keeps the old value.
pub fn modify<T: StudyRecord>(path: &Path, console: &mut Console) -> Result<()> {
    let records: Vec<T> = load_records(path)?;
    for (i, record) in records.iter().enumerate() {
        Output::menu_item(&(i + 1).to_string(), &preview(record.question(), 70));
    }

    let Some(answer) = console.prompt("Number to modify:")? else {
        return Ok(());
    };
    let index = match answer.parse::<usize>() {
        Ok(n) if (1..=records.len()).contains(&n) => n - 1,
        _ => {
            Output::warning(&format!("Invalid option '{}'.", answer));
            return Ok(());
        }
    };

    let current = &records[index];
    Output::kv("Question", current.question());
    let Some(question) = console.prompt("New question (ENTER to keep):")? else {
        return Ok(());
    };
    Output::kv("Answer", current.answer());
    let Some(new_answer) = console.prompt("New answer (ENTER to keep):")? else {
        return Ok(());
    };

    let updated: T = modify_record(path, index, Some(question), Some(new_answer))?;
    Output::success("Saved.");
    println!("{}", updated.text_block(index + 1));
    Ok(())
}

/// Export a saved artifact to a text file, a CSV file, or the clipboard.
pub fn export<T: StudyRecord>(path: &Path, title: &str, console: &mut Console) -> Result<()> {
    Output::menu_item("1", "Text file (.txt)");
    Output::menu_item("2", "Spreadsheet (.csv)");
    Output::menu_item("3", "Copy to clipboard");
    let Some(answer) = console.prompt("Format:")? else {
        return Ok(());
    };
    let format: ExportFormat = answer.parse()?;

    match export_records::<T>(path, title, format)? {
        Exported::File(dest) => Output::success(&format!("Exported to {}", dest.display())),
        Exported::Clipboard => Output::success("Copied to clipboard."),
    }
    Ok(())
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
