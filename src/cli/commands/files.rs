//! Upload, process, list and delete stored files.

use crate::cli::{format_size, Console, Output};
use crate::config::Settings;
use crate::session::{parse_selection, Selection, Session};
use crate::storage::FileStore;
use anyhow::Result;
use console::style;
use std::path::{Path, PathBuf};

/// Turn a typed or drag-and-dropped path into a path: quotes are stripped and `~` expanded.
pub fn clean_input_path(input: &str) -> PathBuf {
    let trimmed = input.trim().trim_matches(|c| c == '"' || c == '\'');
    Settings::expand_path(trimmed)
}

/// Run the upload command.
pub fn run_upload(session: &mut Session, path: &str) -> Result<()> {
    let file = session.upload(&clean_input_path(path))?;
    Output::success(&format!(
        "Uploaded {} ({})",
        file.name(),
        format_size(file.size)
    ));
    Ok(())
}

/// Ask for a path and upload it.
pub fn upload_interactive(session: &mut Session, console: &mut Console) -> Result<()> {
    Output::header("Upload File");
    Output::info(&format!(
        "Supported types: {}",
        FileStore::supported_extensions().join(" ")
    ));
    let Some(input) = console.prompt("File path:")? else {
        return Ok(());
    };
    if input.is_empty() {
        Output::warning("No path given.");
        return Ok(());
    }
    run_upload(session, &input)
}

/// Pick files, then extract their text for the study tools.
pub async fn process_interactive(session: &mut Session, console: &mut Console) -> Result<()> {
    Output::header("Process Files");
    let files = session.begin_selection()?;
    if files.is_empty() {
        session.cancel_selection();
        Output::warning("No files available. Upload a file first (option 1).");
        return Ok(());
    }

    print_paths(&files);
    println!();
    let answer = console.prompt("Files to process (e.g. 1,3 or 'all', 0 to cancel):")?;
    let Some(answer) = answer else {
        session.cancel_selection();
        return Ok(());
    };

    let selection = parse_selection(&answer, files.len());
    if let Selection::Indices { invalid, .. } = &selection {
        for token in invalid {
            Output::warning(&format!("Ignoring invalid selection '{}'", token));
        }
    }
    if selection == Selection::Cancel {
        session.cancel_selection();
        Output::info("Processing cancelled.");
        return Ok(());
    }

    let chosen = Session::resolve_selection(&files, &selection);
    if chosen.is_empty() {
        session.cancel_selection();
        Output::warning("No valid files selected.");
        return Ok(());
    }

    let spinner = Output::spinner(&format!("Processing {} file(s)...", chosen.len()));
    let report = console.interruptible(session.process(&chosen)).await;
    spinner.finish_and_clear();
    let Some(report) = report else {
        session.cancel_selection();
        Output::interrupted("Processing");
        return Ok(());
    };
    let report = report?;

    for file in &report.processed {
        Output::success(&format!("{} ({} characters)", display_name(&file.path), file.chars));
        println!("     {}", style(&file.preview).dim());
    }
    for (path, reason) in &report.failed {
        Output::error(&format!("{}: {}", display_name(path), reason));
    }

    if session.has_content() {
        Output::success(&format!(
            "{} file(s) ready. The study tools (options 4-8, 10) now use this content.",
            report.processed.len()
        ));
    }
    Ok(())
}

/// Show stored files, then ask which one to delete.
pub fn delete_interactive(session: &mut Session, console: &mut Console) -> Result<()> {
    Output::header("Delete File");
    if !print_stored(session.store())? {
        return Ok(());
    }
    let Some(name) = console.prompt("Name of the file to delete:")? else {
        return Ok(());
    };
    if name.is_empty() {
        return Ok(());
    }
    run_delete(session, &name)
}

/// Run the delete command.
pub fn run_delete(session: &mut Session, name: &str) -> Result<()> {
    if session.delete(name)? {
        Output::success(&format!("Deleted {}", name));
    } else {
        Output::warning(&format!("File '{}' does not exist.", name));
    }
    Ok(())
}

/// Run the list command.
pub fn run_list(session: &Session) -> Result<()> {
    Output::header("Stored Files");
    if print_stored(session.store())? {
        println!();
        Output::kv("Storage", &session.store().root().display().to_string());
        let processed = session.extracted().len();
        if processed > 0 {
            Output::kv("Processed this session", &processed.to_string());
        }
    }
    Ok(())
}

/// Run the extensions command.
pub fn run_extensions() {
    Output::header("Supported Extensions");
    for ext in FileStore::supported_extensions() {
        let note = match *ext {
            ".txt" | ".md" | ".py" => "plain text",
            ".json" => "JSON, pretty-printed",
            ".csv" => "CSV rows",
            ".mp3" | ".wav" => "audio (placeholder transcription)",
            _ => "",
        };
        Output::list_item(&format!("{:<6} {}", ext, style(note).dim()));
    }
}

/// Add stored files that are missing from the session list.
pub fn run_reload(session: &mut Session) -> Result<()> {
    let count = session.reload_from_storage()?;
    if count == 0 {
        Output::info("No new files in storage.");
    } else {
        Output::success(&format!("{} file(s) loaded from storage.", count));
    }
    Ok(())
}

/// Print stored files with sizes. Returns false when there are none.
fn print_stored(store: &FileStore) -> Result<bool> {
    let mut names = store.list()?;
    if names.is_empty() {
        Output::info("No files stored yet. Upload one with option 1 or `studybox upload <path>`.");
        return Ok(false);
    }
    names.sort();
    for (i, name) in names.iter().enumerate() {
        Output::file_entry(i + 1, name, store.info(name).map(|info| info.size));
    }
    Ok(true)
}

fn print_paths(files: &[PathBuf]) {
    for (i, path) in files.iter().enumerate() {
        let size = std::fs::metadata(path).ok().map(|m| m.len());
        Output::file_entry(i + 1, &display_name(path), size);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
