//! Text extraction from uploaded files.
//!
//! Dispatches on the lowercase file extension. Apart from a missing file,
//! failures never propagate: they come back as a descriptive string so that
//! one bad file does not abort a processing batch.

use crate::error::{Result, StudyBoxError};
use std::path::Path;
use tracing::{debug, warn};

/// How a file's content is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorType {
    PlainText,
    Json,
    Csv,
    Audio,
    Unsupported,
}

impl ExtractorType {
    /// Pick the extractor for a path by its extension.
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("txt" | "md" | "py") => ExtractorType::PlainText,
            Some("json") => ExtractorType::Json,
            Some("csv") => ExtractorType::Csv,
            Some("mp3" | "wav") => ExtractorType::Audio,
            _ => ExtractorType::Unsupported,
        }
    }
}

/// Extracts plain text from supported file types.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text of `path`.
    ///
    /// Fails only when the file does not exist.
    pub fn extract(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(StudyBoxError::NotFound(format!(
                "File {} does not exist",
                path.display()
            )));
        }

        let kind = ExtractorType::detect(path);
        debug!("Extracting {} as {:?}", path.display(), kind);

        Ok(Self::extract_as(path, kind).unwrap_or_else(|e| {
            warn!("Extraction failed for {}: {}", path.display(), e);
            format!("[Error reading {}: {}]", display_name(path), e)
        }))
    }

    fn extract_as(path: &Path, kind: ExtractorType) -> Result<String> {
        match kind {
            ExtractorType::PlainText => Self::extract_plain(path),
            ExtractorType::Json => Self::extract_json(path),
            ExtractorType::Csv => Self::extract_csv(path),
            ExtractorType::Audio => Ok(format!(
                "Simulated transcription of audio file {}",
                display_name(path)
            )),
            ExtractorType::Unsupported => {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{}", e.to_lowercase()))
                    .unwrap_or_else(|| "(no extension)".to_string());
                Ok(format!("[Unsupported file type: {}]", ext))
            }
        }
    }

    fn extract_plain(path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn extract_json(path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        Ok(format!("JSON content:\n{}", serde_json::to_string_pretty(&value)?))
    }

    fn extract_csv(path: &Path) -> Result<String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        let mut lines = Vec::new();
        for record in reader.records() {
            let record = record?;
            lines.push(record.iter().collect::<Vec<_>>().join(" | "));
        }

        Ok(format!("CSV content:\n{}", lines.join("\n")))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_detect() {
        assert_eq!(ExtractorType::detect(Path::new("a.TXT")), ExtractorType::PlainText);
        assert_eq!(ExtractorType::detect(Path::new("b.md")), ExtractorType::PlainText);
        assert_eq!(ExtractorType::detect(Path::new("c.py")), ExtractorType::PlainText);
        assert_eq!(ExtractorType::detect(Path::new("d.Json")), ExtractorType::Json);
        assert_eq!(ExtractorType::detect(Path::new("e.csv")), ExtractorType::Csv);
        assert_eq!(ExtractorType::detect(Path::new("f.wav")), ExtractorType::Audio);
        assert_eq!(ExtractorType::detect(Path::new("g.pdf")), ExtractorType::Unsupported);
        assert_eq!(ExtractorType::detect(Path::new("Makefile")), ExtractorType::Unsupported);
    }

    #[test]
    fn test_plain_text_formats() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = TextExtractor::new();

        for name in ["notes.txt", "readme.md", "script.py"] {
            let path = write(dir.path(), name, "def f():\n    return 1\n");
            assert_eq!(extractor.extract(&path).unwrap(), "def f():\n    return 1\n");
        }
    }

    #[test]
    fn test_json_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "data.json", r#"{"topic":"cells","pages":3}"#);

        let text = TextExtractor::new().extract(&path).unwrap();
        assert!(text.starts_with("JSON content:\n{"));
        assert!(text.contains("\"topic\": \"cells\""));
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_csv_rows_joined() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "table.csv", "term,meaning\natom,smallest unit\ncell,unit of life,extra\n");

        let text = TextExtractor::new().extract(&path).unwrap();
        assert_eq!(
            text,
            "CSV content:\nterm | meaning\natom | smallest unit\ncell | unit of life | extra"
        );
    }

    #[test]
    fn test_unsupported_extension_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "slides.PDF", "%PDF-1.4");

        let text = TextExtractor::new().extract(&path).unwrap();
        assert_eq!(text, "[Unsupported file type: .pdf]");
    }

    #[test]
    fn test_audio_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "lecture.mp3", "ID3");

        let text = TextExtractor::new().extract(&path).unwrap();
        assert_eq!(text, "Simulated transcription of audio file lecture.mp3");
    }

    #[test]
    fn test_broken_json_becomes_error_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "broken.json", "{not json");

        let text = TextExtractor::new().extract(&path).unwrap();
        assert!(text.starts_with("[Error reading broken.json:"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = TextExtractor::new()
            .extract(Path::new("/no/such/file.txt"))
            .unwrap_err();
        assert!(matches!(err, StudyBoxError::NotFound(_)));
    }
}
