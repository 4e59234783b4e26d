//! Local file storage for uploads and generated artifacts.
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/                  uploaded files, stored flat
//! <root>/flashcards/       flashcard sets (JSON)
//! <root>/quizzes/          quizzes (JSON)
//! <root>/audio_scripts/    audio scripts (text)
//! <root>/generated_audio/  synthesized audio
//! ```

use crate::error::{Result, StudyBoxError};
use chrono::Local;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extensions the extractor understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".txt", ".md", ".py", ".json", ".csv", ".mp3", ".wav"];

/// Kinds of generated artifacts, each stored in its own subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Flashcards,
    Quizzes,
    AudioScripts,
    GeneratedAudio,
}

impl ArtifactKind {
    /// Subdirectory name under the storage root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::Flashcards => "flashcards",
            ArtifactKind::Quizzes => "quizzes",
            ArtifactKind::AudioScripts => "audio_scripts",
            ArtifactKind::GeneratedAudio => "generated_audio",
        }
    }
}

/// Metadata about a stored upload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

/// Flat-file store rooted at a single directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extensions accepted for upload processing.
    pub fn supported_extensions() -> &'static [&'static str] {
        SUPPORTED_EXTENSIONS
    }

    fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Copy a file into storage and return its stored path.
    ///
    /// Name collisions get `_1`, `_2`, ... before the extension. Saving a file
    /// that already lives in the storage root returns its path unchanged.
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        if !path.is_file() {
            return Err(StudyBoxError::NotFound(format!(
                "File {} does not exist",
                path.display()
            )));
        }
        self.init()?;

        if self.is_stored(path) {
            debug!("{} is already in storage", path.display());
            return Ok(path.to_path_buf());
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StudyBoxError::InvalidInput(format!("Invalid file name: {}", path.display())))?;

        let dest = unique_path(&self.root.join(filename));
        std::fs::copy(path, &dest)?;
        info!("Stored {} as {}", path.display(), dest.display());
        Ok(dest)
    }

    fn is_stored(&self, path: &Path) -> bool {
        let (Ok(root), Ok(file)) = (self.root.canonicalize(), path.canonicalize()) else {
            return false;
        };
        file.parent() == Some(root.as_path())
    }

    /// List uploaded file names (regular files directly under the root).
    pub fn list(&self) -> Result<Vec<String>> {
        self.init()?;
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Delete an uploaded file by name. Returns false if it does not exist.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let Some(path) = self.resolve(name) else {
            return Ok(false);
        };
        if !path.is_file() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        info!("Deleted {}", path.display());
        Ok(true)
    }

    /// Look up size and path of an uploaded file.
    pub fn info(&self, name: &str) -> Option<FileInfo> {
        let path = self.resolve(name)?;
        let metadata = std::fs::metadata(&path).ok().filter(|m| m.is_file())?;
        Some(FileInfo {
            name: name.to_string(),
            size: metadata.len(),
            path,
        })
    }

    /// Map a bare file name to its stored path, rejecting anything with path components.
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let candidate = Path::new(name);
        match candidate.file_name() {
            Some(file_name) if file_name == candidate.as_os_str() => Some(self.root.join(name)),
            _ => None,
        }
    }

    /// Directory for an artifact kind, created on demand.
    pub fn artifact_dir(&self, kind: ArtifactKind) -> Result<PathBuf> {
        let dir = self.root.join(kind.dir_name());
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// A fresh timestamped path `<dir>/<stem>_<timestamp>.<ext>` for a new artifact.
    pub fn artifact_path(&self, kind: ArtifactKind, stem: &str, ext: &str) -> Result<PathBuf> {
        let dir = self.artifact_dir(kind)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
        Ok(unique_path(&dir.join(format!("{}_{}.{}", stem, timestamp, ext))))
    }

    /// Artifacts of a kind whose extension is in `extensions`, sorted by name.
    pub fn list_artifacts(&self, kind: ArtifactKind, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(kind.dir_name());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| extensions.contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

/// Write a file by renaming a temporary sibling over it.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.persist(path).map_err(|e| StudyBoxError::Io(e.error))?;
    Ok(())
}

/// First of `path`, `stem_1.ext`, `stem_2.ext`, ... that does not exist.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str());

    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{}_{}.{}", stem, n, ext)),
            None => dir.join(format!("{}_{}", stem, n)),
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_save_copies_into_root() {
        let src = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path().join("storage"));

        let file = write(src.path(), "notes.txt", "hello");
        let stored = store.save(&file).unwrap();

        assert_eq!(stored, root.path().join("storage").join("notes.txt"));
        assert_eq!(std::fs::read_to_string(&stored).unwrap(), "hello");
        assert!(file.exists());
    }

    #[test]
    fn test_save_collision_appends_suffix() {
        let src_a = tempfile::tempdir().unwrap();
        let src_b = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path());

        let first = store.save(&write(src_a.path(), "notes.txt", "a")).unwrap();
        let second = store.save(&write(src_b.path(), "notes.txt", "b")).unwrap();
        let third = store.save(&write(src_b.path(), "notes.txt", "c")).unwrap();

        assert_ne!(first, second);
        assert_eq!(second.file_name().unwrap(), "notes_1.txt");
        assert_eq!(third.file_name().unwrap(), "notes_2.txt");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "b");
    }

    #[test]
    fn test_save_already_stored_is_noop() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path());
        let stored = write(root.path(), "inside.md", "# title");

        let again = store.save(&stored).unwrap();
        assert_eq!(again, stored);
        assert_eq!(store.list().unwrap(), vec!["inside.md".to_string()]);
    }

    #[test]
    fn test_save_missing_file() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path());
        let err = store.save(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, StudyBoxError::NotFound(_)));
    }

    #[test]
    fn test_list_creates_root_and_skips_dirs() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path().join("fresh"));
        assert!(store.list().unwrap().is_empty());
        assert!(root.path().join("fresh").is_dir());

        store.artifact_dir(ArtifactKind::Quizzes).unwrap();
        write(store.root(), "a.txt", "x");
        assert_eq!(store.list().unwrap(), vec!["a.txt".to_string()]);
    }

    #[test]
    fn test_delete_missing_leaves_directory_unchanged() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path());
        write(root.path(), "keep.txt", "x");

        assert!(!store.delete("ghost.txt").unwrap());
        assert!(!store.delete("../keep.txt").unwrap());
        assert_eq!(store.list().unwrap(), vec!["keep.txt".to_string()]);

        assert!(store.delete("keep.txt").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_info() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path());
        write(root.path(), "data.csv", "a,b\n1,2\n");

        let info = store.info("data.csv").unwrap();
        assert_eq!(info.size, 8);
        assert_eq!(info.path, root.path().join("data.csv"));
        assert!(store.info("nope.csv").is_none());
    }

    #[test]
    fn test_artifact_paths_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let store = FileStore::new(root.path());

        let first = store.artifact_path(ArtifactKind::Quizzes, "quiz_medium", "json").unwrap();
        std::fs::write(&first, "[]").unwrap();
        let second = store.artifact_path(ArtifactKind::Quizzes, "quiz_medium", "json").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with(root.path().join("quizzes")));
        assert_eq!(
            store.list_artifacts(ArtifactKind::Quizzes, &["json"]).unwrap(),
            vec![first]
        );
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.json");
        write_atomic(&path, b"[1]").unwrap();
        write_atomic(&path, b"[2]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[2]");
    }
}
