//! Session orchestration: uploads, processing, and running tools.
//!
//! A session owns the list of uploaded files and the texts extracted from
//! the last processing run. Tools always work on those texts.

use crate::backend::{Backend, Generated};
use crate::config::{Credentials, Prompts, Settings};
use crate::content::ContentNormalizer;
use crate::error::{Result, StudyBoxError};
use crate::extract::TextExtractor;
use crate::storage::FileStore;
use crate::tools::text::preview;
use crate::tools::{
    AudioScript, ChatSession, FlashcardOptions, FlashcardSet, Quiz, QuizOptions, ScriptKind,
    SummaryLevel, Toolbox,
};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// A file copied into storage during this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub original_path: PathBuf,
    pub stored_path: PathBuf,
    pub size: u64,
}

impl UploadedFile {
    pub fn name(&self) -> String {
        self.stored_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Text produced from one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub source: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FileSelection,
    Processing,
    ToolRunning(&'static str),
}

/// A parsed file-selection answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Cancel,
    /// Zero-based indices in input order, plus the tokens that were rejected.
    Indices { picked: Vec<usize>, invalid: Vec<String> },
}

/// Parse "all", "0", or a list of 1-based numbers separated by commas or spaces.
pub fn parse_selection(input: &str, count: usize) -> Selection {
    let input = input.trim().to_lowercase();
    match input.as_str() {
        "all" | "todos" | "*" => return Selection::All,
        "0" => return Selection::Cancel,
        _ => {}
    }

    let mut picked = Vec::new();
    let mut invalid = Vec::new();
    for token in input.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        match token.parse::<usize>() {
            Ok(n) if (1..=count).contains(&n) => {
                if !picked.contains(&(n - 1)) {
                    picked.push(n - 1);
                }
            }
            _ => invalid.push(token.to_string()),
        }
    }
    Selection::Indices { picked, invalid }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    pub path: PathBuf,
    pub chars: usize,
    pub preview: String,
}

/// Outcome of a processing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub processed: Vec<ProcessedFile>,
    pub failed: Vec<(PathBuf, String)>,
}

const PREVIEW_CHARS: usize = 120;

pub struct Session {
    settings: Settings,
    store: FileStore,
    extractor: TextExtractor,
    normalizer: ContentNormalizer,
    toolbox: Toolbox,
    uploaded: Vec<UploadedFile>,
    texts: Vec<ExtractedText>,
    state: SessionState,
}

impl Session {
    /// Build a session from settings, loading prompts and the configured backend.
    pub fn new(settings: Settings, credentials: &Credentials) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let backend = Backend::from_config(&settings.backend, credentials)?;
        Ok(Self::with_components(settings, prompts, backend))
    }

    /// Build a session with explicit prompts and backend.
    pub fn with_components(settings: Settings, prompts: Prompts, backend: Backend) -> Self {
        let store = FileStore::new(settings.storage_dir());
        let normalizer = ContentNormalizer::new(backend.clone(), prompts.clone());
        let toolbox = Toolbox::new(backend, prompts, store.clone(), &settings.tools);

        Self {
            settings,
            store,
            extractor: TextExtractor::new(),
            normalizer,
            toolbox,
            uploaded: Vec::new(),
            texts: Vec::new(),
            state: SessionState::Idle,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    pub fn backend(&self) -> &Backend {
        &self.toolbox.backend
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn uploaded(&self) -> &[UploadedFile] {
        &self.uploaded
    }

    pub fn extracted(&self) -> &[ExtractedText] {
        &self.texts
    }

    /// The processed texts, in processing order.
    pub fn texts(&self) -> Vec<String> {
        self.texts.iter().map(|t| t.text.clone()).collect()
    }

    pub fn has_content(&self) -> bool {
        !self.texts.is_empty()
    }

    /// Copy a file into storage and remember it.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn upload(&mut self, path: &Path) -> Result<UploadedFile> {
        let stored_path = self.store.save(path)?;
        let size = std::fs::metadata(&stored_path)?.len();
        let file = UploadedFile {
            original_path: path.to_path_buf(),
            stored_path,
            size,
        };

        self.uploaded.retain(|f| f.stored_path != file.stored_path);
        self.uploaded.push(file.clone());
        info!("Uploaded {} ({} bytes)", file.name(), file.size);
        Ok(file)
    }

    /// Add every stored file not already in the uploaded list.
    ///
    /// Returns how many files were added.
    pub fn reload_from_storage(&mut self) -> Result<usize> {
        let mut names = self.store.list()?;
        names.sort();

        let mut added = 0;
        for info in names.iter().filter_map(|name| self.store.info(name)) {
            if self.uploaded.iter().any(|f| f.stored_path == info.path) {
                continue;
            }
            self.uploaded.push(UploadedFile {
                original_path: info.path.clone(),
                stored_path: info.path,
                size: info.size,
            });
            added += 1;
        }
        info!("Reloaded {} files from storage", added);
        Ok(added)
    }

    /// Session uploads followed by other stored files, without duplicates.
    pub fn available_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self.uploaded.iter().map(|f| f.stored_path.clone()).collect();

        let mut stored = self.store.list()?;
        stored.sort();
        for name in stored {
            let path = self.store.root().join(&name);
            if !files.contains(&path) {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Start a processing round: previous texts are discarded.
    pub fn begin_selection(&mut self) -> Result<Vec<PathBuf>> {
        self.state = SessionState::FileSelection;
        self.texts.clear();
        self.available_files()
    }

    /// Files chosen by a selection.
    pub fn resolve_selection(files: &[PathBuf], selection: &Selection) -> Vec<PathBuf> {
        match selection {
            Selection::All => files.to_vec(),
            Selection::Cancel => Vec::new(),
            Selection::Indices { picked, .. } => picked.iter().filter_map(|&i| files.get(i).cloned()).collect(),
        }
    }

    pub fn cancel_selection(&mut self) {
        self.state = SessionState::Idle;
    }

    /// Extract, clean, and optionally improve each file in order.
    ///
    /// A file that fails is reported and skipped; the rest continue.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn process(&mut self, files: &[PathBuf]) -> Result<ProcessReport> {
        if files.is_empty() {
            self.state = SessionState::Idle;
            return Err(StudyBoxError::InvalidInput("No files selected".to_string()));
        }

        self.state = SessionState::Processing;
        self.texts.clear();
        let improve = self.settings.tools.improve_text;
        let mut report = ProcessReport::default();

        for path in files {
            match self.extractor.extract(path) {
                Ok(raw) => {
                    let cleaned = ContentNormalizer::clean(&raw);
                    let text = if improve {
                        self.normalizer.improve(&cleaned).await
                    } else {
                        cleaned
                    };

                    report.processed.push(ProcessedFile {
                        path: path.clone(),
                        chars: text.chars().count(),
                        preview: preview(&text, PREVIEW_CHARS),
                    });
                    self.texts.push(ExtractedText {
                        source: path.clone(),
                        text,
                    });
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.failed.push((path.clone(), e.to_string()));
                }
            }
        }

        self.state = SessionState::Idle;
        info!(
            "Processed {} files ({} failed)",
            report.processed.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Delete a stored file by name and forget it.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        let deleted = self.store.delete(name)?;
        if deleted {
            self.uploaded.retain(|f| f.name() != name);
        }
        Ok(deleted)
    }

    fn require_content(&self) -> Result<Vec<String>> {
        if self.texts.is_empty() {
            return Err(StudyBoxError::InvalidInput(
                "No processed content. Process files first.".to_string(),
            ));
        }
        Ok(self.texts())
    }

    fn start_tool(&mut self, name: &'static str) -> Result<Vec<String>> {
        let texts = self.require_content()?;
        self.state = SessionState::ToolRunning(name);
        Ok(texts)
    }

    /// Return to idle after an interactive tool.
    pub fn end_tool(&mut self) {
        self.state = SessionState::Idle;
    }

    pub async fn flashcards(&mut self, options: &FlashcardOptions) -> Result<FlashcardSet> {
        let texts = self.start_tool("flashcards")?;
        let result = self.toolbox.flashcards.generate(&texts, options).await;
        self.end_tool();
        result
    }

    pub async fn quiz(&mut self, options: &QuizOptions) -> Result<Quiz> {
        let texts = self.start_tool("quiz")?;
        let result = self.toolbox.quiz.generate(&texts, options).await;
        self.end_tool();
        result
    }

    pub async fn summary(&mut self, level: SummaryLevel) -> Result<Generated<String>> {
        let texts = self.start_tool("summary")?;
        let result = self.toolbox.summarizer.summarize(&texts, level).await;
        self.end_tool();
        Ok(result)
    }

    pub async fn key_concepts(&mut self) -> Result<Generated<String>> {
        let texts = self.start_tool("concepts")?;
        let result = self.toolbox.summarizer.key_concepts(&texts).await;
        self.end_tool();
        Ok(result)
    }

    pub async fn audio_script(&mut self, kind: ScriptKind) -> Result<AudioScript> {
        let texts = self.start_tool("audio_script")?;
        let result = self.toolbox.audio_scripts.generate(&texts, kind).await;
        self.end_tool();
        result
    }

    pub async fn all_audio_scripts(&mut self) -> Result<Vec<AudioScript>> {
        let texts = self.start_tool("audio_script")?;
        let result = self.toolbox.audio_scripts.generate_all(&texts).await;
        self.end_tool();
        result
    }

    /// Open a chat. The session stays in the tool state until [`Session::end_tool`].
    pub fn chat(&mut self) -> Result<ChatSession> {
        let texts = self.start_tool("chat")?;
        Ok(self.toolbox.chat(&texts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Origin;
    use crate::tools::artifact::load_records;
    use crate::tools::QuizQuestion;

    fn session_in(root: &Path) -> Session {
        let mut settings = Settings::default();
        settings.general.storage_dir = root.join("storage").to_string_lossy().into_owned();
        Session::with_components(settings, Prompts::default(), Backend::disabled())
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("ALL", 3), Selection::All);
        assert_eq!(parse_selection(" 0 ", 3), Selection::Cancel);
        assert_eq!(
            parse_selection("1, 3 3 7 x", 3),
            Selection::Indices {
                picked: vec![0, 2],
                invalid: vec!["7".to_string(), "x".to_string()],
            }
        );
        assert_eq!(
            parse_selection("", 3),
            Selection::Indices {
                picked: vec![],
                invalid: vec![],
            }
        );
    }

    #[test]
    fn test_resolve_selection() {
        let files = vec![PathBuf::from("a"), PathBuf::from("b")];
        assert_eq!(Session::resolve_selection(&files, &Selection::All), files);
        assert!(Session::resolve_selection(&files, &Selection::Cancel).is_empty());
        let picked = Selection::Indices {
            picked: vec![1],
            invalid: vec![],
        };
        assert_eq!(Session::resolve_selection(&files, &picked), vec![PathBuf::from("b")]);
    }

    #[test]
    fn test_upload_and_available_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        let file = session.upload(&write(dir.path(), "notes.txt", "hello")).unwrap();
        assert_eq!(file.size, 5);
        assert_eq!(file.name(), "notes.txt");
        write(session.store().root(), "older.md", "# old");

        let files = session.available_files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], file.stored_path);

        let source = write(dir.path(), "lecture.txt", "intro");
        session.upload(&source).unwrap();
        assert_eq!(session.reload_from_storage().unwrap(), 1);
        assert_eq!(session.uploaded().len(), 3);
        assert_eq!(session.uploaded()[0].original_path, dir.path().join("notes.txt"));
        assert_eq!(session.uploaded()[1].original_path, source);
        assert_eq!(session.uploaded()[2].name(), "older.md");
        assert_eq!(session.reload_from_storage().unwrap(), 0);

        assert!(session.delete("notes.txt").unwrap());
        assert_eq!(session.uploaded().len(), 2);
    }

    #[tokio::test]
    async fn test_process_cleans_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let good = session.upload(&write(dir.path(), "a.txt", "hello   #world")).unwrap();
        let missing = session.store().root().join("gone.txt");

        let files = session.begin_selection().unwrap();
        assert_eq!(session.state(), SessionState::FileSelection);
        assert_eq!(files, vec![good.stored_path.clone()]);

        let report = session
            .process(&[good.stored_path.clone(), missing.clone()])
            .await
            .unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, missing);
        assert_eq!(session.texts(), vec!["Hello world".to_string()]);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_process_empty_selection_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.begin_selection().unwrap();

        let err = session.process(&[]).await.unwrap_err();
        assert!(matches!(err, StudyBoxError::InvalidInput(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_tools_require_processed_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());

        assert!(session.quiz(&QuizOptions::default()).await.is_err());
        assert!(session.chat().is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_offline_quiz_from_uploaded_notes() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let notes = write(
            dir.path(),
            "biology.txt",
            "The heart pumps blood through the body.\n\
             Arteries carry oxygenated blood away from the heart.\n\
             Veins return blood back to the heart.\n",
        );

        let file = session.upload(&notes).unwrap();
        session.begin_selection().unwrap();
        session.process(&[file.stored_path]).await.unwrap();

        let quiz = session.quiz(&QuizOptions::default()).await.unwrap();
        assert_eq!(quiz.origin, Origin::Fallback);
        assert_eq!(quiz.questions.len(), 10);
        assert!(quiz.path.starts_with(session.store().root().join("quizzes")));

        let saved: Vec<QuizQuestion> = load_records(&quiz.path).unwrap();
        assert_eq!(saved.len(), 10);
        assert!(saved.iter().all(|q| !q.question.is_empty() && !q.answer.is_empty()));
    }

    #[tokio::test]
    async fn test_chat_holds_tool_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        let file = session
            .upload(&write(dir.path(), "n.md", "Some material about orbits and gravity."))
            .unwrap();
        session.process(&[file.stored_path]).await.unwrap();

        let _chat = session.chat().unwrap();
        assert_eq!(session.state(), SessionState::ToolRunning("chat"));
        session.end_tool();
        assert_eq!(session.state(), SessionState::Idle);
    }
}
