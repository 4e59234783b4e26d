//! StudyBox - a console study companion
//!
//! Upload notes and documents, process them into plain text, and study them
//! with a set of generative tools.
//!
//! # Overview
//!
//! StudyBox allows you to:
//! - Chat about your material, ask for summaries, key concepts and examples
//! - Generate flashcard sets and multiple-choice quizzes, then study with them
//! - Write narration scripts and turn them into speech
//! - Export study sets as text, CSV, or to the clipboard
//!
//! Every generative tool works without an API key: when the backend is not
//! configured or a call fails, a deterministic local generator takes over.
//!
//! # Architecture
//!
//! - `config` - Settings, prompt templates and credentials
//! - `backend` - Generative text backends and the fallback policy
//! - `storage` - Uploaded files and generated artifacts on disk
//! - `extract` - Text extraction by file type
//! - `content` - Text cleanup and optional backend rewrite
//! - `tools` - Chat, summaries, flashcards, quizzes and audio scripts
//! - `tts` - Text-to-speech providers
//! - `player` - Playback through an external audio player
//! - `session` - Session state that ties the above together
//! - `cli` - Command-line arguments and interactive menus
//!
//! # Example
//!
//! ```rust,no_run
//! use studybox::config::{Credentials, Settings};
//! use studybox::session::Session;
//! use studybox::tools::QuizOptions;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let credentials = Credentials::from_env(settings.backend.provider);
//!     let mut session = Session::new(settings, &credentials)?;
//!
//!     let file = session.upload(std::path::Path::new("notes.txt"))?;
//!     session.process(&[file.stored_path]).await?;
//!
//!     let quiz = session.quiz(&QuizOptions::default()).await?;
//!     println!("Saved {} questions to {}", quiz.questions.len(), quiz.path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod player;
pub mod session;
pub mod storage;
pub mod tools;
pub mod tts;

pub use error::{Result, StudyBoxError};
