//! Command-line interface for StudyBox.

pub mod commands;
mod console;
mod output;
pub mod preflight;

pub use console::Console;
pub use output::{format_size, Output};

use clap::{Parser, Subcommand};

/// StudyBox - a console study companion
///
/// Upload notes and documents, then chat about them, summarize them, and turn
/// them into flashcards, quizzes and narrated audio. Works offline with local
/// generators when no API key is configured.
#[derive(Parser, Debug)]
#[command(name = "studybox")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive study menu (default)
    Menu,

    /// Copy a file into storage
    Upload {
        /// Path of the file to upload
        path: String,
    },

    /// List stored files
    List,

    /// Delete a stored file by name
    Delete {
        /// File name as shown by `studybox list`
        name: String,
    },

    /// Show the file extensions that can be processed
    Extensions,

    /// Check configuration, credentials and external tools
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_is_default() {
        let cli = Cli::parse_from(["studybox"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["studybox", "delete", "notes.txt", "-vv", "-c", "/tmp/sb.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some("/tmp/sb.toml"));
        match cli.command {
            Some(Commands::Delete { name }) => assert_eq!(name, "notes.txt"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::parse_from(["studybox", "config", "path"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Path
            })
        ));
    }
}
