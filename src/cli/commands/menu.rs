//! The interactive numbered main menu.

use super::{audio, chat, files, flashcards, quiz, summary};
use crate::cli::preflight::generation_mode;
use crate::cli::{Console, Output};
use crate::config::Credentials;
use crate::session::Session;
use anyhow::Result;
use console::style;

const ENTRIES: &[(&str, &str)] = &[
    ("1", "Upload file"),
    ("2", "Process files"),
    ("3", "Delete file"),
    ("4", "Study chat"),
    ("5", "Audio generator"),
    ("6", "Audio player"),
    ("7", "Flashcards"),
    ("8", "Quiz"),
    ("9", "List files"),
    ("10", "Key concepts"),
    ("11", "Supported extensions"),
    ("12", "Reload files from storage"),
    ("0", "Quit"),
];

/// Run the menu on the terminal until the user quits.
pub async fn run_menu(session: &mut Session, credentials: &Credentials) -> Result<()> {
    let mut console = Console::stdin();
    console.watch_interrupts();
    menu_loop(session, credentials, &mut console).await
}

/// Menu loop over any console. Errors from an entry are reported and the menu is shown again.
pub async fn menu_loop(session: &mut Session, credentials: &Credentials, console: &mut Console) -> Result<()> {
    println!("\n{}", style("StudyBox").bold().cyan());
    println!(
        "{}",
        style(format!("Generation: {}", generation_mode(credentials))).dim()
    );

    loop {
        print_menu(session);
        let Some(choice) = console.prompt("Option:")? else {
            if console.is_closed() {
                break;
            }
            continue;
        };

        let result = match choice.as_str() {
            "0" => break,
            "1" => files::upload_interactive(session, console),
            "2" => files::process_interactive(session, console).await,
            "3" => files::delete_interactive(session, console),
            "4" => chat::run_chat(session, console).await,
            "5" => audio::run_audio_generator(session, credentials, console).await,
            "6" => audio::run_player(session, console),
            "7" => flashcards::run_flashcards(session, console).await,
            "8" => quiz::run_quiz(session, console).await,
            "9" => files::run_list(session),
            "10" => summary::run_key_concepts(session, console).await,
            "11" => {
                files::run_extensions();
                Ok(())
            }
            "12" => files::run_reload(session),
            "" => continue,
            other => {
                Output::warning(&format!("Invalid option '{}'. Choose 0-12.", other));
                Ok(())
            }
        };

        if let Err(e) = result {
            Output::error(&e.to_string());
        }
    }

    Output::success("Goodbye. Keep studying!");
    Ok(())
}

fn print_menu(session: &Session) {
    Output::header("Main Menu");
    let loaded = session.extracted().len();
    if loaded > 0 {
        println!("{}", style(format!("{} processed file(s) loaded", loaded)).dim());
    }
    for (key, label) in ENTRIES {
        Output::menu_item(key, label);
    }
}
