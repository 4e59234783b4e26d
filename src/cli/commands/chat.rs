//! Interactive study chat over the processed content.

use crate::cli::{Console, Output};
use crate::session::Session;
use crate::tools::{ChatCommand, ChatSession};
use anyhow::Result;
use console::style;

/// Run the chat loop until the user leaves.
pub async fn run_chat(session: &mut Session, console: &mut Console) -> Result<()> {
    let mut chat = session.chat()?;
    let result = chat_loop(&mut chat, console).await;
    session.end_tool();
    result
}

async fn chat_loop(chat: &mut ChatSession, console: &mut Console) -> Result<()> {
    println!("\n{}", style("Study Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your material. Commands: 'summary', 'concepts', 'examples'. Type 'exit' to return.")
            .dim()
    );

    loop {
        let Some(input) = console.prompt("You:")? else {
            break;
        };

        let command = ChatCommand::parse(&input);
        if command == ChatCommand::Exit {
            Output::info("Leaving chat.");
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let reply = console.interruptible(chat.handle(command)).await;
        spinner.finish_and_clear();
        let Some(reply) = reply else {
            Output::interrupted("Answer");
            continue;
        };

        if let Some(reply) = reply {
            println!("\n{} {}", style("Assistant:").cyan().bold(), reply.value.trim_end());
            if reply.is_fallback() {
                println!("{}", style("(local mode)").dim());
            }
            println!();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::config::{Prompts, Settings};
    use crate::session::SessionState;

    #[tokio::test]
    async fn test_chat_records_questions_and_returns_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.storage_dir = dir.path().join("storage").to_string_lossy().into_owned();
        let mut session = Session::with_components(settings, Prompts::default(), Backend::disabled());

        let notes = dir.path().join("cells.txt");
        std::fs::write(&notes, "Mitochondria produce most of the chemical energy of the cell.").unwrap();
        let uploaded = session.upload(&notes).unwrap();
        session.process(&[uploaded.stored_path]).await.unwrap();

        let mut chat = session.chat().unwrap();
        let mut console = Console::scripted("\nWhat do mitochondria produce?\nexit\nignored\n");
        chat_loop(&mut chat, &mut console).await.unwrap();
        session.end_tool();

        assert_eq!(chat.history().len(), 1);
        assert_eq!(chat.history()[0].user, "What do mitochondria produce?");
        assert_eq!(session.state(), SessionState::Idle);
    }
}
