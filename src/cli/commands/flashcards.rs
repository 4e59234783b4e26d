//! Flashcard menu: generate, browse, edit, export and self-study.

use super::records;
use crate::cli::{Console, Output};
use crate::session::Session;
use crate::tools::artifact::{load_records, render_text};
use crate::tools::flashcards::{parse_self_assessment, StudyScore};
use crate::tools::{Flashcard, FlashcardOptions, FlashcardStyle};
use anyhow::Result;
use console::style;
use std::path::Path;

const TITLE: &str = "Flashcards";
const NO_SETS: &str = "No saved flashcard sets. Generate one first.";

pub async fn run_flashcards(session: &mut Session, console: &mut Console) -> Result<()> {
    loop {
        Output::header("Flashcard Generator");
        Output::menu_item("1", "Generate new flashcards");
        Output::menu_item("2", "List saved sets");
        Output::menu_item("3", "View a set");
        Output::menu_item("4", "Modify a card");
        Output::menu_item("5", "Export a set");
        Output::menu_item("6", "Study a set");
        Output::menu_item("0", "Back");

        let Some(choice) = console.prompt("Option:")? else {
            return Ok(());
        };
        let result = match choice.as_str() {
            "0" => return Ok(()),
            "1" => generate(session, console).await,
            "2" => {
                records::list_artifacts(&session.toolbox().flashcards.list_sets()?, NO_SETS);
                Ok(())
            }
            "3" => with_set(session, console, |path, _| records::view::<Flashcard>(path, TITLE)),
            "4" => with_set(session, console, records::modify::<Flashcard>),
            "5" => with_set(session, console, |path, console| {
                records::export::<Flashcard>(path, TITLE, console)
            }),
            "6" => with_set(session, console, study),
            other => {
                Output::warning(&format!("Invalid option '{}'.", other));
                Ok(())
            }
        };
        if let Err(e) = result {
            Output::error(&e.to_string());
        }
    }
}

fn with_set(
    session: &Session,
    console: &mut Console,
    action: impl FnOnce(&Path, &mut Console) -> Result<()>,
) -> Result<()> {
    let sets = session.toolbox().flashcards.list_sets()?;
    match records::pick_artifact(&sets, NO_SETS, console)? {
        Some(path) => action(&path, console),
        None => Ok(()),
    }
}

async fn generate(session: &mut Session, console: &mut Console) -> Result<()> {
    if !session.has_content() {
        Output::warning("No processed content. Process files first (option 2).");
        return Ok(());
    }

    for (i, style) in FlashcardStyle::ALL.iter().enumerate() {
        Output::menu_item(
            &(i + 1).to_string(),
            &format!("{} ({})", style.as_str(), style.description()),
        );
    }
    let Some(answer) = console.prompt("Style (ENTER for concepts):")? else {
        return Ok(());
    };
    let style: FlashcardStyle = if answer.is_empty() {
        FlashcardStyle::default()
    } else {
        answer.parse()?
    };

    let default_count = session.toolbox().settings().flashcard_count;
    let Some(answer) = console.prompt(&format!("How many cards? (ENTER for {}):", default_count))? else {
        return Ok(());
    };
    let count = parse_count(&answer, default_count);

    let spinner = Output::spinner(&format!("Generating {} {} flashcards...", count, style.as_str()));
    let set = console
        .interruptible(session.flashcards(&FlashcardOptions { count, style }))
        .await;
    spinner.finish_and_clear();
    let Some(set) = set else {
        session.end_tool();
        Output::interrupted("Flashcard generation");
        return Ok(());
    };
    let set = set?;

    println!("\n{}", render_text(TITLE, &set.cards).trim_end());
    println!();
    Output::success(&format!(
        "{} cards saved to {} ({})",
        set.cards.len(),
        set.path.display(),
        set.origin
    ));
    Ok(())
}

/// A positive count, or the default for blank or invalid input.
pub(super) fn parse_count(input: &str, default: usize) -> usize {
    match input.trim().parse::<usize>() {
        Ok(n) if n > 0 => n,
        Ok(_) | Err(_) => {
            if !input.trim().is_empty() {
                Output::warning(&format!("Invalid number '{}', using {}.", input.trim(), default));
            }
            default
        }
    }
}

/// Show each question, reveal the answer on ENTER, and ask whether it was known.
fn study(path: &Path, console: &mut Console) -> Result<()> {
    let cards: Vec<Flashcard> = load_records(path)?;
    let mut score = StudyScore::default();
    println!("{}", style("Answer 'y' if you knew the card. Ctrl-C ends the session.").dim());

    for (i, card) in cards.iter().enumerate() {
        println!("\n{} {}", style(format!("Card {}/{}:", i + 1, cards.len())).cyan().bold(), card.question);
        if console.prompt("(ENTER to reveal)")?.is_none() {
            break;
        }
        println!("{} {}", style("Answer:").green().bold(), card.answer);
        let Some(known) = console.prompt("Did you know it? [y/n]:")? else {
            break;
        };
        score.record(parse_self_assessment(&known));
    }

    print_score(&score);
    Ok(())
}

fn print_score(score: &StudyScore) {
    if score.total == 0 {
        return;
    }
    Output::header("Results");
    Output::kv("Known", &format!("{}/{}", score.known, score.total));
    Output::kv("Score", &format!("{:.1}%", score.percentage()));
    Output::info(score.feedback());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::artifact::save_records;

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("", 10), 10);
        assert_eq!(parse_count("15", 10), 15);
        assert_eq!(parse_count("0", 10), 10);
        assert_eq!(parse_count("many", 10), 10);
    }

    #[test]
    fn test_study_reads_every_card() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.json");
        save_records(
            &path,
            &[Flashcard::new("Q1", "A1"), Flashcard::new("Q2", "A2")],
        )
        .unwrap();

        let mut console = Console::scripted("\ny\n\nn\n");
        study(&path, &mut console).unwrap();
        assert!(console.read_line().unwrap().is_none());
        assert!(console.is_closed());
    }
}
