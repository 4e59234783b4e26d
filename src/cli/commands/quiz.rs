//! Quiz menu: generate, browse, edit, export and take a quiz.

use super::flashcards::parse_count;
use super::records;
use crate::cli::{Console, Output};
use crate::session::Session;
use crate::tools::artifact::{load_records, render_text};
use crate::tools::quiz::QuizScore;
use crate::tools::{QuizDifficulty, QuizOptions, QuizQuestion};
use anyhow::Result;
use console::style;
use std::path::Path;

const TITLE: &str = "Quiz";
const NO_QUIZZES: &str = "No saved quizzes. Generate one first.";

pub async fn run_quiz(session: &mut Session, console: &mut Console) -> Result<()> {
    loop {
        Output::header("Quiz Generator");
        Output::menu_item("1", "Generate new quiz");
        Output::menu_item("2", "List saved quizzes");
        Output::menu_item("3", "View a quiz");
        Output::menu_item("4", "Modify a question");
        Output::menu_item("5", "Export a quiz");
        Output::menu_item("6", "Take a quiz");
        Output::menu_item("0", "Back");

        let Some(choice) = console.prompt("Option:")? else {
            return Ok(());
        };
        let result = match choice.as_str() {
            "0" => return Ok(()),
            "1" => generate(session, console).await,
            "2" => {
                records::list_artifacts(&session.toolbox().quiz.list_quizzes()?, NO_QUIZZES);
                Ok(())
            }
            "3" => with_quiz(session, console, |path, _| records::view::<QuizQuestion>(path, TITLE)),
            "4" => with_quiz(session, console, records::modify::<QuizQuestion>),
            "5" => with_quiz(session, console, |path, console| {
                records::export::<QuizQuestion>(path, TITLE, console)
            }),
            "6" => with_quiz(session, console, take),
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

fn with_quiz(
    session: &Session,
    console: &mut Console,
    action: impl FnOnce(&Path, &mut Console) -> Result<()>,
) -> Result<()> {
    let quizzes = session.toolbox().quiz.list_quizzes()?;
    match records::pick_artifact(&quizzes, NO_QUIZZES, console)? {
        Some(path) => action(&path, console),
        None => Ok(()),
    }
}

async fn generate(session: &mut Session, console: &mut Console) -> Result<()> {
    if !session.has_content() {
        Output::warning("No processed content. Process files first (option 2).");
        return Ok(());
    }

    for (i, difficulty) in QuizDifficulty::ALL.iter().enumerate() {
        Output::menu_item(&(i + 1).to_string(), difficulty.as_str());
    }
    let Some(answer) = console.prompt("Difficulty (ENTER for medium):")? else {
        return Ok(());
    };
    let difficulty: QuizDifficulty = if answer.is_empty() {
        QuizDifficulty::default()
    } else {
        answer.parse()?
    };

    let default_count = session.toolbox().settings().quiz_count;
    let Some(answer) = console.prompt(&format!("How many questions, 5-20? (ENTER for {}):", default_count))? else {
        return Ok(());
    };
    let options = QuizOptions::clamped(parse_count(&answer, default_count), difficulty);

    let spinner = Output::spinner(&format!(
        "Generating {} {} questions...",
        options.count,
        difficulty.as_str()
    ));
    let quiz = console.interruptible(session.quiz(&options)).await;
    spinner.finish_and_clear();
    let Some(quiz) = quiz else {
        session.end_tool();
        Output::interrupted("Quiz generation");
        return Ok(());
    };
    let quiz = quiz?;

    println!("\n{}", render_text(TITLE, &quiz.questions).trim_end());
    println!();
    Output::success(&format!(
        "{} questions saved to {} ({})",
        quiz.questions.len(),
        quiz.path.display(),
        quiz.origin
    ));
    Ok(())
}

/// Ask every question, grade the letter given, and show the explanation.
fn take(path: &Path, console: &mut Console) -> Result<()> {
    let questions: Vec<QuizQuestion> = load_records(path)?;
    let mut score = QuizScore::default();

    for (i, question) in questions.iter().enumerate() {
        println!(
            "\n{} {}",
            style(format!("Question {}/{}:", i + 1, questions.len())).cyan().bold(),
            question.question
        );
        for option in &question.options {
            println!("   {}", option);
        }

        let letters: String = question.letters().iter().collect();
        let Some(response) = console.prompt(&format!("Your answer [{}]:", letters))? else {
            break;
        };

        let correct = question.is_correct(&response);
        score.record(correct);
        if correct {
            println!("{}", style("Correct!").green().bold());
        } else {
            println!(
                "{} The answer is {}.",
                style("Incorrect.").red().bold(),
                question.answer
            );
        }
        if !question.explanation.is_empty() {
            println!("{}", style(&question.explanation).dim());
        }
    }

    if score.total > 0 {
        Output::header("Results");
        Output::kv("Correct", &format!("{}/{}", score.correct, score.total));
        Output::kv("Score", &format!("{:.1}%", score.percentage()));
        Output::info(score.feedback());
    }
    Ok(())
}
