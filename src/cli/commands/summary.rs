//! Key concepts and summaries of the processed content.

use crate::cli::{Console, Output};
use crate::session::Session;
use crate::tools::SummaryLevel;
use anyhow::Result;

/// Show key concepts, then offer a summary at a chosen level.
pub async fn run_key_concepts(session: &mut Session, console: &mut Console) -> Result<()> {
    if !session.has_content() {
        Output::warning("No processed content. Process files first (option 2).");
        return Ok(());
    }

    Output::header("Key Concepts");
    let spinner = Output::spinner("Extracting key concepts...");
    let concepts = console.interruptible(session.key_concepts()).await;
    spinner.finish_and_clear();
    let Some(concepts) = concepts else {
        session.end_tool();
        Output::interrupted("Key concept extraction");
        return Ok(());
    };
    let concepts = concepts?;
    Output::generated(&concepts.value, concepts.origin);

    let levels: Vec<&str> = SummaryLevel::ALL.iter().map(|l| l.as_str()).collect();
    let Some(answer) = console.prompt(&format!("Summary too? ({}, ENTER to skip):", levels.join("/")))? else {
        return Ok(());
    };
    if answer.is_empty() {
        return Ok(());
    }
    let level: SummaryLevel = answer.parse()?;

    Output::header(&format!("Summary ({})", level.as_str()));
    let spinner = Output::spinner("Summarizing...");
    let summary = console.interruptible(session.summary(level)).await;
    spinner.finish_and_clear();
    let Some(summary) = summary else {
        session.end_tool();
        Output::interrupted("Summary");
        return Ok(());
    };
    let summary = summary?;
    Output::generated(&summary.value, summary.origin);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::config::{Prompts, Settings};

    #[tokio::test]
    async fn test_requires_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.storage_dir = dir.path().to_string_lossy().into_owned();
        let mut session = Session::with_components(settings, Prompts::default(), Backend::disabled());

        let mut console = Console::scripted("short\n");
        run_key_concepts(&mut session, &mut console).await.unwrap();
        assert_eq!(console.read_line().unwrap().as_deref(), Some("short"));
    }
}
