//! Audio script generation, narration and playback menus.

use crate::cli::{Console, Output};
use crate::config::Credentials;
use crate::player::{list_audio, AudioPlayer, PlaybackOutcome};
use crate::session::Session;
use crate::storage::ArtifactKind;
use crate::tools::audio_script::clean_for_tts;
use crate::tools::{AudioScript, ScriptKind};
use crate::tts::{available_synthesizers, narrate, SpeechSynthesizer};
use anyhow::Result;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LIST_SCRIPTS: &str = "8";

/// What the user picked in the generator menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptChoice {
    One(ScriptKind),
    All,
}

/// Map a generator menu answer to a choice. `None` for "back" or invalid input.
pub fn parse_script_choice(input: &str) -> Option<ScriptChoice> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Some(ScriptChoice::All);
    }
    match input.parse::<usize>() {
        Ok(n) if (1..=ScriptKind::ALL.len()).contains(&n) => Some(ScriptChoice::One(ScriptKind::ALL[n - 1])),
        Ok(n) if n == ScriptKind::ALL.len() + 1 => Some(ScriptChoice::All),
        Ok(_) => None,
        Err(_) => input.parse().ok().map(ScriptChoice::One),
    }
}

/// Generate narration scripts and optionally turn them into speech.
pub async fn run_audio_generator(
    session: &mut Session,
    credentials: &Credentials,
    console: &mut Console,
) -> Result<()> {
    Output::header("Audio Generator");
    for (i, kind) in ScriptKind::ALL.iter().enumerate() {
        Output::menu_item(&(i + 1).to_string(), kind.title());
    }
    Output::menu_item(&(ScriptKind::ALL.len() + 1).to_string(), "All kinds");
    Output::menu_item(LIST_SCRIPTS, "List saved scripts");
    Output::menu_item("0", "Back");

    let Some(answer) = console.prompt("Script type:")? else {
        return Ok(());
    };
    if answer == "0" {
        return Ok(());
    }
    if answer == LIST_SCRIPTS {
        let scripts = session.toolbox().audio_scripts.list_scripts()?;
        if scripts.is_empty() {
            Output::info("No saved scripts yet.");
        }
        for (i, path) in scripts.iter().enumerate() {
            let size = std::fs::metadata(path).ok().map(|m| m.len());
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            Output::file_entry(i + 1, &name, size);
        }
        return Ok(());
    }
    let Some(choice) = parse_script_choice(&answer) else {
        Output::warning(&format!("Invalid option '{}'.", answer));
        return Ok(());
    };
    if !session.has_content() {
        Output::warning("No processed content. Process files first (option 2).");
        return Ok(());
    }

    let spinner = Output::spinner("Writing script...");
    let scripts = match choice {
        ScriptChoice::One(kind) => console
            .interruptible(session.audio_script(kind))
            .await
            .map(|r| r.map(|s| vec![s])),
        ScriptChoice::All => console.interruptible(session.all_audio_scripts()).await,
    };
    spinner.finish_and_clear();
    let Some(scripts) = scripts else {
        session.end_tool();
        Output::interrupted("Script generation");
        return Ok(());
    };
    let scripts = scripts?;

    for script in &scripts {
        Output::success(&format!(
            "{} script saved to {} ({})",
            script.kind.title(),
            script.path.display(),
            script.origin
        ));
    }
    if scripts.len() == 1 {
        println!("\n{}\n", scripts[0].text.trim_end());
    }

    let question = if scripts.len() == 1 {
        "Convert to speech? [y/N]:"
    } else {
        "Convert all scripts to speech? [y/N]:"
    };
    let Some(answer) = console.prompt(question)? else {
        return Ok(());
    };
    if !is_yes(&answer) {
        return Ok(());
    }

    let settings = session.settings().tts.clone();
    let synthesizers = available_synthesizers(&settings, credentials)?;
    let Some(synthesizer) = choose_synthesizer(&synthesizers, console)? else {
        return Ok(());
    };

    let mut produced = Vec::new();
    for script in &scripts {
        match console.interruptible(speak(synthesizer.as_ref(), session, script)).await {
            None => {
                Output::interrupted("Speech generation");
                break;
            }
            Some(Ok(path)) => produced.push(path),
            Some(Err(e)) => {
                Output::error(&format!("Speech generation failed: {}", e));
                print_manual_instructions(session, script);
            }
        }
    }

    if !produced.is_empty() {
        let Some(answer) = console.prompt("Play now? [y/N]:")? else {
            return Ok(());
        };
        if is_yes(&answer) {
            play_paths(&produced)?;
        }
    }
    Ok(())
}

fn choose_synthesizer(
    synthesizers: &[Arc<dyn SpeechSynthesizer>],
    console: &mut Console,
) -> Result<Option<Arc<dyn SpeechSynthesizer>>> {
    if synthesizers.len() == 1 {
        Output::info(&format!("Using {}", synthesizers[0].label()));
        return Ok(synthesizers.first().cloned());
    }

    for (i, synth) in synthesizers.iter().enumerate() {
        Output::menu_item(&(i + 1).to_string(), synth.label());
    }
    let Some(answer) = console.prompt("Voice:")? else {
        return Ok(None);
    };
    match answer.parse::<usize>() {
        Ok(n) if (1..=synthesizers.len()).contains(&n) => Ok(Some(Arc::clone(&synthesizers[n - 1]))),
        _ => {
            Output::warning(&format!("Invalid option '{}'.", answer));
            Ok(None)
        }
    }
}

async fn speak(synthesizer: &dyn SpeechSynthesizer, session: &Session, script: &AudioScript) -> Result<PathBuf> {
    Output::info(&format!("Generating {} audio with {}...", script.kind.title(), synthesizer.label()));
    let path = narrate(
        synthesizer,
        session.store(),
        script.kind.slug(),
        &script.text,
        session.settings().tts.max_script_chars,
    )
    .await?;
    Output::success(&format!("Audio saved to {}", path.display()));
    Ok(path)
}

fn print_manual_instructions(session: &Session, script: &AudioScript) {
    let text = clean_for_tts(&script.text, session.settings().tts.max_script_chars);
    let audio_dir = session.store().root().join(ArtifactKind::GeneratedAudio.dir_name());
    println!("\n{}", style("Narration text").bold().underlined());
    println!("{}\n", text);
    Output::info("To create the audio manually:");
    Output::list_item("Paste the text above into any text-to-speech tool or site");
    Output::list_item(&format!(
        "Save the result as an .mp3 in {}",
        audio_dir.display()
    ));
    Output::list_item("Play it from the audio player (option 6)");
}

/// List generated audio and play files by number or all at once.
pub fn run_player(session: &Session, console: &mut Console) -> Result<()> {
    Output::header("Audio Player");
    loop {
        let files = list_audio(session.store())?;
        if files.is_empty() {
            Output::info("No generated audio yet. Create some with the audio generator (option 5).");
            return Ok(());
        }

        for (i, file) in files.iter().enumerate() {
            Output::file_entry(i + 1, &file.name, Some(file.size));
        }
        println!();

        let Some(answer) = console.prompt("Number to play, 'all', or 0 to return:")? else {
            return Ok(());
        };
        let paths: Vec<PathBuf> = match answer.to_lowercase().as_str() {
            "0" | "" => return Ok(()),
            "all" => files.iter().map(|f| f.path.clone()).collect(),
            other => match other.parse::<usize>() {
                Ok(n) if (1..=files.len()).contains(&n) => vec![files[n - 1].path.clone()],
                _ => {
                    Output::warning(&format!("Invalid option '{}'.", answer));
                    continue;
                }
            },
        };

        if let Err(e) = play_paths(&paths) {
            Output::error(&e.to_string());
        }
    }
}

fn play_paths(paths: &[PathBuf]) -> Result<()> {
    let player = AudioPlayer::detect()?;
    println!(
        "{}",
        style("Controls: ENTER pause/resume, 's' or 'q' stop").dim()
    );

    if let [path] = paths {
        announce(0, 1, path);
        if player.play(path)? == PlaybackOutcome::Stopped {
            Output::info("Playback stopped.");
        }
        return Ok(());
    }

    let total = paths.len();
    let played = player.play_all(paths, |i, path| announce(i, total, path))?;
    Output::info(&format!("Played {} of {} file(s).", played, total));
    Ok(())
}

fn announce(index: usize, total: usize, path: &Path) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Output::info(&format!("Playing [{}/{}] {}", index + 1, total, name));
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí")
}
