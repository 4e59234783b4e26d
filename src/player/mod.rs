//! Console playback of generated audio through an external player.
//!
//! The player process runs in the background while a monitor thread reads
//! control lines from stdin: ENTER toggles pause, `s` or `q` stops.

use crate::error::{Result, StudyBoxError};
use crate::storage::{ArtifactKind, FileInfo, FileStore};
use std::ffi::OsStr;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Extensions listed by the player.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a"];

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An external command-line player and the flags for quiet, windowless playback.
#[derive(Debug)]
pub struct PlayerProgram {
    pub name: &'static str,
    args: &'static [&'static str],
}

/// Candidates in order of preference.
pub const PLAYERS: &[PlayerProgram] = &[
    PlayerProgram {
        name: "ffplay",
        args: &["-nodisp", "-autoexit", "-loglevel", "quiet"],
    },
    PlayerProgram {
        name: "mpg123",
        args: &["-q"],
    },
    PlayerProgram {
        name: "afplay",
        args: &[],
    },
    PlayerProgram {
        name: "paplay",
        args: &[],
    },
];

/// Control input during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    TogglePause,
    Stop,
}

/// Map a line typed during playback to a control. Unknown input is ignored.
pub fn parse_control(line: &str) -> Option<Control> {
    match line.trim().to_lowercase().as_str() {
        "" | "p" => Some(Control::TogglePause),
        "s" | "q" => Some(Control::Stop),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Finished,
    Stopped,
}

/// Locate `program` in a `PATH`-style list of directories.
pub fn find_on_path(program: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(path_var).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        let exe = dir.join(format!("{}.exe", program));
        exe.is_file().then_some(exe)
    })
}

/// Generated audio files with sizes, sorted by name.
pub fn list_audio(store: &FileStore) -> Result<Vec<FileInfo>> {
    let paths = store.list_artifacts(ArtifactKind::GeneratedAudio, AUDIO_EXTENSIONS)?;
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let size = std::fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        files.push(FileInfo { name, size, path });
    }
    Ok(files)
}

/// Plays files with the first available external player.
#[derive(Debug)]
pub struct AudioPlayer {
    program: &'static PlayerProgram,
    binary: PathBuf,
}

impl AudioPlayer {
    /// Find a player on the current `PATH`.
    pub fn detect() -> Result<Self> {
        Self::detect_in(std::env::var_os("PATH").as_deref())
    }

    pub fn detect_in(path_var: Option<&OsStr>) -> Result<Self> {
        for program in PLAYERS {
            if let Some(binary) = find_on_path(program.name, path_var) {
                debug!("Using {} at {}", program.name, binary.display());
                return Ok(Self { program, binary });
            }
        }
        Err(StudyBoxError::ToolNotFound(format!(
            "No audio player found. Install one of: {}",
            PLAYERS.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
        )))
    }

    pub fn name(&self) -> &'static str {
        self.program.name
    }

    /// Play one file, blocking until it ends or the user stops it.
    pub fn play(&self, path: &Path) -> Result<PlaybackOutcome> {
        if !path.is_file() {
            return Err(StudyBoxError::NotFound(format!(
                "Audio file {} does not exist",
                path.display()
            )));
        }

        let mut child = Command::new(&self.binary)
            .args(self.program.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| StudyBoxError::Playback(format!("Failed to start {}: {}", self.name(), e)))?;
        info!("Playing {} with {}", path.display(), self.name());

        let (tx, rx) = mpsc::channel();
        let monitor = thread::spawn(move || {
            let stdin = std::io::stdin();
            loop {
                let mut line = String::new();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let Some(control) = parse_control(&line) else {
                    continue;
                };
                if tx.send(control).is_err() || control == Control::Stop {
                    break;
                }
            }
        });

        let mut paused = false;
        let result = loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => break Ok(PlaybackOutcome::Finished),
                Ok(Some(status)) => {
                    break Err(StudyBoxError::Playback(format!(
                        "{} exited with {}",
                        self.name(),
                        status
                    )))
                }
                Ok(None) => {}
                Err(e) => break Err(StudyBoxError::Io(e)),
            }

            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Control::Stop) => {
                    if paused {
                        signal(&child, false);
                    }
                    child.kill().ok();
                    child.wait().ok();
                    break Ok(PlaybackOutcome::Stopped);
                }
                Ok(Control::TogglePause) => {
                    paused = !paused;
                    signal(&child, paused);
                    println!("{}", if paused { "Paused. Press ENTER to resume." } else { "Resumed." });
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep(POLL_INTERVAL),
            }
        };

        if !matches!(result, Ok(PlaybackOutcome::Stopped)) {
            // The monitor is still blocked on stdin; one more line releases it.
            drop(rx);
            println!("Playback ended. Press ENTER to continue.");
        }
        if monitor.join().is_err() {
            warn!("Playback monitor thread panicked");
        }
        result
    }

    /// Play files in order. Stops at the first failure or when the user stops playback.
    pub fn play_all(&self, paths: &[PathBuf], mut on_start: impl FnMut(usize, &Path)) -> Result<usize> {
        let mut played = 0;
        for (i, path) in paths.iter().enumerate() {
            on_start(i, path);
            match self.play(path)? {
                PlaybackOutcome::Finished => played += 1,
                PlaybackOutcome::Stopped => break,
            }
        }
        Ok(played)
    }
}

#[cfg(unix)]
fn signal(child: &Child, pause: bool) {
    let sig = if pause { "-STOP" } else { "-CONT" };
    let status = Command::new("kill")
        .arg(sig)
        .arg(child.id().to_string())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if let Err(e) = status {
        warn!("Could not signal player: {}", e);
    }
}

#[cfg(not(unix))]
fn signal(_child: &Child, _pause: bool) {
    warn!("Pause is not supported on this platform");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_control() {
        assert_eq!(parse_control("\n"), Some(Control::TogglePause));
        assert_eq!(parse_control("S\n"), Some(Control::Stop));
        assert_eq!(parse_control("q"), Some(Control::Stop));
        assert_eq!(parse_control("volume up"), None);
    }

    #[test]
    fn test_detect_prefers_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("paplay"), "").unwrap();
        std::fs::write(dir.path().join("mpg123"), "").unwrap();

        let player = AudioPlayer::detect_in(Some(dir.path().as_os_str())).unwrap();
        assert_eq!(player.name(), "mpg123");
    }

    #[test]
    fn test_detect_without_players() {
        let dir = tempfile::tempdir().unwrap();
        let err = AudioPlayer::detect_in(Some(dir.path().as_os_str())).unwrap_err();
        assert!(matches!(err, StudyBoxError::ToolNotFound(_)));
        assert!(AudioPlayer::detect_in(None).is_err());
    }

    #[test]
    fn test_list_audio_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let audio_dir = store.artifact_dir(ArtifactKind::GeneratedAudio).unwrap();
        std::fs::write(audio_dir.join("b_story.mp3"), "12345").unwrap();
        std::fs::write(audio_dir.join("a_summary.WAV"), "12").unwrap();
        std::fs::write(audio_dir.join("notes.txt"), "x").unwrap();

        let files = list_audio(&store).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a_summary.WAV", "b_story.mp3"]);
        assert_eq!(files[1].size, 5);
    }

    #[test]
    fn test_play_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ffplay"), "").unwrap();
        let player = AudioPlayer::detect_in(Some(dir.path().as_os_str())).unwrap();
        let err = player.play(&dir.path().join("missing.mp3")).unwrap_err();
        assert!(matches!(err, StudyBoxError::NotFound(_)));
    }
}
