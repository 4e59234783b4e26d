//! Checks for the external pieces some menu entries depend on.
//!
//! Nothing here blocks a tool from running: a missing backend key only means
//! local generation, and a missing player only disables playback.

use crate::config::Credentials;
use crate::player::{find_on_path, PLAYERS};
use std::path::PathBuf;
use std::process::Command;

/// Outcome of probing an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    Working(String),
    Broken(String),
    Missing,
}

/// Run `name <version_arg>` and report the first line of its output.
pub fn check_tool(name: &str, version_arg: &str) -> ToolStatus {
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first = stdout
                .lines()
                .chain(stderr.lines())
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("installed");
            ToolStatus::Working(first.chars().take(50).collect())
        }
        Ok(output) => ToolStatus::Broken(format!("exited with {}", output.status)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => ToolStatus::Missing,
        Err(e) => ToolStatus::Broken(e.to_string()),
    }
}

/// Players found on `PATH`, in preference order.
pub fn installed_players() -> Vec<(&'static str, PathBuf)> {
    let path_var = std::env::var_os("PATH");
    PLAYERS
        .iter()
        .filter_map(|p| find_on_path(p.name, path_var.as_deref()).map(|bin| (p.name, bin)))
        .collect()
}

/// Describe which generation mode the tools will run in.
pub fn generation_mode(credentials: &Credentials) -> &'static str {
    if credentials.generative_api_key.is_some() {
        "AI backend"
    } else {
        "local generators (no API key)"
    }
}

/// Show only the ends of a secret.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
