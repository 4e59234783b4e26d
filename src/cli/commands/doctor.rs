//! Doctor command - verify configuration, credentials and external tools.

use crate::cli::preflight::{self, ToolStatus};
use crate::cli::{format_size, Output};
use crate::config::{Credentials, Settings};
use crate::player::PLAYERS;
use crate::storage::write_atomic;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
///
/// Missing keys and tools are warnings: StudyBox still runs, with local
/// generation or without playback.
pub fn run_doctor(settings: &Settings, credentials: &Credentials) -> anyhow::Result<()> {
    Output::header("StudyBox Doctor");
    println!();

    let mut checks = Vec::new();
    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section("Generative Backend", vec![check_backend(settings, credentials)]);
    section("Text-to-Speech", vec![check_tts(credentials)]);
    section("Storage", check_storage(&settings.storage_dir()));
    section("Audio Players", vec![check_players()]);
    section("Configuration", vec![check_config_file(), check_prompt_dir(settings)]);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{} error(s) found. Fix them before using StudyBox.", errors));
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! StudyBox is ready to use.");
    }
    Output::kv("Tools will use", preflight::generation_mode(credentials));

    Ok(())
}

fn check_backend(settings: &Settings, credentials: &Credentials) -> CheckResult {
    let var = Credentials::backend_key_var(settings.backend.provider);
    match &credentials.generative_api_key {
        Some(key) => CheckResult::ok(
            var,
            &format!(
                "configured ({}), model {}",
                preflight::mask_key(key),
                settings.backend.model
            ),
        ),
        None => CheckResult::warning(
            var,
            "not set, tools will use local generators",
            &format!("Set {} in the environment or a .env file", var),
        ),
    }
}

fn check_tts(credentials: &Credentials) -> CheckResult {
    match &credentials.tts_api_key {
        Some(key) => CheckResult::ok(
            "ELEVENLABS_API_KEY",
            &format!("configured ({}), premium voice available", preflight::mask_key(key)),
        ),
        None => CheckResult::ok("ELEVENLABS_API_KEY", "not set, using the free Google voice"),
    }
}

fn check_storage(root: &Path) -> Vec<CheckResult> {
    let name = "Storage directory";
    if let Err(e) = std::fs::create_dir_all(root) {
        return vec![CheckResult::error(
            name,
            &format!("{} ({})", root.display(), e),
            "Set [general] storage_dir to a writable directory",
        )];
    }

    let probe = root.join(".studybox_write_test");
    let writable = write_atomic(&probe, b"ok").is_ok() && std::fs::remove_file(&probe).is_ok();
    if !writable {
        return vec![CheckResult::error(
            name,
            &format!("{} is not writable", root.display()),
            "Check the directory permissions",
        )];
    }

    let mut results = vec![CheckResult::ok(name, &root.display().to_string())];
    let (count, bytes) = std::fs::read_dir(root)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.metadata().ok())
                .filter(|m| m.is_file())
                .fold((0, 0), |(n, total), m| (n + 1, total + m.len()))
        })
        .unwrap_or((0, 0));
    results.push(CheckResult::ok(
        "Stored files",
        &format!("{} ({})", count, format_size(bytes)),
    ));
    results
}

fn check_players() -> CheckResult {
    let installed = preflight::installed_players();
    let Some((name, _)) = installed.first() else {
        return CheckResult::warning(
            "Player",
            "none found, playback disabled",
            &format!(
                "Install one of: {}",
                PLAYERS.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
            ),
        );
    };

    let message = match preflight::check_tool(name, "-version") {
        ToolStatus::Working(version) => format!("{} ({})", name, version),
        _ => name.to_string(),
    };
    CheckResult::ok("Player", &message)
}

fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to change settings", config_path.display()),
        )
    }
}

fn check_prompt_dir(settings: &Settings) -> CheckResult {
    match &settings.prompts.custom_dir {
        None => CheckResult::ok("Prompts", "built-in templates"),
        Some(dir) => {
            let path = Settings::expand_path(dir);
            if path.is_dir() {
                CheckResult::ok("Prompts", &format!("custom templates from {}", path.display()))
            } else {
                CheckResult::warning(
                    "Prompts",
                    &format!("{} does not exist", path.display()),
                    "Built-in templates are used for anything not overridden",
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_missing_backend_key_is_warning() {
        let result = check_backend(&Settings::default(), &Credentials::default());
        assert_eq!(result.status, CheckStatus::Warning);
        assert!(result.message.contains("local generators"));
    }

    #[test]
    fn test_storage_check_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("storage");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("notes.txt"), "12345").unwrap();

        let results = check_storage(&root);
        assert!(results.iter().all(|r| r.status == CheckStatus::Ok));
        assert_eq!(results[1].message, "1 (5 B)");
        assert!(!root.join(".studybox_write_test").exists());
    }
}
