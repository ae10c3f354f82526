pub mod doctor;
pub mod start;
pub mod stop;
pub mod topology;

use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{stderr, IsTerminal};
use std::path::Path;
use std::time::Duration;
use wpdev_core::Prompt;
use wpdev_schema::{load_project_config, LoadOptions, ProjectConfig};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;
pub const EXIT_RUNTIME_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        "running" => Style::new().green().apply_to(status).to_string(),
        "reconfigured" => Style::new().cyan().bold().apply_to(status).to_string(),
        "stopped" => Style::new().yellow().apply_to(status).to_string(),
        "warning" => Style::new().yellow().bold().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}

/// Resolve the project configuration the same way `start` does.
pub fn load_config(
    project_root: &Path,
    home: &Path,
    port_override: Option<u16>,
    debug: bool,
) -> Result<ProjectConfig, String> {
    load_project_config(&LoadOptions {
        project_root: project_root.to_path_buf(),
        tool_home: home.to_path_buf(),
        port_override,
        debug,
    })
    .map_err(|e| format!("config error: {e}"))
}

/// Interactive yes/no on stderr. Without a terminal every question is
/// answered "no".
pub struct TerminalPrompt {
    spinner: Option<ProgressBar>,
}

impl TerminalPrompt {
    pub fn new(spinner: Option<ProgressBar>) -> Self {
        Self { spinner }
    }

    fn ask(question: &str) -> bool {
        if !stderr().is_terminal() {
            return false;
        }
        Confirm::new()
            .with_prompt(question)
            .default(true)
            .interact()
            .unwrap_or(false)
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> bool {
        match &self.spinner {
            Some(pb) => pb.suspend(|| Self::ask(question)),
            None => Self::ask(question),
        }
    }
}
