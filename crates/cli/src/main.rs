//! autoline CLI: completes a partially typed command line.
//!
//! ```text
//! autoline [OPTIONS] <commandline>...
//! ```
//!
//! Candidates are printed to stdout one per line as they stream in. Logs go
//! to `~/.autoline/autoline.log`.

use autoline_config::{AppConfig, CaptureBackend, NotificationBackend};
use autoline_core::notify::{NoopNotifier, NotificationSink};
use autoline_engine::Outcome;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

mod capture;
mod complete;
mod logging;
mod notify;

#[derive(Parser, Debug)]
#[command(
    name = "autoline",
    about = "Complete a shell command line with an LLM, using your Atuin history as context",
    version
)]
struct Cli {
    /// Path to Atuin's history.db
    #[arg(short, long, value_name = "PATH")]
    atuin: Option<PathBuf>,

    /// Show progress with dunstify
    #[arg(long)]
    dunst: bool,

    /// Include the WezTerm screen contents in the prompt
    #[arg(short, long)]
    wezterm: bool,

    /// Entries from the same directory
    #[arg(long, value_name = "N")]
    cwd_history: Option<usize>,

    /// Distinct entries for the same executable
    #[arg(long, value_name = "N")]
    process_history: Option<usize>,

    /// Entries from the same shell session
    #[arg(long, value_name = "N")]
    session_history: Option<usize>,

    /// Entries for the same executable in the same directory
    #[arg(long, value_name = "N")]
    cwd_process_history: Option<usize>,

    /// Shell name, only shown to the model
    #[arg(short, long)]
    shell: Option<String>,

    /// Completion model
    #[arg(short, long)]
    model: Option<String>,

    /// Token ceiling for the prompt
    #[arg(long, value_name = "N")]
    max_tokens: Option<usize>,

    /// Print the prompt and its token count instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// The command line to complete
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    commandline: Vec<String>,
}

impl Cli {
    /// Flags win over the config file and the environment.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(path) = &self.atuin {
            config.history.db_path = path.clone();
        }
        if self.dunst {
            config.notifications.backend = NotificationBackend::Dunst;
        }
        if self.wezterm {
            config.capture.backend = CaptureBackend::Wezterm;
        }
        if let Some(n) = self.cwd_history {
            config.history.cwd = n;
        }
        if let Some(n) = self.process_history {
            config.history.process = n;
        }
        if let Some(n) = self.session_history {
            config.history.session = n;
        }
        if let Some(n) = self.cwd_process_history {
            config.history.cwd_process = n;
        }
        if let Some(shell) = &self.shell {
            config.shell = shell.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(ceiling) = self.max_tokens {
            config.token_ceiling = ceiling;
        }
    }

    fn command_line(&self) -> String {
        self.commandline.join(" ")
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("autoline: failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply_to(&mut config);
    if let Err(e) = config.validate() {
        eprintln!("autoline: {e}");
        return ExitCode::FAILURE;
    }

    logging::init(&config.log, cli.verbose);

    let notifier: Arc<dyn NotificationSink> = match config.notifications.backend {
        NotificationBackend::None => Arc::new(NoopNotifier),
        NotificationBackend::Dunst => Arc::new(notify::DunstNotifier::new()),
    };

    let result = match complete::Invocation::from_env(cli.command_line(), cli.dry_run) {
        Ok(invocation) => complete::run(invocation, &config, notifier).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(Some(Outcome::Rejected { tokens, ceiling })) => {
            eprintln!("autoline: too many tokens, {tokens} > {ceiling}; nothing sent");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Completion failed");
            eprintln!("autoline: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn trailing_words_form_the_command_line() {
        let cli = Cli::try_parse_from(["autoline", "-m", "gpt-4", "git", "commit", "-m", "x"]).unwrap();
        assert_eq!(cli.model.as_deref(), Some("gpt-4"));
        assert_eq!(cli.command_line(), "git commit -m x");
    }

    #[test]
    fn empty_command_line_is_allowed() {
        let cli = Cli::try_parse_from(["autoline"]).unwrap();
        assert_eq!(cli.command_line(), "");
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "autoline",
            "--atuin",
            "/tmp/h.db",
            "--dunst",
            "-w",
            "--process-history",
            "2",
            "--cwd-history",
            "0",
            "--session-history",
            "3",
            "--cwd-process-history",
            "1",
            "-s",
            "fish",
            "--max-tokens",
            "1000",
            "ls",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.history.db_path, PathBuf::from("/tmp/h.db"));
        assert_eq!(config.notifications.backend, NotificationBackend::Dunst);
        assert_eq!(config.capture.backend, CaptureBackend::Wezterm);
        assert_eq!(config.history.process, 2);
        assert_eq!(config.history.cwd, 0);
        assert_eq!(config.history.session, 3);
        assert_eq!(config.history.cwd_process, 1);
        assert_eq!(config.shell, "fish");
        assert_eq!(config.token_ceiling, 1000);
        assert_eq!(config.model, "gpt-3.5-turbo");
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["autoline", "git"]).unwrap();
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);
        assert_eq!(config.history.cwd_process, 5);
        assert_eq!(config.notifications.backend, NotificationBackend::None);
        assert!(!cli.dry_run);
    }
}
