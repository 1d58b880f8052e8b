//! The completion run behind `autoline [OPTIONS] <commandline>...`.

use crate::capture::WeztermCapture;
use autoline_config::{AppConfig, CaptureBackend};
use autoline_core::capture::TerminalCapture;
use autoline_core::error::{Error, ProviderError, Result};
use autoline_core::notify::{Notice, NotificationSink};
use autoline_engine::{CompletionSession, HistoryLimits, InvocationContext, Outcome, PreparedPrompt};
use autoline_history::SqliteHistory;
use autoline_providers::OpenAiCompatProvider;
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

/// What the caller typed, plus the environment it was typed in.
pub struct Invocation {
    pub session_id: Option<String>,
    pub cwd: String,
    pub command_line: String,
    pub dry_run: bool,
}

impl Invocation {
    /// Read the session and working directory from the process environment.
    pub fn from_env(command_line: String, dry_run: bool) -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::config(format!("cannot read working directory: {e}")))?;

        Ok(Self {
            session_id: std::env::var("ATUIN_SESSION").ok(),
            cwd: cwd.display().to_string(),
            command_line,
            dry_run,
        })
    }
}

/// Build the invocation context from the run and the effective config.
pub fn context(invocation: &Invocation, config: &AppConfig) -> Result<InvocationContext> {
    let mut ctx = InvocationContext::new(
        invocation.session_id.clone(),
        invocation.cwd.clone(),
        invocation.command_line.clone(),
    )?;
    ctx.shell = config.shell.clone();
    ctx.model = config.model.clone();
    ctx.token_ceiling = config.token_ceiling;
    ctx.limits = HistoryLimits {
        process: config.history.process,
        cwd: config.history.cwd,
        session: config.history.session,
        cwd_process: config.history.cwd_process,
    };
    Ok(ctx)
}

/// Run one completion. `None` means a dry run: the prompt was printed and
/// nothing was sent.
pub async fn run(
    invocation: Invocation,
    config: &AppConfig,
    notifier: Arc<dyn NotificationSink>,
) -> Result<Option<Outcome>> {
    let session = match build_session(&invocation, config, notifier.clone()).await {
        Ok(session) => session,
        Err(e) => {
            let body = format!("{}\n\n{}", invocation.cwd, invocation.command_line);
            notifier
                .notify(
                    &Notice::Failed {
                        reason: e.to_string(),
                    },
                    &body,
                )
                .await;
            return Err(e);
        }
    };

    let terminal = capture_terminal(config).await;

    if invocation.dry_run {
        let printed = async {
            let prepared = session.prepare(terminal.as_deref()).await?;
            print_prompt(
                &prepared,
                session.context().token_ceiling,
                &mut std::io::stdout().lock(),
            )
        }
        .await;
        return session.report(printed).await.map(|()| None);
    }

    let mut stdout = std::io::stdout();
    let outcome = session
        .run(terminal.as_deref(), |candidate| {
            if let Err(e) = writeln!(stdout, "{candidate}").and_then(|()| stdout.flush()) {
                warn!(error = %e, "Could not write candidate");
            }
        })
        .await?;

    Ok(Some(outcome))
}

async fn build_session(
    invocation: &Invocation,
    config: &AppConfig,
    notifier: Arc<dyn NotificationSink>,
) -> Result<CompletionSession> {
    let ctx = context(invocation, config)?;
    info!(cwd = %ctx.cwd, command_line = %ctx.command_line, model = %ctx.model, "Completing");

    let api_key = match (&config.api_key, invocation.dry_run) {
        (Some(key), _) => key.clone(),
        (None, true) => String::new(),
        (None, false) => {
            return Err(ProviderError::NotConfigured(
                "no API key; set AUTOLINE_API_KEY or OPENAI_API_KEY".into(),
            )
            .into());
        }
    };
    let provider = OpenAiCompatProvider::new("openai", config.api_url.clone(), api_key)?;
    let history = SqliteHistory::open(&config.history.db_path).await?;

    let mut session =
        CompletionSession::new(ctx, Arc::new(history), Arc::new(provider), notifier);
    if let Some(temperature) = config.temperature {
        session = session.with_temperature(temperature);
    }
    Ok(session)
}

/// Write the prepared messages and their token count to `out`.
fn print_prompt(prepared: &PreparedPrompt, ceiling: usize, out: &mut impl Write) -> Result<()> {
    for message in &prepared.messages {
        writeln!(out, "[{}]\n{}\n", message.role, message.content)?;
    }
    writeln!(out, "tokens: {} (ceiling {ceiling})", prepared.verdict.tokens())?;
    out.flush()?;
    Ok(())
}

/// Terminal text is optional context; failing to get it is not fatal.
async fn capture_terminal(config: &AppConfig) -> Option<String> {
    let capture: Box<dyn TerminalCapture> = match config.capture.backend {
        CaptureBackend::None => return None,
        CaptureBackend::Wezterm => Box::new(WeztermCapture::new()),
    };

    match capture.capture().await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(terminal = capture.name(), error = %e, "Terminal capture failed, continuing without it");
            None
        }
    }
}
