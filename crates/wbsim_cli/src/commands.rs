//! Subcommand execution.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use account_store::{load_accounts, write_template};
use anyhow::{anyhow, bail, Context};
use wb_channel::{Credentials, WsConnector};
use wbsim::platform::install_interrupt_handlers;
use wbsim::{
    interrupt_signal, run_batch, run_single, BatchReport, FileConfig, SessionReport,
    SimulatorConfig,
};

use crate::cli::{BatchArgs, Cli, Command, GlobalArgs, RunArgs, TemplateArgs};

/// Endpoint and cadence after layering CLI flags, environment, file, and defaults.
#[derive(Debug)]
pub struct Settings {
    pub endpoint: String,
    pub config: SimulatorConfig,
}

pub fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Run(args) => run(&cli.global, args),
        Command::Batch(args) => batch(&cli.global, args),
        Command::Template(args) => template(args),
    }
}

pub fn resolve_settings(
    global: &GlobalArgs,
    max_completions: Option<u32>,
) -> anyhow::Result<Settings> {
    let file = match &global.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let mut config = SimulatorConfig::default().apply_file(&file);
    if let Some(platform) = non_blank(global.platform.as_deref()) {
        let profile = config.profile.clone().with_platform(platform);
        config = config.with_profile(profile);
    }
    if let Some(max_completions) = max_completions {
        config = config.with_max_completions(max_completions);
    }
    config.validate()?;

    let endpoint = non_blank(global.endpoint.as_deref())
        .or_else(|| file.endpoint())
        .ok_or_else(|| {
            anyhow!(
                "no endpoint configured: pass --endpoint, set WBSIM_ENDPOINT, or add \"endpoint\" to the config file"
            )
        })?
        .to_owned();

    Ok(Settings { endpoint, config })
}

fn run(global: &GlobalArgs, args: RunArgs) -> anyhow::Result<ExitCode> {
    let settings = resolve_settings(global, args.max_completions)?;
    let credentials = Credentials::new(args.invoker_id.trim(), args.session_id.trim());
    if credentials.invoker_id.is_empty() || credentials.session_id.is_empty() {
        bail!("invoker id and session id must not be empty");
    }
    let connector = WsConnector::new(&settings.endpoint)
        .with_context(|| format!("invalid endpoint {}", settings.endpoint))?;

    let interrupt = interrupt_signal();
    let _signals = install_interrupt_handlers(Arc::clone(&interrupt))
        .context("failed to install signal handlers")?;

    tracing::info!(
        endpoint = connector.endpoint(),
        max_completions = settings.config.max_completions,
        "starting single session"
    );
    let config = Arc::new(settings.config);
    let result = build_runtime()?.block_on(run_single(credentials, config, &connector, interrupt));

    match result {
        Ok(report) => {
            print_session(&report);
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            println!("{error}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn batch(global: &GlobalArgs, args: BatchArgs) -> anyhow::Result<ExitCode> {
    let settings = resolve_settings(global, args.max_completions)?;
    let loaded = load_accounts(&args.accounts)?;
    if loaded.is_empty() {
        bail!(
            "no usable accounts in {} ({} line(s) skipped)",
            args.accounts.display(),
            loaded.skipped.len()
        );
    }
    let connector = WsConnector::new(&settings.endpoint)
        .with_context(|| format!("invalid endpoint {}", settings.endpoint))?;

    println!(
        "{} account(s) from {}:",
        loaded.accounts.len(),
        args.accounts.display()
    );
    for (index, account) in loaded.accounts.iter().enumerate() {
        println!(
            "  {:>3}. {} ({})",
            index + 1,
            account.invoker_id,
            account.redacted_session_id()
        );
    }
    if !loaded.skipped.is_empty() {
        println!("  {} line(s) skipped", loaded.skipped.len());
    }

    if !args.yes && !confirm("Start these sessions?")? {
        println!("Cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let interrupt = interrupt_signal();
    let _signals = install_interrupt_handlers(Arc::clone(&interrupt))
        .context("failed to install signal handlers")?;

    tracing::info!(
        endpoint = connector.endpoint(),
        sessions = loaded.accounts.len(),
        max_completions = settings.config.max_completions,
        "starting batch"
    );
    let report = build_runtime()?.block_on(run_batch(
        loaded.accounts,
        Arc::new(settings.config),
        Arc::new(connector),
        interrupt,
    ));

    print_batch(&report);
    if report.all_failed() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn template(args: TemplateArgs) -> anyhow::Result<ExitCode> {
    write_template(&args.output, args.force)?;
    println!("Wrote account template to {}", args.output.display());
    Ok(ExitCode::SUCCESS)
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn print_session(report: &SessionReport) {
    println!(
        "{}: {} completion(s) in {:.1}s, {} (started {})",
        report.invoker_id,
        report.completions,
        report.elapsed.as_secs_f64(),
        report.outcome,
        report.started_at_rfc3339()
    );
}

fn print_batch(report: &BatchReport) {
    println!();
    for entry in &report.entries {
        match &entry.result {
            Ok(session) => print_session(session),
            Err(error) => println!("{}: failed, {error}", entry.invoker_id),
        }
    }
    println!(
        "{} session(s) ran, {} failed, {} completion(s) total",
        report.completed_sessions(),
        report.failed_sessions(),
        report.total_completions()
    );
}
