//! Command-line surface.

use std::path::PathBuf;

use account_store::DEFAULT_ACCOUNTS_FILE;
use clap::{Args, Parser, Subcommand, ValueEnum};
use wbsim::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "wbsim",
    about = "Simulate WBChannel code-completion clients, one WebSocket per account",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(
        long,
        global = true,
        env = "WBSIM_ENDPOINT",
        value_name = "URL",
        help = "Backend base URL or full channel endpoint (wss://host/websocket/peerAppgw)"
    )]
    pub endpoint: Option<String>,

    #[arg(
        long,
        global = true,
        env = "WBSIM_CONFIG",
        value_name = "PATH",
        help = "JSON config file with cadence and client profile overrides"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "WBSIM_PLATFORM",
        value_name = "PLATFORM",
        help = "Client platform reported to the backend (defaults to the host platform)"
    )]
    pub platform: Option<String>,

    #[arg(
        long = "log-format",
        global = true,
        value_enum,
        env = "WBSIM_LOG_FORMAT",
        default_value_t = LogFormatArg::Text,
        help = "Log output format on stderr"
    )]
    pub log_format: LogFormatArg,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one session with explicit credentials
    Run(RunArgs),
    /// Run one session per account listed in an account file
    Batch(BatchArgs),
    /// Write a commented account file template
    Template(TemplateArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long, env = "WBSIM_INVOKER_ID", value_name = "ID", help = "Identity token (invokerId)")]
    pub invoker_id: String,

    #[arg(
        long,
        env = "WBSIM_SESSION_ID",
        value_name = "TOKEN",
        hide_env_values = true,
        help = "Session token (sessionId)"
    )]
    pub session_id: String,

    #[arg(
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Completions per session before closing [default: 2000]"
    )]
    pub max_completions: Option<u32>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_ACCOUNTS_FILE,
        help = "Account file with one invoker_id,session_id per line"
    )]
    pub accounts: PathBuf,

    #[arg(
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Completions per session before closing [default: 2000]"
    )]
    pub max_completions: Option<u32>,

    #[arg(long, short = 'y', help = "Start without asking for confirmation")]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct TemplateArgs {
    #[arg(
        long,
        short = 'o',
        value_name = "PATH",
        default_value = DEFAULT_ACCOUNTS_FILE,
        help = "Where to write the template"
    )]
    pub output: PathBuf,

    #[arg(long, help = "Overwrite an existing file")]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_credentials_and_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wbsim",
            "run",
            "--invoker-id",
            "186812",
            "--session-id",
            "abcd-1234",
            "--max-completions",
            "3",
            "--endpoint",
            "wss://backend.test",
            "--log-format",
            "json",
        ])
        .expect("run should parse");

        assert_eq!(cli.global.endpoint.as_deref(), Some("wss://backend.test"));
        assert_eq!(cli.global.log_format, LogFormatArg::Json);
        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.invoker_id, "186812");
        assert_eq!(args.session_id, "abcd-1234");
        assert_eq!(args.max_completions, Some(3));
    }

    #[test]
    fn zero_quota_is_rejected() {
        let parsed = Cli::try_parse_from(["wbsim", "batch", "--max-completions", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn batch_and_template_default_to_accounts_file() {
        let cli = Cli::try_parse_from(["wbsim", "batch", "--yes"]).expect("batch should parse");
        let Command::Batch(args) = cli.command else {
            panic!("expected batch subcommand");
        };
        assert_eq!(args.accounts, PathBuf::from(DEFAULT_ACCOUNTS_FILE));
        assert!(args.yes);
        assert_eq!(args.max_completions, None);

        let cli = Cli::try_parse_from(["wbsim", "template", "--force"]).expect("template should parse");
        let Command::Template(args) = cli.command else {
            panic!("expected template subcommand");
        };
        assert_eq!(args.output, PathBuf::from(DEFAULT_ACCOUNTS_FILE));
        assert!(args.force);
    }
}
