use clap::error::{ContextKind, ContextValue};
use clap::{CommandFactory, Parser, ValueEnum};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

mod backup;
mod browser;
mod config;
mod display;
mod envfile;
mod error;
mod fs_utils;
mod input;
mod logging;
mod manual;
mod sync;
mod validation;

use config::{BrowserConfig, SyncConfig};
use error::SupakeyError;
use input::TerminalPrompter;
use sync::KeySync;

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "supakey")]
#[command(
    about = "Supabase API key retrieval - sync the anon public key from the dashboard into .env.local"
)]
#[command(
    long_about = "supakey retrieves the fresh anon public API key from the Supabase dashboard and writes it into .env.local.\n\nMethods, tried in order:\n  1. Direct key input and validation (--key)\n  2. Automated browser extraction (requires a running chromedriver)\n  3. Manual extraction with guided steps\n\nA timestamped backup of the env file is written before anything changes.\n\nUsage: supakey [OPTIONS]"
)]
#[command(version = env!("SUPAKEY_VERSION"))]
struct Cli {
    #[arg(
        long,
        env = "SUPAKEY_PROJECT_DIR",
        default_value = ".",
        help = "Project directory containing the env file"
    )]
    project_dir: PathBuf,

    #[arg(
        long,
        env = "SUPAKEY_ENV_FILE",
        default_value = config::DEFAULT_ENV_FILE,
        help = "Env file to update, relative to the project directory"
    )]
    env_file: PathBuf,

    #[arg(
        long,
        env = "SUPAKEY_PROJECT_REF",
        default_value = config::DEFAULT_PROJECT_REF,
        help = "Supabase project reference"
    )]
    project_ref: String,

    #[arg(
        long,
        env = "SUPAKEY_DASHBOARD_URL",
        default_value = config::DEFAULT_DASHBOARD_URL,
        help = "Dashboard API settings URL; {project_ref} is substituted"
    )]
    dashboard_url: String,

    #[arg(
        long,
        env = "SUPAKEY_VARIABLE",
        default_value = config::DEFAULT_VARIABLE,
        help = "Variable that holds the anon key"
    )]
    variable: String,

    #[arg(
        long,
        env = "SUPAKEY_WEBDRIVER_URL",
        default_value = config::DEFAULT_WEBDRIVER_URL,
        help = "WebDriver server used for automated extraction"
    )]
    webdriver_url: String,

    #[arg(long, help = "Chrome profile directory (default: user cache dir)")]
    user_data_dir: Option<PathBuf>,

    #[arg(
        long,
        default_value_t = 5,
        help = "Seconds to wait for the dashboard to render after navigation"
    )]
    settle_secs: u64,

    #[arg(long, help = "Run the browser without a window")]
    headless: bool,

    #[arg(long, help = "Skip automated extraction and go straight to manual entry")]
    no_browser: bool,

    #[arg(
        long,
        env = "SUPAKEY_ANON_KEY",
        hide_env_values = true,
        help = "Use this key instead of extracting one (still validated)"
    )]
    key: Option<String>,

    #[arg(
        short = 'o',
        long = "format",
        value_enum,
        default_value = "table",
        help = "Summary output format: table or json"
    )]
    format: OutputFormat,

    // Stray positional arguments are accepted and ignored
    #[arg(hide = true)]
    extra: Vec<String>,
}

impl Cli {
    fn into_config(self) -> SyncConfig {
        let browser = if self.no_browser {
            None
        } else {
            let mut browser = BrowserConfig::new()
                .webdriver_url(self.webdriver_url)
                .settle(Duration::from_secs(self.settle_secs))
                .headless(self.headless);
            if let Some(dir) = self.user_data_dir {
                browser = browser.user_data_dir(dir);
            }
            Some(browser)
        };

        SyncConfig::new(
            self.project_ref,
            config::resolve_env_file(&self.project_dir, &self.env_file),
        )
        .dashboard_url(&self.dashboard_url)
        .variable(self.variable)
        .browser(browser)
        .direct_key(self.key)
    }
}

/// Parse arguments, dropping any clap rejects instead of failing.
/// `--help` and `--version` still print and exit 0.
fn parse_cli(mut args: Vec<OsString>) -> Cli {
    loop {
        let err = match Cli::try_parse_from(&args) {
            Ok(cli) => return cli,
            Err(e) if !e.use_stderr() || args.len() <= 1 => e.exit(),
            Err(e) => e,
        };

        let rejected = match err.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(arg)) => rejected_span(&args, arg),
            _ => None,
        };

        match rejected {
            Some((index, count)) => {
                let dropped: Vec<OsString> = args.drain(index..index + count).collect();
                tracing::warn!("Ignoring argument {:?}: {}", dropped, err.kind());
            }
            None => {
                tracing::warn!("Ignoring arguments: {}", err.kind());
                args.truncate(1);
            }
        }
    }
}

/// Locate the tokens clap rejected. `invalid_arg` is either the raw token
/// (`--bogus`) or, for a bad value, the option with its placeholder
/// (`--format <FORMAT>`), in which case a separate value token goes too.
fn rejected_span(args: &[OsString], invalid_arg: &str) -> Option<(usize, usize)> {
    let (flag, takes_value) = match invalid_arg.split_once(' ') {
        Some((flag, _)) => (flag, true),
        None => (invalid_arg, false),
    };

    let short = flag.strip_prefix("--").and_then(|long| {
        Cli::command()
            .get_arguments()
            .find(|a| a.get_long() == Some(long))
            .and_then(|a| a.get_short())
            .map(|c| format!("-{}", c))
    });

    for (index, token) in args.iter().enumerate().skip(1) {
        let Some(token) = token.to_str() else {
            continue;
        };
        if token == "--" {
            break;
        }

        let separate = token == flag || short.as_deref() == Some(token);
        let attached = token.starts_with(&format!("{}=", flag))
            || short
                .as_deref()
                .is_some_and(|s| token.len() > s.len() && token.starts_with(s));

        if separate {
            let count = if takes_value && index + 1 < args.len() { 2 } else { 1 };
            return Some((index, count));
        }
        if attached {
            return Some((index, 1));
        }
    }

    None
}

#[tokio::main]
async fn main() {
    logging::init_logging();

    let cli = parse_cli(std::env::args_os().collect());
    let format = cli.format.clone();

    let sync = match KeySync::new(cli.into_config()) {
        Ok(sync) => sync,
        Err(e) => {
            tracing::error!("❌ {}", e);
            process::exit(e.exit_code());
        }
    };

    let run = tokio::task::spawn_blocking(move || sync.run(&mut TerminalPrompter));

    let result = tokio::select! {
        joined = run => match joined {
            Ok(result) => result,
            Err(e) => Err(SupakeyError::Io(io::Error::other(format!("Sync task failed: {}", e)))),
        },
        _ = tokio::signal::ctrl_c() => {
            browser::close_active_session().await;
            Err(SupakeyError::Cancelled)
        }
    };

    match result.and_then(|report| display::print_report(&report, &format)) {
        Ok(()) => {}
        Err(SupakeyError::Cancelled) => {
            let _ = crossterm::terminal::disable_raw_mode();
            println!("\n👋 Cancelled by user");
            process::exit(0);
        }
        Err(e) => {
            tracing::error!("❌ {}", e);
            process::exit(e.exit_code());
        }
    }
}
