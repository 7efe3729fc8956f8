//! rb - run named tasks declared in a YAML module.
//!
//! Usage:
//!   rb run <task> [-e NAME=VAL]... [-m module] [-p NAME=VAL]... [-v]... [-t duration] [-- args]
//!   rb list [-o name|json] [-e NAME=VAL]... [-m module] [-p NAME=VAL]...
//!   rb <task> ...          Same as `rb run <task> ...`

use clap::{ArgAction, Args, Parser, Subcommand};
use runbook::commands::parse_assignment;
use runbook::error::EXIT_FAILURE;
use runbook::{ListFormat, ListOptions, RunOptions, Runner, Vars, logging};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

/// rb - run named tasks declared in a YAML module
#[derive(Parser)]
#[command(name = "rb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task (default)
    Run {
        /// Task to run
        #[arg(value_name = "TASK")]
        task: String,

        /// Arguments handed to the task
        #[arg(value_name = "ARGS")]
        args: Vec<String>,

        /// Duration after which task execution is timed out (e.g. 500ms, 30s, 1m30s)
        #[arg(short = 't', long, value_parser = parse_duration)]
        timeout: Option<Duration>,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// List tasks
    List {
        /// Output format: name or json
        #[arg(short = 'o', long = "output", default_value = "name", value_parser = parse_format)]
        format: ListFormat,

        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Set a variable (repeatable); a missing value is empty
    #[arg(short = 'e', long = "env", value_name = "NAME[=VALUE]")]
    env: Vec<String>,

    /// Task module (default: closest tasks.yaml from the current directory)
    #[arg(short = 'm', long, value_name = "MODULE")]
    module: Option<PathBuf>,

    /// Set a property (repeatable); a missing value is `true`
    #[arg(short = 'p', long = "property", value_name = "NAME[=VALUE]")]
    properties: Vec<String>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

impl SourceArgs {
    fn env(&self) -> Vars {
        self.env.iter().map(|e| parse_assignment(e, "")).collect()
    }

    fn properties(&self) -> Vars {
        self.properties
            .iter()
            .map(|p| parse_assignment(p, "true"))
            .collect()
    }
}

const SUBCOMMANDS: [&str; 3] = ["run", "list", "help"];

/// Insert `run` when the first argument is not a subcommand or a flag.
fn with_default_command(args: Vec<OsString>) -> Vec<OsString> {
    let Some(first) = args.get(1) else {
        return args;
    };

    let first = first.to_string_lossy();
    if first.starts_with('-') || SUBCOMMANDS.contains(&first.as_ref()) {
        return args;
    }

    let mut with_run = Vec::with_capacity(args.len() + 1);
    with_run.push(args[0].clone());
    with_run.push(OsString::from("run"));
    with_run.extend(args.into_iter().skip(1));
    with_run
}

fn parse_format(s: &str) -> Result<ListFormat, String> {
    s.parse::<ListFormat>().map_err(|_| {
        format!(
            "unknown format `{}`; supported formats: {}",
            s,
            ListFormat::ALLOWED.join(", ")
        )
    })
}

/// Parse a duration such as `1h`, `1m30s`, `2.5s` or `300ms`.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let invalid = || format!("invalid duration `{}`", s);

    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        total += value * nanos_per_unit;
    }

    if !total.is_finite() || total >= u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total.round() as u64))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_from(with_default_command(std::env::args_os().collect()));

    let code = match cli.command {
        Commands::Run {
            task,
            args,
            timeout,
            source,
        } => {
            logging::init(source.verbose);

            let options = RunOptions {
                args,
                env: source.env(),
                module: source.module.clone(),
                properties: source.properties(),
                timeout,
            };

            match Runner::default().run(&task, &options).await {
                Ok(()) => 0,
                Err(err) => {
                    error!(task = %task, "{}", err);
                    err.exit_code()
                }
            }
        }

        Commands::List { format, source } => {
            logging::init(source.verbose);

            let options = ListOptions {
                env: source.env(),
                module: source.module.clone(),
                properties: source.properties(),
            };

            let mut stdout = std::io::stdout().lock();
            match Runner::default().list(format, &options, &mut stdout) {
                Ok(()) => 0,
                Err(err) => {
                    error!("{}", err);
                    EXIT_FAILURE
                }
            }
        }
    };

    std::process::exit(code);
}
