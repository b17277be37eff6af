//! dotconf CLI - Command-line interface for .env resolution
//!
//! Usage:
//!   dotconf get DATABASE_URL
//!   dotconf --location ./config --strict dump --format json
//!   dotconf check

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use dotconf_core::{Dotenv, DotenvConfig, Error};
use indexmap::IndexMap;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// dotconf - .env files with chained ${references}
#[derive(Parser)]
#[command(name = "dotconf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    load: LoadArgs,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options controlling where the source is read from and how it resolves
#[derive(Args)]
struct LoadArgs {
    /// Directory or file: URI containing the source
    #[arg(short, long, global = true, default_value = ".")]
    location: String,

    /// Source file name
    #[arg(short, long, global = true, default_value = ".env")]
    filename: String,

    /// Fail on references that cannot be resolved
    #[arg(long, global = true)]
    strict: bool,

    /// Ignore process environment variables
    #[arg(long, global = true)]
    no_system: bool,

    /// Let process environment variables override file entries
    #[arg(long, global = true)]
    replace_system: bool,
}

impl LoadArgs {
    fn to_config(&self) -> DotenvConfig {
        DotenvConfig::global()
            .clone()
            .with_location(&self.location)
            .with_filename(&self.filename)
            .with_strict_mode(self.strict)
            .with_include_system_variables(!self.no_system)
            .with_replace_system_variables(self.replace_system)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Get the expanded value of a property
    Get {
        /// Property name
        name: String,

        /// Value to use (after expansion) if the property is missing
        #[arg(short, long)]
        default: Option<String>,

        /// Fail if the property is missing
        #[arg(short, long, conflicts_with = "default")]
        required: bool,
    },

    /// Print every property
    Dump {
        /// Print values as written, without expanding references
        #[arg(long)]
        raw: bool,

        /// Output format: text, json, yaml
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Load the source and expand every property, reporting the first failure
    Check,
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.load.to_config();
    log::debug!("Using {}", config);

    match cli.command {
        Commands::Get {
            name,
            default,
            required,
        } => cmd_get(&config, &name, default.as_deref(), required),
        Commands::Dump { raw, format } => cmd_dump(&config, raw, &format),
        Commands::Check => cmd_check(&config),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // try_init: a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(config: &DotenvConfig) -> Result<Dotenv, ExitCode> {
    config.load().map_err(|e| {
        report(&e);
        ExitCode::from(2)
    })
}

fn report(err: &Error) {
    eprintln!("{}: {}", "Error".red(), err);
    if let Some(cause) = err.cause() {
        eprintln!("  {}", cause);
    }
    if let Some(help) = err.help() {
        eprintln!("  {}: {}", "Help".yellow(), help);
    }
}

fn cmd_get(config: &DotenvConfig, name: &str, default: Option<&str>, required: bool) -> ExitCode {
    let dotenv = match load(config) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let result = match (default, required) {
        (Some(default), _) => dotenv.get_or(name, Some(default)),
        (None, true) => dotenv.get_required(name).map(Some),
        (None, false) => dotenv.get(name),
    };

    match result {
        Ok(Some(value)) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::from(1),
        Err(e) => {
            report(&e);
            ExitCode::from(1)
        }
    }
}

fn cmd_dump(config: &DotenvConfig, raw: bool, format: &str) -> ExitCode {
    let dotenv = match load(config) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let entries: IndexMap<String, String> = if raw {
        dotenv
            .keys()
            .filter_map(|k| dotenv.get_raw(k).map(|v| (k.to_string(), v.to_string())))
            .collect()
    } else {
        match dotenv.resolve_all() {
            Ok(entries) => entries,
            Err(e) => {
                report(&e);
                return ExitCode::from(1);
            }
        }
    };

    let output = match format {
        "json" => serde_json::to_string_pretty(&entries)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::to_string(&entries).map_err(|e| e.to_string()),
        "text" => Ok(entries
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v))
            .collect()),
        _ => {
            eprintln!("Unsupported format: {}. Use text, json, or yaml.", format);
            return ExitCode::from(1);
        }
    };

    match output {
        Ok(content) => {
            print!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_check(config: &DotenvConfig) -> ExitCode {
    let dotenv = match load(config) {
        Ok(d) => d,
        Err(code) => return code,
    };

    match dotenv.resolve_all() {
        Ok(entries) => {
            println!(
                "{} {}: {} properties resolved",
                "✓".green(),
                config.filename(),
                entries.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprint!("{} {}: ", "✗".red(), config.filename());
            report(&e);
            ExitCode::from(1)
        }
    }
}
