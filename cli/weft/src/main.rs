//! weft CLI — generate C# P/Invoke bindings from a parsed native API.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "weft", version, about = "Override-driven C# binding generator")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate bindings
    Generate {
        /// Foreign model produced by the header parser (JSON)
        #[arg(long)]
        model: PathBuf,
        /// Override configuration (TOML)
        #[arg(long)]
        config: PathBuf,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Print the generation report to stderr
        #[arg(long)]
        report: bool,
    },
    /// Run generation without writing output and report what it would do
    Check {
        /// Foreign model produced by the header parser (JSON)
        #[arg(long)]
        model: PathBuf,
        /// Override configuration (TOML)
        #[arg(long)]
        config: PathBuf,
        /// Fail if any diagnostic was raised
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            model,
            config,
            output,
            report,
        } => commands::generate::run(&model, &config, output.as_deref(), report),

        Commands::Check {
            model,
            config,
            strict,
        } => commands::check::run(&model, &config, strict),
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn parses_generate() {
        let cli = Cli::try_parse_from([
            "weft", "generate", "--model", "api.json", "--config", "weft.toml", "-o", "Native.cs",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate {
                model,
                output,
                report,
                ..
            } => {
                assert_eq!(model, PathBuf::from("api.json"));
                assert_eq!(output, Some(PathBuf::from("Native.cs")));
                assert!(!report);
            }
            Commands::Check { .. } => panic!("expected generate"),
        }
    }

    #[test]
    fn parses_check_strict() {
        let cli = Cli::try_parse_from([
            "weft", "check", "--model", "api.json", "--config", "weft.toml", "--strict",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Check { strict: true, .. }));
    }

    #[test]
    fn model_is_required() {
        assert!(Cli::try_parse_from(["weft", "generate", "--config", "weft.toml"]).is_err());
    }
}
