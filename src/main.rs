//! Binary entry point for the typecorr CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Correlate docstring types with traces for a package
//! typecorr analyze path/to/pkg --trace-folder tracing --output-dir analysis
//!
//! # Only report non-trivial types, without counts
//! typecorr analyze path/to/pkg --compact --no-counts
//!
//! # Render a traced type, merged with a documented one
//! typecorr render "typing.Union[int, numpy.float64]" --doc "float"
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use typecorr::cli::{format_outcome, run_analyze, run_render};
use typecorr::output::{emit_response, AnalyzeResponse};
use typecorr_core::config::{CliOverrides, ResolvedConfig};
use typecorr_core::error::{OutputErrorCode, TypecorrError};

// ============================================================================
// CLI Structure
// ============================================================================

/// Correlate documented Python types with traced runtime types.
#[derive(Parser, Debug)]
#[command(name = "typecorr", version, about = "Docstring and trace type correlation")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Explicit config file (default: typecorr.toml next to the package).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one analysis pass over a package directory.
    Analyze {
        /// Package directory; its name is the package name.
        package_dir: PathBuf,

        /// Only walk files directly in the package directory.
        #[arg(long)]
        no_submodules: bool,

        /// Omit occurrence counts from report lines.
        #[arg(long)]
        no_counts: bool,

        /// Suppress trivial entries from the reports.
        #[arg(long)]
        compact: bool,

        /// Directory holding `<package>.json` traces.
        #[arg(long)]
        trace_folder: Option<PathBuf>,

        /// Directory reports are written to.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Directory holding known-type maps.
        #[arg(long)]
        map_dir: Option<PathBuf>,

        /// Print the pass result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Render traced type expressions, optionally merged with a documented type.
    Render {
        /// Traced type expressions (e.g. `typing.Optional[int]`).
        #[arg(required = true)]
        exprs: Vec<String>,

        /// Documented type to merge with.
        #[arg(long)]
        doc: Option<String>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(OutputErrorCode::from(&err).code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<(), TypecorrError> {
    match cli.command {
        Command::Analyze {
            package_dir,
            no_submodules,
            no_counts,
            compact,
            trace_folder,
            output_dir,
            map_dir,
            json,
        } => {
            let overrides = CliOverrides {
                config_file: cli.global.config,
                include_submodules: no_submodules.then_some(false),
                include_counts: no_counts.then_some(false),
                dump_all: compact.then_some(false),
                trace_folder,
                output_dir,
                map_dir,
            };
            let outcome = run_analyze(&package_dir, &overrides)?;
            if json {
                let response = AnalyzeResponse::from_outcome(&outcome);
                emit_response(&response, &mut io::stdout()).map_err(|e| TypecorrError::Io {
                    path: "<stdout>".to_string(),
                    message: e.to_string(),
                })?;
            } else {
                print!("{}", format_outcome(&outcome));
            }
            Ok(())
        }
        Command::Render { exprs, doc } => {
            let overrides = CliOverrides {
                config_file: cli.global.config,
                ..CliOverrides::default()
            };
            let config = ResolvedConfig::resolve(Path::new("."), &overrides)?.into_config();
            println!("{}", run_render(&exprs, doc.as_deref(), &config.catalog)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_analyze_flags() {
        let cli = Cli::try_parse_from([
            "typecorr",
            "analyze",
            "pkg",
            "--compact",
            "--no-counts",
            "--output-dir",
            "out",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze {
                package_dir,
                compact,
                no_counts,
                no_submodules,
                output_dir,
                ..
            } => {
                assert_eq!(package_dir, PathBuf::from("pkg"));
                assert!(compact);
                assert!(no_counts);
                assert!(!no_submodules);
                assert_eq!(output_dir, Some(PathBuf::from("out")));
            }
            other => panic!("Expected Analyze, got {:?}", other),
        }
        assert!(matches!(cli.global.log_level, LogLevel::Warn));
    }

    #[test]
    fn parse_global_log_level_after_subcommand() {
        let cli = Cli::try_parse_from(["typecorr", "render", "int", "--log-level", "debug"])
            .unwrap();
        assert!(matches!(cli.global.log_level, LogLevel::Debug));
    }

    #[test]
    fn render_requires_an_expression() {
        assert!(Cli::try_parse_from(["typecorr", "render"]).is_err());
    }

    #[test]
    fn log_level_maps_to_tracing() {
        assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
    }
}
