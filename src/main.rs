use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jacoco_gate::cli::{self, Style};
use jacoco_gate::diff::{DiffSource, GitDiff, StdinDiff};

/// jacoco-gate — Enforce JaCoCo coverage thresholds on the classes a change touches.
#[derive(Parser)]
#[command(name = "jacoco-gate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the changed files come from.
#[derive(clap::Args)]
struct DiffArgs {
    /// Git diff arguments, e.g. "main...HEAD".
    #[arg(long, conflicts_with = "stdin_diff")]
    git_diff: Option<String>,

    /// Read a unified diff from stdin.
    #[arg(long)]
    stdin_diff: bool,
}

impl DiffArgs {
    fn source(&self) -> Option<Box<dyn DiffSource>> {
        if let Some(args) = &self.git_diff {
            Some(Box::new(GitDiff { args: args.clone() }))
        } else if self.stdin_diff {
            Some(Box::new(StdinDiff))
        } else {
            None
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Check a JaCoCo XML report against the configured thresholds.
    Check {
        /// Path to the JaCoCo XML report.
        report: PathBuf,

        /// JSON gate configuration.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Class to check, e.g. com/example/Foo (repeatable).
        #[arg(long = "class")]
        classes: Vec<String>,

        #[command(flatten)]
        diff: DiffArgs,

        /// Override the project threshold from the config.
        #[arg(long)]
        project_threshold: Option<f64>,

        /// Override the default class threshold from the config.
        #[arg(long)]
        class_threshold: Option<f64>,

        /// Base URL of the hosted JaCoCo HTML report.
        #[arg(long)]
        report_url: Option<String>,

        /// Warn instead of failing on classes without coverage data.
        #[arg(long)]
        lenient: bool,

        /// Output style.
        #[arg(long, value_enum, default_value = "text")]
        style: Style,
    },

    /// Print the class names a diff maps to.
    Targets {
        /// JSON gate configuration (for extensions and source roots).
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        diff: DiffArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            report,
            config,
            classes,
            diff,
            project_threshold,
            class_threshold,
            report_url,
            lenient,
            style,
        } => {
            let mut config = cli::load_config(config.as_deref())?;
            if let Some(t) = project_threshold {
                config.project_threshold = t;
            }
            if let Some(t) = class_threshold {
                config.class_threshold = t;
            }
            if report_url.is_some() {
                config.report_url = report_url;
            }
            if lenient {
                config.fail_no_coverage_data = false;
            }

            let diff_text = cli::fetch_diff(diff.source().as_deref())?;
            let mapper = config.class_name_mapper()?;
            let targets = cli::resolve_targets(&classes, diff_text.as_deref(), &mapper);

            let output = cli::cmd_check(&report, &targets, &config, &style)?;
            print!("{}", output.rendered);

            let failures = output.report.failures();
            if !failures.is_empty() {
                for message in &failures {
                    eprintln!("{message}");
                }
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Targets { config, diff } => {
            let config = cli::load_config(config.as_deref())?;
            let diff_text = cli::fetch_diff(diff.source().as_deref())?;
            let mapper = config.class_name_mapper()?;
            let targets = cli::resolve_targets(&[], diff_text.as_deref(), &mapper);
            print!("{}", cli::cmd_targets(&targets));
            Ok(())
        }
    }
}
