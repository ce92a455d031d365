use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recast::cli::commands;
use recast::cli::ui::Output;
use recast::cli::{OutputFormat, TransformOptions};
use recast::config::ConfigFormat;
use recast::transform::Status;

#[derive(Parser)]
#[command(name = "recast")]
#[command(
    version,
    about = "Transform text with LLMs, shortening oversized input in overlapping chunks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Use this config file instead of the global/project chain")]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Args)]
struct InputArgs {
    #[arg(help = "Text to transform (reads --file or stdin when omitted)")]
    text: Option<String>,
    #[arg(long, help = "Read the text from a file")]
    file: Option<PathBuf>,
    #[arg(short = 'i', long, help = "Instruction appended to the text, e.g. \"Fix the grammar:\"")]
    instruction: String,
    #[arg(long, short, help = "Instruction model label")]
    model: Option<String>,
    #[arg(long, help = "Shortening model label")]
    shortening_model: Option<String>,
    #[arg(long, short, help = "Normalized randomness (0.0-1.0)")]
    temperature: Option<f64>,
    #[arg(
        short = 'f',
        long,
        default_value = "text",
        value_parser = parse_output_format,
        help = "Output format: text, json"
    )]
    format: OutputFormat,
}

impl InputArgs {
    fn into_options(self, dry_run: bool) -> TransformOptions {
        TransformOptions {
            text: self.text,
            file: self.file,
            instruction: self.instruction,
            model: self.model,
            shortening_model: self.shortening_model,
            temperature: self.temperature,
            dry_run,
            format: self.format,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Transform text with the instruction model
    Transform {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long = "dry-run", help = "Simulate every round, no network calls")]
        dry_run: bool,
    },

    /// Preview the worst-case cost of a transformation
    Estimate {
        #[command(flatten)]
        input: InputArgs,
    },

    /// List configured models
    Models {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            value_parser = parse_output_format,
            help = "Output format: text, json"
        )]
        format: OutputFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            value_parser = parse_config_format,
            help = "Output format: text, json, yaml"
        )]
        format: ConfigFormat,
    },
    /// Show configuration file paths
    Path,
    /// Write a default configuration file
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    s.parse()
}

fn parse_config_format(s: &str) -> Result<ConfigFormat, String> {
    s.parse()
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mRecast encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Transform { input, dry_run } => {
            let options = input.into_options(dry_run);
            let rt = Runtime::new()?;
            match rt.block_on(commands::transform::run(config_path, &options)) {
                Ok(result) => {
                    if let Status::Error { title, .. } = result.status {
                        anyhow::bail!("Transformation failed: {}", title);
                    }
                }
                Err(e) if e.is_cancelled() => {
                    Output::new().warning("Transformation cancelled");
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Estimate { input } => {
            let options = input.into_options(true);
            let rt = Runtime::new()?;
            rt.block_on(commands::estimate::run(config_path, &options))?;
        }
        Commands::Models { format } => {
            commands::models::run(config_path, format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => {
                commands::config::show(config_path, format)?;
            }
            ConfigAction::Path => {
                commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
