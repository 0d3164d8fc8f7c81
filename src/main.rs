// Entrypoint for the `yadisk` CLI.
// - Keeps `main` small: parse arguments, load settings, build the client
//   and hand it to the matching `ui` handler.
// - Every error ends up here and is mapped to an exit code by its kind.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yadisk_cli::settings::DEFAULT_ENV_FILE;
use yadisk_cli::ui::{self, UploadKind};
use yadisk_cli::{DiskClient, DiskError, Settings};

#[derive(Debug, Parser)]
#[command(name = "yadisk", version, about = "Yandex Disk CLI client")]
struct Cli {
    /// Verbose logging (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Env file with YANDEX_* settings
    #[arg(long, env = "YANDEX_ENV_FILE", default_value = DEFAULT_ENV_FILE, global = true)]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload a file or folder
    Upload {
        /// Local file or folder (may be quoted)
        source: String,
        /// Remote path on the disk (may be quoted)
        destination: String,
        /// What is being uploaded; detected from the source when omitted
        #[arg(long = "type", value_enum)]
        kind: Option<UploadKind>,
    },
    /// Download a file from the disk
    Download {
        /// Remote file path (may be quoted)
        source: String,
        /// Local destination path (may be quoted)
        destination: String,
    },
    /// List files on the disk
    List {
        /// Remote folder; the disk root when omitted
        #[arg(default_value = "")]
        path: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(&cli.env_file).context("Failed to load settings")?;
    let client = DiskClient::new(settings).context("Failed to build HTTP client")?;
    ui::ensure_access(&client)?;

    match cli.command {
        Commands::Upload {
            source,
            destination,
            kind,
        } => ui::upload(&client, &source, &destination, kind),
        Commands::Download {
            source,
            destination,
        } => ui::download(&client, &source, &destination),
        Commands::List { path } => ui::list(&client, &path),
    }
}

fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<DiskError>())
        .map(|e| e.kind().exit_code())
        .unwrap_or(1)
}
