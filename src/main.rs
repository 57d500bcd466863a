use anyhow::Result;
use clap::Parser;
use pyget::{
    commands::{self, FindOptions},
    config::{Config, sources_path},
    runtime::RealRuntime,
    source::SourceKind,
    target::Bitness,
};
use std::path::PathBuf;

/// pyget - Python package finder
///
/// Search registered package indexes and installer listings for packages
/// that suit a Python interpreter, and print an identifier that later
/// install steps can decode without looking anything up again.
///
/// Examples:
///   pyget find requests                          # Best match per source
///   pyget find numpy --python-version 2.7 --bitness 32
///   pyget decode pypi/requests/2.31.0
#[derive(Parser, Debug)]
#[command(author, version = env!("PYGET_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Sources file (overrides the default; also via PYGET_CONFIG)
    #[arg(
        long = "config",
        short = 'c',
        env = "PYGET_CONFIG",
        value_name = "PATH",
        global = true
    )]
    pub config: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Find packages by name in every registered source
    Find(FindArgs),

    /// Manage package sources
    #[command(subcommand)]
    Source(SourceCommands),

    /// Decode a fast-path identifier
    Decode(DecodeArgs),

    /// Print the word size of a Windows executable
    Inspect(InspectArgs),

    /// List packages installed into a Python interpreter
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct FindArgs {
    /// Package name (substring match for listings)
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Only this exact version
    #[arg(long, value_name = "VERSION", conflicts_with_all = ["minimum_version", "maximum_version"])]
    pub required_version: Option<String>,

    /// Lowest acceptable version (inclusive)
    #[arg(long, value_name = "VERSION")]
    pub minimum_version: Option<String>,

    /// Highest acceptable version (inclusive)
    #[arg(long, value_name = "VERSION")]
    pub maximum_version: Option<String>,

    /// Python interpreter to match (defaults to the first one on PATH)
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,

    /// Python version to match instead of asking the interpreter
    #[arg(long, value_name = "VERSION")]
    pub python_version: Option<String>,

    /// Word size to match instead of reading the interpreter (32 or 64)
    #[arg(long, value_name = "BITS")]
    pub bitness: Option<Bitness>,

    /// Search trusted sources only
    #[arg(long)]
    pub trusted_only: bool,

    /// Seconds to wait for each source
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Attempts per request
    #[arg(long, value_name = "N")]
    pub retries: Option<usize>,
}

#[derive(clap::Subcommand, Debug)]
enum SourceCommands {
    /// List registered sources
    List,

    /// Register a source (replaces one with the same name)
    Add(SourceAddArgs),

    /// Remove a source
    Remove(SourceRemoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct SourceAddArgs {
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Index endpoint or listing page URL
    #[arg(value_name = "LOCATION")]
    pub location: String,

    /// pypi or listing
    #[arg(long, default_value = "pypi")]
    pub kind: SourceKind,

    #[arg(long)]
    pub trusted: bool,
}

#[derive(clap::Args, Debug)]
pub struct SourceRemoveArgs {
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct DecodeArgs {
    #[arg(value_name = "FASTPATH")]
    pub fast_path: String,
}

#[derive(clap::Args, Debug)]
pub struct InspectArgs {
    #[arg(value_name = "EXECUTABLE")]
    pub executable: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only this package (case-insensitive)
    #[arg(value_name = "NAME")]
    pub name: Option<String>,

    /// Python interpreter (defaults to the first one on PATH)
    #[arg(long, value_name = "PATH")]
    pub python: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    match cli.command {
        Commands::Find(args) => {
            let config = Config::new(runtime, cli.config, args.timeout, args.retries)?;
            let options = FindOptions {
                name: args.name,
                required_version: args.required_version,
                minimum_version: args.minimum_version,
                maximum_version: args.maximum_version,
                python: args.python,
                python_version: args.python_version,
                bitness: args.bitness,
                trusted_only: args.trusted_only,
            };
            commands::find(config, &options).await?;
        }
        Commands::Source(command) => {
            let path = sources_path(&runtime, cli.config)?;
            match command {
                SourceCommands::List => commands::source_list(runtime, &path)?,
                SourceCommands::Add(args) => commands::source_add(
                    runtime,
                    &path,
                    &args.name,
                    &args.location,
                    args.kind,
                    args.trusted,
                )?,
                SourceCommands::Remove(args) => {
                    commands::source_remove(runtime, &path, &args.name)?
                }
            }
        }
        Commands::Decode(args) => {
            commands::decode(&args.fast_path)?;
        }
        Commands::Inspect(args) => {
            commands::inspect(runtime, &args.executable)?;
        }
        Commands::List(args) => {
            commands::list(runtime, args.python.as_deref(), args.name.as_deref())?;
        }
    }
    Ok(())
}
