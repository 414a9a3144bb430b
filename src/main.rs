use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use readmap_core::{AbortSignal, OutputFormat, ReadmapConfig};
use readmap_extract::{should_generate_map, ExtractorRegistry, SourceFile};
use readmap_render::Renderer;

#[derive(Parser)]
#[command(
    name = "readmap",
    version,
    about = "Structural map of a file too large to read in full",
    long_about = "Print a budget-fitted structural map of a large source or data file:\n\
                  its symbols with line ranges, signatures and doc summaries, degraded\n\
                  tier by tier until the map fits the byte budget.\n\n\
                  Examples:\n  \
                    readmap src/parser.rs                 Map a large Rust file\n  \
                    readmap schema.sql --max-bytes 8192   Fit the map into 8 KiB\n  \
                    readmap data.jsonl --format json      Print the raw map as JSON\n  \
                    readmap small.py --force              Map a file under the thresholds\n  \
                    readmap big.py --truncate             Keep only the first and last symbols"
)]
struct Cli {
    /// File to map
    path: PathBuf,

    /// Byte budget for the rendered map (default: thresholds.max_truncated_bytes)
    #[arg(long)]
    max_bytes: Option<usize>,

    /// Path to configuration file (default: .readmap.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        default_value = "text",
        long_help = "Output format.\n\n\
                       Formats:\n  \
                         text  Budget-fitted text map (default)\n  \
                         json  The extracted map with camelCase keys, unreduced"
    )]
    format: OutputFormat,

    /// Keep thresholds.truncated_symbols_each symbols from each end, ignoring the byte budget
    #[arg(long, conflicts_with = "max_bytes")]
    truncate: bool,

    /// Map the file even when it is small enough to read in full
    #[arg(long)]
    force: bool,

    /// Enable verbose (debug) logging on stderr
    #[arg(long, short)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<ReadmapConfig> {
    let config = match explicit {
        Some(path) => ReadmapConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = Path::new(".readmap.toml");
            if default_path.exists() {
                ReadmapConfig::from_file(default_path).into_diagnostic()?
            } else {
                ReadmapConfig::default()
            }
        }
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let thresholds = config.thresholds;

    let source = SourceFile::load(&cli.path).await.into_diagnostic()?;
    let total_lines = source.total_lines();
    if !cli.force && !should_generate_map(total_lines, source.total_bytes, &thresholds) {
        eprintln!(
            "{} is small enough to read in full ({total_lines} lines, {} bytes); \
             pass --force to map it anyway",
            cli.path.display(),
            source.total_bytes,
        );
        return Ok(());
    }

    let signal = AbortSignal::new();
    {
        let signal = signal.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal.abort();
            }
        });
    }

    let registry = ExtractorRegistry::with_defaults(&config.extractors);
    debug!(
        path = %source.path.display(),
        strategies = ?registry.strategies_for(&source.path),
        "dispatching"
    );
    let Some(map) = registry.generate(&source.path, &signal).await else {
        if signal.is_aborted() {
            miette::bail!("interrupted");
        }
        miette::bail!("no structure found in {}", cli.path.display());
    };

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&map).into_diagnostic()?);
        }
        OutputFormat::Text => {
            let max_bytes = cli.max_bytes.unwrap_or(thresholds.max_truncated_bytes);
            let renderer = Renderer::new(thresholds);
            let fitted = if cli.truncate {
                renderer.truncate(&map)
            } else {
                renderer.fit(&map, max_bytes)
            };
            debug!(
                level = %fitted.level,
                symbols_each = ?fitted.symbols_each,
                bytes = fitted.len(),
                max_bytes,
                truncate = cli.truncate,
                "map rendered"
            );
            print!("{}", fitted.text);
            if !fitted.text.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}
