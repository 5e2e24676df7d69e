//! odegen CLI
//!
//! Command-line interface for generating bindings from API headers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use odegen_bindings::{generators, render_all, stale_artifacts, write_artifacts, BindingContext};
use odegen_core::{Config, Entity};
use odegen_parser::{combined_pointer_usage, HeaderParser, ParallelParser, ParsedHeader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "odegen")]
#[command(author, version, about = "Binding generator for annotated C API headers", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Configuration file (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Header files or directories (replace the configured headers)
    #[arg(value_name = "HEADERS")]
    headers: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Emscripten, N-API and TypeScript bindings
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Directory for Emscripten bindings (default: next to each header)
        #[arg(long, value_name = "DIR")]
        embind_dir: Option<PathBuf>,

        /// Directory for N-API glue sources
        #[arg(long, value_name = "DIR")]
        napi_dir: Option<PathBuf>,

        /// Directory for TypeScript declarations
        #[arg(long, value_name = "DIR")]
        ts_dir: Option<PathBuf>,

        /// Only report out-of-date files, fail if there are any
        #[arg(long)]
        check: bool,
    },

    /// Print the parsed entities as JSON
    Dump {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            input,
            embind_dir,
            napi_dir,
            ts_dir,
            check,
        } => {
            let mut config = load_config(&input)?;
            if embind_dir.is_some() {
                config.output.embind_dir = embind_dir;
            }
            if napi_dir.is_some() {
                config.output.napi_dir = napi_dir;
            }
            if ts_dir.is_some() {
                config.output.typescript_dir = ts_dir;
            }
            cmd_generate(&config, check)?;
        }
        Commands::Dump { input, output } => {
            let config = load_config(&input)?;
            cmd_dump(&config, output.as_deref())?;
        }
    }

    Ok(())
}

fn load_config(input: &InputArgs) -> Result<Config> {
    let mut config = match &input.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };
    if !input.headers.is_empty() {
        config.headers = input.headers.clone();
    }
    if config.headers.is_empty() {
        bail!("No headers given");
    }
    Ok(config)
}

fn parse_headers(config: &Config) -> Result<Vec<ParsedHeader>> {
    let parser = HeaderParser::new(&config.dialect).context("Invalid header dialect")?;
    let parallel = ParallelParser::new(parser).with_progress(|event| {
        debug!("{:?} {}/{}: {}", event.phase, event.current, event.total, event.message);
    });

    let paths = parallel.collect_headers(&config.headers).context("Failed to collect headers")?;
    let headers = parallel.parse_all(&paths).context("Failed to read headers")?;
    for header in &headers {
        info!("{}: {} entities", header.path.display(), header.entities.len());
    }
    Ok(headers)
}

fn cmd_generate(config: &Config, check: bool) -> Result<()> {
    let headers = parse_headers(config)?;
    let pointer_usage = combined_pointer_usage(&headers);
    let ctx = BindingContext::new(&config.dialect, &pointer_usage, &config.generator_name).with_headers(&headers);

    let artifacts = render_all(&generators(&config.output), &ctx, &headers).context("Failed to generate bindings")?;

    if check {
        let stale = stale_artifacts(&artifacts)?;
        if stale.is_empty() {
            println!("✅ {} files up to date", artifacts.len());
            return Ok(());
        }
        for path in &stale {
            println!("   out of date: {}", path.display());
        }
        bail!("{} of {} files are out of date", stale.len(), artifacts.len());
    }

    let report = write_artifacts(&artifacts).context("Failed to write bindings")?;
    println!(
        "📝 {} files written, {} unchanged",
        report.written.len(),
        report.unchanged.len()
    );
    Ok(())
}

fn cmd_dump(config: &Config, output: Option<&Path>) -> Result<()> {
    let headers = parse_headers(config)?;
    let entities: BTreeMap<String, &Vec<Entity>> = headers
        .iter()
        .map(|h| (h.path.display().to_string(), &h.entities))
        .collect();

    let json = serde_json::to_string_pretty(&entities)?;
    if let Some(out_path) = output {
        std::fs::write(out_path, &json).with_context(|| format!("Failed to write {}", out_path.display()))?;
        println!("   Output written to: {}", out_path.display());
    } else {
        println!("{}", json);
    }
    Ok(())
}
