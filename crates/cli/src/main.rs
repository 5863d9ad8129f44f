use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use codegraph_indexer::ProjectExtractor;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codegraph")]
#[command(about = "Extract a scope-aware symbol graph from Python sources", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk a directory and write the merged graph as JSON
    Extract(ExtractArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Package/module prefix (e.g. github.com/org/repo)
    #[arg(long, default_value = "")]
    pkg: String,

    /// Root directory to walk
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Path to write JSON output; "-" writes to stdout
    #[arg(long, default_value = "output/output.json")]
    out: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Extract(args) => extract(args),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn extract(args: ExtractArgs) -> Result<()> {
    let extractor = ProjectExtractor::new(&args.dir, &args.pkg)
        .with_context(|| format!("cannot open project root {}", args.dir.display()))?;
    let output = extractor.extract().context("extraction failed")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&output.graph)?
    } else {
        serde_json::to_string(&output.graph)?
    };

    if args.out.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
    } else {
        if let Some(parent) = args.out.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create {}", parent.display()))?;
            }
        }
        fs::write(&args.out, &json)
            .with_context(|| format!("cannot write {}", args.out.display()))?;
        log::info!("Wrote results to {}", args.out.display());
    }

    log::info!(
        "{} files, {} nodes, {} relations in {}ms ({} skipped)",
        output.stats.files,
        output.stats.nodes,
        output.stats.relations,
        output.stats.time_ms,
        output.stats.errors.len()
    );
    Ok(())
}
