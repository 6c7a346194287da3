use clap::{Parser, Subcommand};
use docweave::{config, generate, output, scan};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "docweave")]
#[command(about = "Documentation site generator with a tag-expansion template language")]
#[command(long_about = "\
Documentation site generator with a tag-expansion template language

Your filesystem is the data source. Markdown files become pages, directories
become menu sections, and layouts are plain HTML with [[...]] tags.

Source structure:

  docs/
  ├── config.toml                  # Site config (optional)
  ├── layouts/                     # Chunks (default.html) and snippets (*.sh)
  ├── index.md                     # → index.html
  ├── 01_Introduction.md           # NN_ prefix orders the menu, then is dropped
  ├── 02_Guide/                    # Menu section \"Guide\" → guide/
  │   ├── index.md                 # Links the section heading
  │   └── 01_Install.md            # → guide/install.html
  └── v1/                          # Older version (listed in `versions`)

Tags:
  [[+name]]                        Placeholder value
  [[$chunk &key=`value`]]          Chunk from layouts/chunk.html
  [[snippet &key=`value`]]         Snippet output (layouts/snippet.sh, or `if`)
  [[!...]]                         Resolve one pass later

Run 'docweave gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Documentation source directory
    #[arg(long, default_value = "docs", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the source directory and show what would be built
    Check {
        /// Print the manifest as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate the site
    Build {
        /// Skip pages that fail to render instead of stopping
        #[arg(long)]
        keep_going: bool,
    },
    /// Render one template file with the site's engine and print it
    Render {
        /// Template file to render
        file: PathBuf,
        /// Set a placeholder before rendering (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Check { json } => {
            let manifest = scan::scan(&cli.source)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&manifest)?);
            } else {
                println!("==> Checking {}", cli.source.display());
                output::print_check_output(&manifest, &cli.source);
                println!("==> Content is valid");
            }
        }
        Command::Build { keep_going } => {
            println!("==> Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            init_thread_pool(&manifest.config.processing);

            println!("==> Generating HTML → {}", cli.output.display());
            let report = generate::generate(
                &manifest,
                &cli.source,
                &cli.output,
                generate::GenerateOptions { keep_going },
            )?;
            output::print_build_report(&report);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Render { file, set } => {
            let manifest = scan::scan(&cli.source)?;
            let template = std::fs::read_to_string(&file)?;
            let (html, stats) = generate::render_template(&manifest, &cli.source, &template, &set)?;
            print!("{}", html);
            tracing::info!("{}", output::format_render_stats(&stats));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

/// Install the fmt subscriber. `RUST_LOG` directives still apply on top of
/// the `-v` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
