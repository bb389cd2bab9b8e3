use clap::{Parser, Subcommand};
use folio_gen::{config, output, pipeline, watch};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "folio-gen")]
#[command(about = "Manifest generator for photo and video portfolios")]
#[command(long_about = "\
Manifest generator for photo and video portfolios

Folders are the data source. Every folder under Stills/ gets a manifest.json
describing its subfolders or images; Motion/ folders claim videos from the
registry by key.

Project structure:

  folio.toml                        # Optional config (see gen-config)
  data/videos-registry.json         # [{key, displayName, url, poster}]
  public/
  ├── Stills/
  │   ├── .order                    # Directives, then one name per line
  │   ├── Travel/                   # Folder index (has subfolders)
  │   │   ├── .cover                # One line: which image is the cover
  │   │   └── Japan/                # Leaf gallery (images only)
  │   │       ├── tokyo.jpg
  │   │       └── tokyo.jpg.cover   # Marker: copied to _covers/
  │   └── Cats/
  └── Motion/
      ├── .order                    # Orders projects and leftover videos
      └── Reel/
          └── .order                # Registry keys this project claims

Order files:
  max_columns=3                     # 1-8, clamped
  aspect_ratio=4/5                  # or 0 for each image's own
  title_display=1                   # 0/1/true/false
  Japan                             # explicit position
  .Drafts                           # hidden

Run 'folio-gen gen-config' to print a documented folio.toml.")]
#[command(version)]
struct Cli {
    /// Project root (holds folio.toml and the public dir)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/folio.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Regenerate every manifest once
    Build,
    /// Build, then rebuild whenever an input changes
    Watch,
    /// Derive everything and show the plan without writing
    Check,
    /// Print a stock folio.toml with all options documented
    GenConfig,
}

/// Never set: watch mode runs until the process is interrupted.
static STOP: AtomicBool = AtomicBool::new(false);

/// Config, build context and metadata backend for a command that builds.
fn prepare(
    cli: &Cli,
) -> Result<
    (
        config::FolioConfig,
        pipeline::BuildContext,
        Box<dyn folio_gen::imaging::ImageBackend>,
    ),
    config::ConfigError,
> {
    let config = config::load_config(&cli.root, cli.config.as_deref())?;
    let ctx = pipeline::BuildContext::from_config(&cli.root, &config);
    let backend = pipeline::backend_for(&config);
    Ok((config, ctx, backend))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let (_, ctx, backend) = prepare(&cli)?;
            log::info!("building {}", ctx.public_dir.display());
            let report = pipeline::run(&ctx, backend.as_ref())?;
            output::print_build_report(&report, &ctx.public_dir);
        }
        Command::Watch => {
            let (config, ctx, backend) = prepare(&cli)?;
            let debounce = Duration::from_millis(config.watch.debounce_ms);
            watch::watch(&ctx, backend.as_ref(), debounce, &STOP, |trigger, result| {
                if let Err(e) = result {
                    log::warn!("rebuild failed: {e}");
                }
                output::print_watch_pass(trigger, result);
            })?;
        }
        Command::Check => {
            let (_, ctx, backend) = prepare(&cli)?;
            let (plan, report) = pipeline::check(&ctx, backend.as_ref())?;
            output::print_check_plan(&plan, &report, &ctx.public_dir);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
