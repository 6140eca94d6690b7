use clap::{Parser, Subcommand};
use imgmod::cache::{CacheStats, CacheStatus};
use imgmod::params::{ParameterSet, RawSize};
use imgmod::policy::ConfigValidationError;
use imgmod::request::AppliedParams;
use imgmod::{Paths, ProcessError, RustBackend, Service, config, output};
use imgmod::{AssetStore, TransformBackend};
use rayon::prelude::*;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Transform flags shared by requests.
#[derive(clap::Args, Clone)]
struct RequestArgs {
    /// Target size as WxH; a zero axis keeps the aspect ratio (e.g. 640x0)
    #[arg(long, short = 'r')]
    resize: Option<String>,

    /// Output format (jpg, png, webp, ...)
    #[arg(long, short = 'f')]
    format: Option<String>,

    /// Encoding quality, 1-100
    #[arg(long, short = 'q', allow_negative_numbers = true)]
    quality: Option<i64>,

    /// resize, fit or crop
    #[arg(long, short = 'm')]
    method: Option<String>,

    /// All parameters in path form, e.g. r/200x110/f/png/q/50/m/crop/
    #[arg(long, conflicts_with_all = ["resize", "format", "quality", "method"])]
    params: Option<String>,
}

impl RequestArgs {
    fn to_params(&self) -> Result<ParameterSet, ConfigValidationError> {
        if let Some(segments) = &self.params {
            return ParameterSet::from_segments(segments);
        }
        Ok(ParameterSet {
            method: self.method.clone(),
            size: self.resize.clone().map(RawSize::from),
            format: self.format.clone(),
            quality: self.quality,
        })
    }
}

#[derive(Parser)]
#[command(name = "imgmod")]
#[command(version, about = "On-demand image derivatives with a path-addressed cache")]
#[command(long_about = "\
On-demand image derivatives with a path-addressed cache

Every derivative lives next to its original under a path built from the
request parameters, so each distinct request is generated once and served
from disk afterwards:

  /img/test.jpg  --resize 200x110             → /img/modify/95/resize/200x110/test.jpg
  /img/test.jpg  --resize 200x130 --format png → /img/modify/95/resize/200x130/png/test.png

Paths are logical, relative to the document root ([storage] root or --root).

Run 'imgmod gen-config' to generate a documented imgmod.toml.")]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Document root (overrides [storage] root)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create (or reuse) derivatives of one or more originals
    Process {
        /// Logical paths of the originals
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        request: RequestArgs,
    },
    /// List the derivatives of an original
    List {
        /// Logical path of the original
        path: String,
    },
    /// Delete the derivatives of an original, and the original itself
    Delete {
        /// Logical path of the original
        path: String,

        /// Keep the original, delete only derivatives
        #[arg(long)]
        keep_original: bool,
    },
    /// Load and validate the configuration
    Check,
    /// Print a stock imgmod.toml with all options documented
    GenConfig,
}

struct Outcome {
    paths: Paths,
    params: AppliedParams,
    status: CacheStatus,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut site = config::load_config(&cli.config)?;
    if let Some(root) = cli.root {
        site.storage.root = root;
    }
    let service = Service::from_config(&site, RustBackend::new());

    match cli.command {
        Command::Process { paths, request } => {
            let params = request.to_params()?;
            init_thread_pool(&site.processing);

            let results: Vec<Result<Outcome, ProcessError>> = paths
                .par_iter()
                .map(|path| run_request(&service, path, &params))
                .collect();

            let mut stats = CacheStats::default();
            let mut failures = 0;
            let mut report = Vec::new();
            for (i, (path, result)) in paths.iter().zip(&results).enumerate() {
                match result {
                    Ok(outcome) => {
                        stats.record(outcome.status);
                        if cli.json {
                            report.push(json!({
                                "path": path,
                                "status": outcome.status,
                                "params": outcome.params,
                                "result": outcome.paths,
                            }));
                        } else {
                            output::print_result(i + 1, &outcome.paths, &outcome.params, outcome.status);
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        if cli.json {
                            report.push(json!({ "path": path, "error": e.to_string() }));
                        } else {
                            output::print_failure(i + 1, path, e);
                        }
                    }
                }
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Cache: {}", stats);
            }
            if failures > 0 {
                return Err(format!("{failures} of {} requests failed", paths.len()).into());
            }
        }
        Command::List { path } => {
            let derivatives = service.derivatives(&path)?;
            let list = derivatives.list()?;
            if cli.json {
                let body = json!({ "original": derivatives.original(), "derivatives": list });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                output::print_derivatives(derivatives.original(), &list);
            }
        }
        Command::Delete {
            path,
            keep_original,
        } => {
            let derivatives = service.derivatives(&path)?;
            let removed = derivatives.delete(!keep_original)?;
            if cli.json {
                let body = json!({ "original": derivatives.original(), "removed": removed });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                output::print_deletion(derivatives.original(), removed, !keep_original);
            }
        }
        Command::Check => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&site)?);
            } else {
                output::print_config_check(&site);
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn run_request<B: TransformBackend, S: AssetStore>(
    service: &Service<B, S>,
    path: &str,
    params: &ParameterSet,
) -> Result<Outcome, ProcessError> {
    let processor = service.modify(path, params)?;
    let applied = processor.params();
    let (paths, status) = processor.process_with_status()?;
    Ok(Outcome {
        paths,
        params: applied,
        status,
    })
}

/// Log to stderr so stdout carries only command output.
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug for this
/// crate with `--verbose`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("imgmod=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
