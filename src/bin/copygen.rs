//! CLI binary for edgequake-copygen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_copygen::{
    generate_file, regenerate_angle, write_result, CopyGenError, GenerationConfig,
    GenerationProgressCallback, GenerationResult, GenerationStage, Outcome, Platform,
    ProductContext, ProductMode, ProgressCallback, PromptStrategy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner whose message follows the pipeline stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("copygen");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: GenerationStage) {
        self.bar.set_message(format!("{}…", stage.label()));
    }

    fn on_product_resolved(&self, context: &ProductContext) {
        let line = match (&context.detected, context.mode) {
            (Some(d), _) => format!("{} ({}, {})", d.name, d.brand, d.category),
            (None, ProductMode::Fixed(category)) => category.entry().display_name.to_string(),
            (None, ProductMode::Auto) => "inferred from the catalog".to_string(),
        };
        self.bar.println(format!("  {} Product: {}", green("✓"), bold(&line)));
    }

    fn on_complete(&self, angle_count: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} {} angle(s) ready", green("✔"), bold(&angle_count.to_string()));
    }

    fn on_error(&self, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), red(error));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate copy for a brochure, auto-detecting the product
  copygen generate brochure.pdf -o result.json

  # Pin the product and use the dynamic persona
  copygen generate --product treadmill --strategy dynamic photo.jpg

  # Rewrite the LinkedIn text of the second angle in place
  copygen regenerate result.json --angle 2 --platform linkedin

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY     OpenAI API key
  COPYGEN_MODEL      Override model ID (default gpt-4o)
  PDFIUM_LIB_PATH    Directory holding an existing libpdfium
"#;

/// Generate Instagram and LinkedIn copy from product PDFs and images.
#[derive(Parser, Debug)]
#[command(
    name = "copygen",
    version,
    about = "Generate Instagram and LinkedIn copy from product PDFs and images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate content angles from a PDF or image.
    Generate(GenerateArgs),
    /// Rewrite one platform of one angle in a saved result.
    Regenerate(RegenerateArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// OpenAI API key.
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID.
    #[arg(long, global = true, env = "COPYGEN_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Prompting strategy: fixed product catalog or dynamic synthesis.
    #[arg(long, global = true, value_enum, default_value = "catalog")]
    strategy: StrategyArg,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, global = true, default_value_t = 0.7)]
    temperature: f32,

    /// Print the result (or the error) as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// PDF or image (PNG/JPEG) to read.
    input: PathBuf,

    /// Product: auto, treadmill or body-scanner.
    #[arg(long, default_value = "auto")]
    product: ProductMode,

    /// Save the result as JSON to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "COPYGEN_PDF_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Directory holding the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Angles requested for an image.
    #[arg(long, default_value_t = 3)]
    angles_image: usize,

    /// Angles requested for a PDF.
    #[arg(long, default_value_t = 5)]
    angles_document: usize,
}

#[derive(Args, Debug)]
struct RegenerateArgs {
    /// A result file written by `copygen generate -o`.
    result: PathBuf,

    /// Angle to rewrite (1-indexed).
    #[arg(long)]
    angle: usize,

    /// Platform to rewrite: instagram or linkedin.
    #[arg(long)]
    platform: Platform,

    /// Write the updated result here instead of overwriting the input.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Catalog,
    Dynamic,
}

impl From<StrategyArg> for PromptStrategy {
    fn from(v: StrategyArg) -> Self {
        match v {
            StrategyArg::Catalog => PromptStrategy::FixedCatalog,
            StrategyArg::Dynamic => PromptStrategy::Dynamic,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = &cli.common;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; only errors get through.
    let show_progress = !common.quiet && !common.json;
    let filter = if common.verbose {
        "debug"
    } else if common.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };

    match cli.command {
        Command::Generate(ref args) => {
            let config = build_config(common, Some(args), progress_cb)?;
            let outcome = generate_file(&args.input, args.product, &config).await;
            let result = finish(common.json, show_progress, outcome)?;

            if let Some(ref output_path) = args.output {
                write_result(&result, output_path)
                    .await
                    .context("Failed to save result")?;
                if !common.quiet {
                    eprintln!("   saved → {}", bold(&output_path.display().to_string()));
                }
            }
            if !common.json {
                print_result(&result);
            }
        }
        Command::Regenerate(ref args) => {
            let config = build_config(common, None, progress_cb)?;
            let raw = tokio::fs::read_to_string(&args.result)
                .await
                .with_context(|| format!("Failed to read {:?}", args.result))?;
            let mut result: GenerationResult =
                serde_json::from_str(&raw).context("Result file is not a generation result")?;

            let index = args.angle.checked_sub(1).ok_or_else(|| {
                anyhow::anyhow!("Angles are 1-indexed, minimum is 1 (got {})", args.angle)
            })?;
            let outcome = regenerate_angle(&mut result, index, args.platform, &config)
                .await
                .map(|angle| angle.text(args.platform).to_string());
            let new_text = finish(common.json, show_progress, outcome)?;

            let output_path = args.output.as_ref().unwrap_or(&args.result);
            write_result(&result, output_path)
                .await
                .context("Failed to save result")?;
            if !common.json {
                println!("{new_text}");
            }
        }
    }

    Ok(())
}

/// Print JSON on success, or turn an error into the `{"error": ...}` object and exit 1.
///
/// When the spinner is active it has already printed the error, so the
/// process just exits with status 1.
fn finish<T: serde::Serialize>(
    json: bool,
    reported: bool,
    outcome: Result<T, CopyGenError>,
) -> Result<T> {
    match outcome {
        Ok(value) => {
            if json {
                let out = serde_json::to_string_pretty(&value).context("Failed to serialise output")?;
                println!("{out}");
            }
            Ok(value)
        }
        Err(e) if json => {
            let failure = Outcome::<T>::from(Err::<T, CopyGenError>(e));
            let out = serde_json::to_string_pretty(&failure).context("Failed to serialise output")?;
            println!("{out}");
            std::process::exit(1);
        }
        Err(_) if reported => std::process::exit(1),
        Err(e) => Err(e).context("Generation failed"),
    }
}

fn print_result(result: &GenerationResult) {
    for (i, angle) in result.angles.iter().enumerate() {
        println!("{}", bold(&format!("── {}. {} ──", i + 1, angle.angle_label)));
        println!("{}", dim("Instagram"));
        println!("{}\n", angle.instagram_text);
        println!("{}", dim("LinkedIn"));
        println!("{}\n", angle.linkedin_text);
    }
}

/// Map CLI args to `GenerationConfig`.
fn build_config(
    common: &CommonArgs,
    generate: Option<&GenerateArgs>,
    progress: Option<ProgressCallback>,
) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .model(common.model.clone())
        .strategy(common.strategy.into())
        .temperature(common.temperature);

    if let Some(ref key) = common.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(args) = generate {
        builder = builder
            .image_angle_count(args.angles_image)
            .document_angle_count(args.angles_document);
        if let Some(ref pwd) = args.password {
            builder = builder.password(pwd.clone());
        }
        if let Some(ref dir) = args.pdfium_lib_path {
            builder = builder.pdfium_lib_path(dir.clone());
        }
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
