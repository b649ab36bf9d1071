mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trax_ai::{OpenAiAnalyzer, OpenAiConfig};
use trax_core::resolve_identity;
use trax_pdf::{PdfTextSource, TextSource, resolve_date};
use trax_pipeline::{BatchRunner, rebuild_dashboard};
use trax_store::{DASHBOARD_DIR, OutputLayout};

#[derive(Parser)]
#[command(name = "trax", version, about = "Analyze TRAX transformer test reports")]
struct Cli {
    /// Debug-level logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze every PDF in a folder and build the dashboards
    Analyze {
        /// Folder containing the report PDFs
        folder: PathBuf,

        /// Where to create Reports/, JSON_Data/ and Dashboard_CSVs/ (default: FOLDER)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },
    /// Analyze a single PDF
    AnalyzeFile {
        pdf: PathBuf,

        /// Use this equipment name instead of inferring one
        #[arg(long)]
        equipment: Option<String>,

        /// Output root (default: the PDF's folder)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },
    /// Show the identity and date a PDF would be filed under
    Identify { pdf: PathBuf },
    /// Rebuild the dashboard CSVs from saved *_analysis.json files
    Dashboard {
        json_dir: PathBuf,

        /// Output folder (default: Dashboard_CSVs next to JSON_DIR)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct AnalyzerArgs {
    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "TRAX_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Chat-completions base URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    api_base: String,

    /// Attempts per report for rate limits and server errors
    #[arg(long, default_value_t = 3)]
    max_retries: usize,

    /// Report text beyond this many characters is cut before prompting
    #[arg(long, default_value_t = 15_000)]
    max_prompt_chars: usize,

    #[arg(long, default_value_t = 0.01)]
    temperature: f32,

    #[arg(long, default_value_t = 6_000)]
    max_tokens: u32,
}

impl AnalyzerArgs {
    fn build(self) -> anyhow::Result<OpenAiAnalyzer> {
        let api_key = self
            .api_key
            .context("no API key: set OPENAI_API_KEY or pass --api-key")?;
        let config = OpenAiConfig {
            api_key,
            model: self.model,
            base_url: self.api_base,
            max_retries: self.max_retries,
            max_prompt_chars: self.max_prompt_chars,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let analyzer = OpenAiAnalyzer::new(config).context("configuring analyzer")?;
        tracing::info!(model = analyzer.model(), "analyzer ready");
        Ok(analyzer)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze {
            folder,
            out,
            analyzer,
        } => {
            let runner = BatchRunner::new(PdfTextSource, analyzer.build()?);
            let out = out.unwrap_or_else(|| folder.clone());
            let report = runner
                .run(&folder, &out)
                .await
                .with_context(|| format!("analyzing {}", folder.display()))?;
            display::print_batch(&report);
        }
        Command::AnalyzeFile {
            pdf,
            equipment,
            out,
            analyzer,
        } => {
            let runner = BatchRunner::new(PdfTextSource, analyzer.build()?);
            let out = out.unwrap_or_else(|| parent_or_cwd(&pdf));
            let layout = OutputLayout::under(&out);
            layout.create().context("creating output folders")?;

            let outcome = runner.process_file(&pdf, equipment.as_deref(), &layout).await;
            display::print_outcome(&outcome, &layout);
            if let Some(error) = outcome.error {
                bail!("{}: {error}", pdf.display());
            }
        }
        Command::Identify { pdf } => {
            let source = PdfTextSource;
            let text = source
                .extract_text(&pdf)
                .with_context(|| format!("reading {}", pdf.display()))?;
            let date = resolve_date(&source, &pdf, &text);
            let equipment = resolve_identity(&text);
            display::print_identity(&pdf, &text, &equipment, date);
        }
        Command::Dashboard { json_dir, out } => {
            let out = out.unwrap_or_else(|| parent_or_cwd(&json_dir).join(DASHBOARD_DIR));
            let rebuild = rebuild_dashboard(&json_dir, &out)
                .with_context(|| format!("rebuilding dashboards from {}", json_dir.display()))?;
            display::print_rebuild(&rebuild);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parent_or_cwd(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
