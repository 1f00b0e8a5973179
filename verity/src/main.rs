use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use verity::config::{AnalysisConfig, Config, OutputFormat, SensitivityLevel};
use verity::{read_document, report, AnalysisResult, Analyzer, ForensicAnchor};

#[derive(Parser)]
#[command(name = "verity")]
#[command(about = "Detect contradictions in documents and record a verifiable audit trail")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse a single document
    Analyze {
        file: PathBuf,
        #[command(flatten)]
        options: AnalysisOptions,
    },
    /// Analyse two documents and the contradictions between them
    Compare {
        file_a: PathBuf,
        file_b: PathBuf,
        #[command(flatten)]
        options: AnalysisOptions,
    },
    /// Re-check the audit chain of a stored JSON analysis result
    Verify { result: PathBuf },
}

#[derive(Args)]
struct AnalysisOptions {
    /// low, medium or high
    #[arg(long)]
    sensitivity: Option<SensitivityLevel>,

    /// json, text or markdown
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Skip majority verification; findings are reported unverified
    #[arg(long)]
    no_verification: bool,

    /// Do not compute document digests or the audit trail
    #[arg(long)]
    no_forensic: bool,
}

impl AnalysisOptions {
    fn apply(&self, config: &Config) -> (AnalysisConfig, OutputFormat) {
        let mut analysis = config.analysis.clone();
        if let Some(level) = self.sensitivity {
            analysis.sensitivity_level = level;
        }
        if self.no_verification {
            analysis.enable_triple_verification = false;
        }
        if self.no_forensic {
            analysis.generate_forensic_hash = false;
        }
        (analysis, self.format.unwrap_or(config.output.format))
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "verity=info".into());
    let json = std::env::var("VERITY_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("invalid VERITY_* configuration")?;
    let analyzer = Analyzer::new();

    match cli.command {
        Command::Analyze { file, options } => {
            let (analysis, format) = options.apply(&config);
            let text = read_document(&file)?;
            let result = analyzer
                .analyze(&text, &analysis)
                .await
                .with_context(|| format!("analysis of {} failed", file.display()))?;
            println!("{}", report::render_analysis(&result, format)?);
        }
        Command::Compare {
            file_a,
            file_b,
            options,
        } => {
            let (analysis, format) = options.apply(&config);
            let text_a = read_document(&file_a)?;
            let text_b = read_document(&file_b)?;
            let result = analyzer
                .compare_documents(&text_a, &text_b, &analysis)
                .await
                .context("comparison failed")?;
            println!("{}", report::render_comparison(&result, format)?);
        }
        Command::Verify { result } => {
            let raw = read_document(&result)?;
            let stored: AnalysisResult = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not an analysis result", result.display()))?;
            ForensicAnchor::verify(&stored)
                .with_context(|| format!("audit chain of {} is invalid", result.display()))?;
            let head = stored
                .forensic_data
                .as_ref()
                .map(|f| f.integrity.chain_head.to_string())
                .unwrap_or_default();
            tracing::info!(chain_head = %head, "Audit chain verified");
            println!("OK {head}");
        }
    }

    Ok(())
}
