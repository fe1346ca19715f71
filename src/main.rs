// src/main.rs
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use trendlens::chunker::{split_content, ContentChunk};
use trendlens::cli::Cli;
use trendlens::fetch::{curated_sources, fetch_chunks, HttpFetcher};
use trendlens::llm::ModelGateway;
use trendlens::monitoring::{init_tracing, MonitoringConfig};
use trendlens::report::{generate_report, save_report, ReportFormat};
use trendlens::{AnalysisPipeline, AppConfig};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    // Loads .env, so it has to come before the logging config.
    let config = AppConfig::from_env();
    let guard = match init_tracing(&MonitoringConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("⚠️ File logging disabled: {}", e);
            None
        }
    };

    let cli = Cli::parse();
    let code = match run(cli, config).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "trendlens failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            1
        }
    };

    // Flush the file writer before exiting.
    drop(guard);
    std::process::exit(code);
}

async fn run(cli: Cli, mut config: AppConfig) -> Result<i32> {
    if cli.check_backend {
        return check_backend(config).await;
    }

    if let Some(model) = &cli.model {
        config.analysis.model = model.clone();
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            bail!("--timeout must be at least one second");
        }
        config.analysis.chunk_timeout = Duration::from_secs(secs);
    }
    if let Some(dir) = &cli.output_dir {
        config.report_dir = dir.clone();
    }

    let params = cli.parameters();
    let chunks = gather_chunks(&cli, &params.industry, config.analysis.max_chunk_chars).await?;
    eprintln!("📦 {} chunk(s) ready for {} analysis", chunks.len(), params.industry);

    let pipeline = AnalysisPipeline::from_config(&config);
    let outcome = pipeline.analyze_chunks(&chunks, &params).await;

    let format = ReportFormat::from(cli.output_format);
    let report = generate_report(
        &outcome.text,
        &outcome.visualizations,
        &params.industry,
        pipeline.prompts().report_date(),
        format,
    );
    let path = save_report(&config.report_dir, &params.industry, format, &report)
        .with_context(|| format!("failed to write report under {}", config.report_dir.display()))?;

    if let Some(findings_path) = &cli.findings_json {
        write_findings(findings_path, &outcome.findings)?;
    }

    info!(path = %path.display(), status = ?outcome.status, "Report saved");
    println!("{}", path.display());
    Ok(0)
}

async fn check_backend(config: AppConfig) -> Result<i32> {
    let gateway = ModelGateway::ollama(config.gateway);
    match gateway.check_backend().await {
        Ok(models) => {
            println!("✅ Ollama reachable at {}", gateway.backend_url());
            if models.is_empty() {
                println!("⚠️ No models installed. Run `ollama pull llama3`.");
            }
            for model in models {
                println!("  - {}", model);
            }
            Ok(0)
        }
        Err(e) => {
            println!("❌ {}", e);
            println!("   {}", e.recovery_hint());
            Ok(1)
        }
    }
}

async fn gather_chunks(cli: &Cli, industry: &str, max_chars: usize) -> Result<Vec<ContentChunk>> {
    let mut urls = cli.urls.clone();
    if cli.curated {
        let curated = curated_sources(industry);
        if curated.is_empty() {
            bail!("no curated sources for {}; pass --url instead", industry);
        }
        urls.extend(curated.iter().map(|(_, url)| url.to_string()));
    }

    if !urls.is_empty() {
        let fetcher = HttpFetcher::new(FETCH_TIMEOUT).context("failed to build HTTP client")?;
        let chunks = fetch_chunks(&fetcher, industry, &urls, max_chars).await;
        if chunks.is_empty() {
            bail!("none of the {} source(s) returned usable content", urls.len());
        }
        return Ok(chunks);
    }

    let text = match &cli.file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read input file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            buf
        }
    };

    if text.trim().is_empty() {
        bail!("input content is empty");
    }

    Ok(split_content(&text, max_chars)
        .into_iter()
        .map(ContentChunk::new)
        .collect())
}

fn write_findings(path: &Path, findings: &Option<trendlens::StructuredFindings>) -> Result<()> {
    let json = serde_json::to_string_pretty(findings).context("failed to serialize findings")?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
