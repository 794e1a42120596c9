use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use draftguard_engine::agents::cli_client::ShellCliClient;
use draftguard_engine::agents::{DraftingAgent, ReviewAgent};
use draftguard_engine::{
    DealState, DocumentType, PackageReport, PackageRunner, PipelineController, ProgramCode,
    load_pipeline_config,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the deal state JSON
    #[arg(long)]
    deal: PathBuf,

    /// Document to draft (repeatable), e.g. promissory_note, guaranty
    #[arg(long = "doc-type", required = true)]
    doc_types: Vec<DocumentType>,

    /// Program overlay to apply, e.g. sba_7a
    #[arg(long)]
    program: Option<String>,

    /// Pipeline configuration file
    #[arg(long, default_value = "draftguard.json")]
    config: PathBuf,

    /// AI CLI executable used for drafting and review
    #[arg(long, default_value = "gemini")]
    ai_cli: String,

    /// Model passed to the AI CLI
    #[arg(long)]
    model: Option<String>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Print every prompt and response exchanged with the AI CLI
    #[arg(long, default_value_t = false)]
    debug_ai_cli: bool,

    /// Where to write the package report JSON
    #[arg(long)]
    out: Option<PathBuf>,
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("info,draftguard_cli=debug,draftguard_engine=debug")
    } else {
        EnvFilter::new("warn,draftguard_cli=info,draftguard_engine=info")
    };

    fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn build_client(args: &Args) -> ShellCliClient {
    let mut client = ShellCliClient::new(&args.ai_cli).with_debug(args.debug_ai_cli);
    if let Some(model) = &args.model {
        client = client.with_model(model.clone());
    }
    client
}

async fn write_report(path: &Path, report: &PackageReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

fn print_summary(report: &PackageReport) {
    println!("\n{} {}", style("Deal").bold(), style(&report.deal_id).cyan());
    for result in &report.results {
        let status = if result.accepted {
            style("ACCEPTED").green().bold()
        } else {
            style("REJECTED").red().bold()
        };
        println!(
            "  {} {:<22} attempts: {}{}",
            status,
            result.document_type.as_str(),
            result.attempts,
            if result.used_fallback {
                style(" (fallback prose)").yellow().to_string()
            } else {
                String::new()
            }
        );
        for issue in result.open_critical() {
            println!(
                "      {} [{}] {}",
                style("✗").red(),
                issue.field,
                style(&issue.message).dim()
            );
        }
    }
    for issue in &report.cross_document_issues {
        println!(
            "  {} {} {}",
            style("cross-document").yellow(),
            style(issue.severity).bold(),
            issue.message
        );
    }
    let verdict = if report.accepted() {
        style("Package accepted").green().bold()
    } else {
        style("Package needs attention").red().bold()
    };
    println!("\n{}", verdict);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug);

    println!(
        "\n{}",
        style("   DRAFTGUARD   ").bold().on_blue().white()
    );
    println!("{}", style("----------------").dim());

    let config = load_pipeline_config(&args.config).await?;
    let deal = DealState::load(&args.deal).await?;
    let program = args.program.clone().map(ProgramCode::from);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling in-flight runs");
            let _ = cancel_tx.send(true);
        }
    });

    let registry = Arc::new(config.registry());
    let drafter = DraftingAgent::new(build_client(&args));
    let reviewer = ReviewAgent::new(build_client(&args));
    let controller =
        PipelineController::new(drafter, reviewer, registry, config).with_cancellation(cancel_rx);

    let report = PackageRunner::new(&controller)
        .run(&deal, &args.doc_types, program.as_ref())
        .await?;

    print_summary(&report);
    if let Some(out) = &args.out {
        write_report(out, &report).await?;
        println!("Report written to {}", style(out.display()).cyan());
    }

    if !report.accepted() {
        std::process::exit(2);
    }
    Ok(())
}
