use clap::{Parser, Subcommand};
use tracing::error;

mod config;
mod constants;
mod domain;
mod error;
mod logging;
mod observability;
mod pipeline;
mod scheduler;
mod storage;
mod tabular;

use crate::config::Config;
use crate::pipeline::orchestrator::PipelineOrchestrator;
use crate::storage::{JsonWorkbookStore, WorkbookStore};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "padron-sync")]
#[command(about = "Affiliate registry reconciliation pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile size tiers and publish the transition tables
    Sizes,
    /// Consolidate the training sheets into the training dashboard
    Training,
    /// Build the consolidated company overview
    Dashboard,
    /// Publish the manager-gender summary per tier
    Gender,
    /// Run every job in order
    Run {
        /// Keep re-running on the configured interval
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let store: Arc<dyn WorkbookStore> = Arc::new(JsonWorkbookStore::new(config.workbook_path()?));
    let orchestrator = PipelineOrchestrator::new(store);

    match cli.command {
        Commands::Sizes => {
            println!("🔄 Reconciling company sizes...");
            let (companies, transitions) = orchestrator.run_sizes().await?;
            println!("📊 {} companies reconciled, {} tier transitions", companies, transitions);
        }
        Commands::Training => {
            println!("🔄 Consolidating training records...");
            let companies = orchestrator.run_training().await?;
            println!("📊 {} companies in the training dashboard", companies);
        }
        Commands::Dashboard => {
            println!("🔄 Building company overview...");
            let companies = orchestrator.run_dashboard().await?;
            println!("📊 {} companies in the overview", companies);
        }
        Commands::Gender => {
            println!("🔄 Summarizing manager gender by tier...");
            let tiers = orchestrator.run_gender().await?;
            println!("📊 {} tiers summarized", tiers);
        }
        Commands::Run { watch } => {
            if watch {
                scheduler::run_forever(orchestrator, config.run_interval_secs()).await;
            } else {
                println!("🔄 Running full pipeline...");
                match orchestrator.run_all().await {
                    Ok(summary) => {
                        println!("✅ Run {} completed", summary.run_id);
                        println!("   Companies: {}", summary.companies_reconciled);
                        println!("   Transitions: {}", summary.transitions_detected);
                        println!("   Tables written: {}", summary.tables_written.join(", "));
                    }
                    Err(e) => {
                        error!("pipeline run failed: {e:#}");
                        println!("❌ Pipeline run failed: {e:#}");
                        std::process::exit(1);
                    }
                }
            }
        }
    }

    Ok(())
}
