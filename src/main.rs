use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use buscativa::{import, report, AppState, Config, PgStore, Store};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "buscativa")]
#[command(about = "School attendance tracking with active-search alerts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Create or upgrade the database schema
    InitDb,
    /// Record attendance rows from a CSV file (aluno,serie,presencas,aulas)
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Generate a markdown attendance report
    Report {
        #[arg(long)]
        grade: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let store = PgStore::connect(&config.database_url, config.max_connections)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            store.migrate().await.context("failed to migrate schema")?;
            info!("Schema ready, starting server...");
            let state = AppState::new(Arc::new(store));
            buscativa::serve(state, &config.site, &config.address()).await?;
        }
        Commands::InitDb => {
            store.migrate().await.context("failed to migrate schema")?;
            println!("Schema ready.");
        }
        Commands::Import { csv } => {
            let summary = import::import_csv(&store, &csv).await?;
            println!(
                "Recorded {} attendance rows from {} ({} alerts raised).",
                summary.recorded,
                csv.display(),
                summary.alerts
            );
        }
        Commands::Report { grade, out } => {
            let records = store.list_attendance().await?;
            let alerts = store.list_alerts().await?;
            let report = report::build_report(grade.as_deref(), &records, &alerts);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
