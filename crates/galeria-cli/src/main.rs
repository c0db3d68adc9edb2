//! galeria-migrate: copy the artwork catalog from Supabase to Firestore,
//! converting every image on the way.
//!
//! Exit codes: 0 after a full sweep (even with skipped images or records),
//! 1 when the configuration is invalid or the source catalog is unreachable,
//! 130 when interrupted.

use anyhow::Context;
use clap::Parser;
use galeria_cli::{build_orchestrator, exit_code, init_tracing, Cli, LogFormat, EXIT_FAILURE};
use galeria_core::MigrationConfig;
use galeria_migrate::CancellationToken;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing(LogFormat::from_env());

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Migration could not run");
            EXIT_FAILURE
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = MigrationConfig::from_env().context("Failed to load configuration")?;
    cli.apply(&mut config)?;
    config.validate().context("Invalid configuration")?;

    let orchestrator = build_orchestrator(&config).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing records in flight");
            on_interrupt.cancel();
        }
    });

    let result = orchestrator.run(&cancel).await;
    Ok(exit_code(&result))
}
