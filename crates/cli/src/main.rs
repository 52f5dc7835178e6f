//! `coldstore` binary entry point.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use coldstore_cli::{Cli, Command, execute, render};
use coldstore_infra::SqliteRecordStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    coldstore_observability::init(cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();

    if let Command::Bill(args) = &cli.command {
        writeln!(stdout, "{}", render::money(args.bill_preview()))?;
        return Ok(());
    }

    let config = cli.store_config()?;
    tracing::info!(database_url = %config.database_url, history = %config.history, "opening inventory database");

    let store = SqliteRecordStore::open(config)
        .await
        .context("failed to open inventory database")?;

    // Close the store whether or not the command succeeded.
    let result = execute(cli.command, &store, &mut stdout).await;
    store.close().await;
    result
}
