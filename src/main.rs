use anyhow::{Context, Result};
use clap::Parser;
use presenca::cli::Cli;
use presenca::commands::Dispatcher;
use presenca::config::Config;
use presenca::query::QueryPlanner;
use presenca::store::Session;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    config.validate()?;

    let sections = args.command.sections(&config)?;
    let zone = config.meeting.zone()?;

    let session = Session::new(config.store.clone());
    let store = match session.store() {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "failed to open store session");
            eprintln!("❌ Erro ao conectar ao banco de dados: {}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let planner = QueryPlanner::new(store, config.meeting.collection.as_str(), zone);
    let dispatcher = Dispatcher::new(planner, config.export.output_dir.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let failures = dispatcher.run_batch(&mut out, &sections);

    for failure in &failures {
        eprintln!("{}", failure.diagnostic());
    }

    if failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
