use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backoffice_server::config::{self, DEFAULT_CONFIG_PATH};
use backoffice_server::store::DbStore;
use backoffice_server::{BackofficeState, data, init_state, logging, routing};
use clap::Parser;
use salvo::prelude::*;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let conf = config::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    logging::init(&conf.logger)?;

    tracing::info!(listen_addr = %conf.listen_addr, "starting backoffice server");
    data::init(&conf.db)?;
    data::migrate()?;

    init_state(BackofficeState::new(Arc::new(DbStore), conf.admin.clone()))?;

    let service = Service::new(routing::root()).hoop(Logger::new());
    let acceptor = TcpListener::new(conf.listen_addr.clone()).bind().await;
    tracing::info!("listening on {}", conf.listen_addr);
    Server::new(acceptor).serve(service).await;
    Ok(())
}
