use std::path::PathBuf;

use anyhow::Context;
use bookstore_kernel::{
    settings::{LoadOptions, Settings},
    InitCtx, ModuleRegistry,
};
use clap::Parser;

/// REST API for managing book records
#[derive(Debug, Parser)]
#[command(name = "bookstore", version, about)]
struct Args {
    /// Environment overlay to load (local, test, staging, production)
    #[arg(long, env = "BOOKSTORE_ENV")]
    env: Option<String>,

    /// Directory holding base.toml and the environment overlays
    #[arg(long, env = "BOOKSTORE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(long)]
    port: Option<u16>,
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::load_from(LoadOptions {
            environment: self.env.clone(),
            config_dir: self.config_dir.clone(),
        })?;

        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }

        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = args
        .settings()
        .with_context(|| "failed to load bookstore settings")?;

    bookstore_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.redacted_url(),
        "bookstore bootstrap starting"
    );

    let pool = bookstore_db::connect(&settings.database).await?;

    let mut registry = ModuleRegistry::new();
    bookstore_app::modules::register_all(&mut registry, &pool);

    bookstore_db::apply_migrations(&pool, &registry.collect_migrations()).await?;

    let ctx = InitCtx {
        settings: &settings,
        db: &pool,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("bookstore bootstrap complete");

    let served =
        bookstore_http::start_server(&registry, &settings, bookstore_http::shutdown_signal()).await;

    registry.stop_modules().await?;
    pool.close().await;

    served
}
