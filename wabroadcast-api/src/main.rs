use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use wabroadcast_api::config::ApiConfig;
use wabroadcast_api::helpers;
use wabroadcast_api::integrations::{BridgeLink, SessionLink};
use wabroadcast_api::ImportSettings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Config file to use instead of the per-user `api.toml`
    #[arg(long)]
    config: Option<PathBuf>,
}

fn init_tracing(log_file_path: Option<String>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("wabroadcast-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path);

    let (config, config_path) = match args.config {
        Some(path) => ApiConfig::load_from(path),
        None => ApiConfig::load(),
    }
    .context("Failed to load config")?;
    tracing::info!("Config loaded from {:?}", config_path);

    let (db, db_path) =
        helpers::database::initialize_database(&config).context("Failed to initialize database")?;
    tracing::info!("Database initialized at {:?}", db_path);

    let session_link: Arc<dyn SessionLink> = Arc::new(
        BridgeLink::new(&config.whatsapp).context("Failed to build WhatsApp bridge client")?,
    );
    tracing::info!("WhatsApp bridge at {}", config.whatsapp.bridge_url);

    let import_settings = ImportSettings {
        limit: config.import.limit,
    };

    let (host, port) = config.bind_address();
    tracing::info!("Server will listen on {}:{}", host, port);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        let cors = if let Some(cors_config) = &cors_config {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(import_settings))
            .app_data(web::Data::new(session_link.clone()))
            .configure(wabroadcast_api::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    server.await?;
    Ok(())
}
