use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use biscuit_server::cli::{format_supported, Cli};
use biscuit_server::config::{LoggingSettings, Settings};
use biscuit_server::core::{initialize, supported_bodies, Classifier, NgramProfiler};
use biscuit_server::routes::{self, AppState};
use clap::Parser;
use std::io::{Error, ErrorKind};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = loaded.map_err(|e| {
        eprintln!("Configuration error: {}", e);
        Error::new(ErrorKind::InvalidInput, e.to_string())
    })?;

    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    init_logging(&settings.logging);

    if cli.supported {
        let bodies = supported_bodies(&settings.corpus.pattern).map_err(|e| {
            error!("Could not list bodies from `{}`: {}", settings.corpus.pattern, e);
            Error::new(ErrorKind::Other, e.to_string())
        })?;
        println!("{}", format_supported(&bodies).trim_end());
        return Ok(());
    }

    info!("Starting biscuit-server...");

    let options = settings.corpus.load_options();
    info!(
        "Loading corpora from `{}` (n-gram order {}, up to {} concurrent loads)",
        settings.corpus.pattern, options.ngram_order, options.max_concurrency
    );

    let profiler = Arc::new(NgramProfiler::new(settings.corpus.profile_size));

    // Nothing is served until every corpus has loaded
    let registry = initialize(Arc::clone(&profiler), &settings.corpus.pattern, &cli.load, &options)
        .await
        .map_err(|e| {
            error!("Startup failed: {}", e);
            Error::new(ErrorKind::Other, e.to_string())
        })?;

    info!("Loaded bodies: {}", registry.labels().join(", "));

    let app_state = AppState {
        classifier: Classifier::new(profiler, registry, options.ngram_order),
        timeout: settings.classification.timeout(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .app_data(routes::form_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
