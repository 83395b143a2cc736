//! Learning Gateway - Adaptive Learning AI Service

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use learning_gateway::{create_router, AppState, Args, APP_NAME, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "learning_gateway={level},learning_agent={level},tower_http=info,info",
            level = args.log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Validate configuration
    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let engine_config = match args.engine_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("======================================");
    info!("  {} v{}", APP_NAME, VERSION);
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", engine_config.mode.as_str());
    info!("Agent retries: {}", engine_config.agent.max_retries);
    info!(
        "Sampling: temperature={} top_p={}",
        engine_config.agent.temperature, engine_config.agent.top_p
    );
    info!("Provider keys: {:?}", engine_config.keys);
    info!("======================================");

    let engine = match learning_agent::build_engine(&engine_config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Engine setup failed: {}", e);
            std::process::exit(1);
        }
    };

    let app = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("Listening on {}", args.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
