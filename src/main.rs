//! RAG-Relay: a chat bot that answers with retrieval-augmented generation
//!
//! This is the main entry point for the application.

use anyhow::Result;
use rag_relay::{
    config,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().skip(1).any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }
    if std::env::args().skip(1).any(|a| a == "-V" || a == "--version") {
        println!("rag-relay {}", rag_relay::VERSION);
        return Ok(());
    }

    // Load configuration before logging so the debug flag picks the level
    let env_file = config::load_env_file();
    let settings_path = config::locate();
    let settings = config::load_from(settings_path.as_deref())?;

    // Initialize logging
    let default_level = if settings.general.debug { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("Starting RAG-Relay v{}", rag_relay::VERSION);
    if let Some(path) = env_file {
        info!("Loaded environment from: {}", path.display());
    }
    match settings_path {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }
    info!("Loaded configuration for instance: {}", settings.general.instance_name);

    for problem in settings.validate() {
        warn!("Configuration: {}", problem);
    }

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized ({})", client.user_agent());

    // Create application state
    let state = AppState::new(settings.clone(), client)?;
    info!(
        "Orchestrator ready: top {} documents, deadline {:?}",
        state.orchestrator.policy().top,
        state.orchestrator.policy().deadline
    );

    // Create router
    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    info!("Server running on http://{}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
RAG-Relay v{}
A chat bot that answers with retrieval-augmented generation

USAGE:
    rag-relay [OPTIONS]

OPTIONS:
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    RAG_RELAY_SETTINGS_PATH  Path to settings.yml
    RAG_RELAY_DEBUG          Enable debug logging (true/false)
    RAG_RELAY_BIND_ADDRESS   Bind address
    PORT                     Server port
    MICROSOFT_APP_ID         Bot Framework app id
    MICROSOFT_APP_PASSWORD   Bot Framework app password
    AZURE_SEARCH_ENDPOINT    Azure AI Search endpoint
    AZURE_SEARCH_KEY         Azure AI Search query key
    AZURE_SEARCH_INDEX       Azure AI Search index name
    OPENAI_API_KEY           OpenAI API key
    OPENAI_MODEL             OpenAI chat model
"#,
        rag_relay::VERSION
    );
}
