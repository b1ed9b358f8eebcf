use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use fitroom_ai::{GeminiProvider, GenerationGateway, ModelTransport, ProviderConfig};
use fitroom_core::repositories::postgres::PostgresSessionRepository;
use fitroom_core::services::outfit_service::OutfitStores;
use fitroom_core::storage::LocalBlobStore;
use fitroom_core::{Database, Error, GenerationSettings, OutfitService};

mod api;

use api::AppState;

#[derive(Parser, Debug, Clone)]
#[command(name = "fitroom")]
#[command(author, version, about = "Fitroom - outfit scoring and virtual try-on API")]
struct Args {
    /// Postgres connection URL.
    #[arg(long, env = "DATABASE_URL", default_value = "postgres://postgres@localhost:5432/fitroom")]
    database_url: String,

    #[arg(long, env = "FITROOM_DB_MAX_CONNECTIONS", default_value_t = 10)]
    db_max_connections: u32,

    /// Address the HTTP API binds to.
    #[arg(long, env = "FITROOM_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Root directory of the local object store.
    #[arg(long, env = "FITROOM_STORAGE_DIR", default_value = "./storage")]
    storage_dir: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Override of the Gemini REST base URL.
    #[arg(long, env = "GEMINI_API_BASE")]
    gemini_api_base: Option<String>,

    /// Model used for avatar body analysis.
    #[arg(long, env = "GEMINI_MODEL_TEXT", default_value = fitroom_core::config::DEFAULT_ANALYSIS_MODEL)]
    analysis_model: String,

    #[arg(long, env = "OUTFIT_SCORE_MODEL", default_value = fitroom_core::config::DEFAULT_SCORE_MODEL)]
    score_model: String,

    #[arg(long, env = "TRYON_IMAGE_MODEL", default_value = fitroom_core::config::DEFAULT_TRYON_MODEL)]
    tryon_model: String,

    /// Seconds after which a running generation may be taken over.
    #[arg(long, env = "FITROOM_STALE_LEASE_SECS", default_value_t = 300)]
    stale_lease_secs: u64,
}

impl Args {
    fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            stale_lease_after: Duration::from_secs(self.stale_lease_secs),
            analysis_model: self.analysis_model.clone(),
            score_model: self.score_model.clone(),
            tryon_model: self.tryon_model.clone(),
            ..GenerationSettings::default()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fitroom=info,fitroom_core=info,fitroom_ai=info,tower_http=info"));
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!("Fitroom starting. bind={}, storage_dir={}", args.bind, args.storage_dir);

    if let Err(e) = run_server(args).await {
        error!("Server error: {:?}", e);
        return Err(e.into());
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

async fn run_server(args: Args) -> Result<(), Error> {
    // 1) Connect to Postgres and bring the schema up to date.
    let db = Database::with_max_connections(&args.database_url, args.db_max_connections).await?;
    db.migrate().await?;

    // 2) Model gateway.
    let mut provider_config = ProviderConfig::new(args.gemini_api_key.clone());
    provider_config.api_base = args.gemini_api_base.clone();
    let transport: Arc<dyn ModelTransport> = Arc::new(GeminiProvider::new(provider_config));
    info!("Model transport: {}", transport.name());
    let gateway = Arc::new(GenerationGateway::new(transport));

    // 3) Storage, repositories, orchestrator.
    let blobs = Arc::new(LocalBlobStore::new(&args.storage_dir));
    let settings = args.generation_settings();
    info!(
        score_model = %settings.score_model,
        tryon_model = %settings.tryon_model,
        analysis_model = %settings.analysis_model,
        stale_lease_secs = args.stale_lease_secs,
        "generation settings"
    );
    let stores = OutfitStores::postgres(db.pool().clone(), blobs);
    let service = Arc::new(OutfitService::new(stores, gateway, settings));

    let state = AppState {
        service,
        sessions: Arc::new(PostgresSessionRepository::new(db.pool().clone())),
    };

    // 4) Serve.
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    info!("Fitroom API listening on http://{}", args.bind);
    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Ctrl-C received, shutting down.");
}
