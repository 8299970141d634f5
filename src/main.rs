use helpdesk_rag::api::{create_router, AppState};
use helpdesk_rag::infrastructure::{read_issue_csv, AppConfig};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "helpdesk_rag=debug,api=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load()?;
    let seed_csv = config.config.ingest.seed_csv.clone();
    let addr = SocketAddr::new(config.config.server.host.parse()?, config.config.server.port);

    let state = AppState::from_config(config).await?;
    info!("knowledge store ready");

    if let Some(path) = seed_csv {
        let seed = read_issue_csv(&path)?;
        match state.knowledge.init_if_empty(seed).await? {
            Some(report) => info!(
                path = %path.display(),
                inserted = report.inserted.len(),
                failed = report.failed.len(),
                "knowledge store seeded"
            ),
            None => info!("knowledge store already populated, seed skipped"),
        }
    }

    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
