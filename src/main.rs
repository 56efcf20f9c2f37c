use std::{net::SocketAddr, sync::Arc};

use sea_orm_migration::MigratorTrait;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokobiru_api::{
    config::AppConfig,
    db::create_orm_conn,
    migration::Migrator,
    routes::create_app,
    services::assistant_service::{GeminiClient, TextGenerator},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tokobiru_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;

    Migrator::up(&orm, None).await?;

    let assistant = GeminiClient::from_config(&config)?
        .map(|client| Arc::new(client) as Arc<dyn TextGenerator>);
    if assistant.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set, chatbot endpoint is disabled");
    }

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let app = create_app(AppState::new(orm, config, assistant));

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
