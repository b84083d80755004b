use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use church_school_api::{auth::JwtKey, config::Config, db, store::Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = match &config.database_url {
        Some(url) => Store::Postgres(db::PgStore::new(db::connect(url).await?)),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Store::memory()
        }
    };

    let app = church_school_api::app(store, JwtKey::new(config.jwt_secret.as_str()));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
