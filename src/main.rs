//! Service bootstrap: settings, store connection, router, listener.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use evepod::{app_router, default_observers, domain, AppState, MongoStore, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("evepod=info".parse()?))
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(
        server_name = %settings.server_name,
        db = %settings.mongo.dbname,
        "starting"
    );

    let store =
        MongoStore::connect(&settings.mongo.connection_uri(), &settings.mongo.dbname).await?;
    let state = AppState::new(Arc::new(store), domain(), default_observers());

    let app = app_router(state);
    let listener = TcpListener::bind((settings.host, settings.port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
