use std::sync::Arc;

use tracing::info;

mod api;
mod backends;
mod config;
mod db;
mod models;
mod response;
mod util;

use crate::{
    backends::AssetUserManager, config::AppConfig, db::Mongo, util::app_state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    util::logging::init_tracing();

    let config = Arc::new(AppConfig::load()?);
    info!("Starting authbook server");

    let db = Arc::new(Mongo::connect(&config.mongo_uri, &config.mongo_db).await?);
    db.ensure_indexes().await?;

    let state = AppState {
        manager: Arc::new(AssetUserManager::new(db.clone(), db)),
    };

    api::serve::serve(state, config).await?;
    Ok(())
}
