use axum::{
    Router,
    http::{Method, header},
    response::IntoResponse,
    routing::get,
};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    sensitive_headers::SetSensitiveHeadersLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    api::asset_user,
    config::AppConfig,
    response::ServerResult,
    util::{app_state::AppState, org::ORG_HEADER},
};

async fn get_status() -> impl IntoResponse {
    "ok".to_string()
}

pub fn create_app(state: AppState, cfg: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(ORG_HEADER),
        ]);

    Router::new()
        .nest("/asset-users", asset_user::create_route())
        .route("/status", get(get_status))
        .with_state(state)
        .layer(cors)
        .layer(SetSensitiveHeadersLayer::new(std::iter::once(
            header::AUTHORIZATION,
        )))
        .layer(TimeoutLayer::new(Duration::from_secs(
            cfg.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
}

pub async fn serve(state: AppState, cfg: Arc<AppConfig>) -> ServerResult<()> {
    let app = create_app(state, &cfg);

    let listener = TcpListener::bind((cfg.bind_address.as_str(), cfg.rest_port)).await?;
    info!("REST listening on {}:{}", cfg.bind_address, cfg.rest_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("REST server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {e:?}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::backends::{AssetUserManager, memory::MemoryStore};

    #[tokio::test]
    async fn test_status_and_nesting() {
        let store = Arc::new(MemoryStore::default());
        let state = AppState {
            manager: Arc::new(AssetUserManager::new(store.clone(), store)),
        };
        let app = create_app(state, &AppConfig::default());

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/asset-users")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["x-pagination-count"], "0");
    }
}
