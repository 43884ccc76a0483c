mod config;
mod delivery;
mod domain;
mod repository;
mod telemetry;
mod usecase;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    middleware,
    routing::{get, post, put},
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::delivery::http::v1::follows::{follow_user, unfollow_user};
use crate::delivery::http::v1::likes::{like_post, unlike_post};
use crate::delivery::http::v1::middleware::auth_middleware;
use crate::delivery::http::v1::notifications::{
    delete_notification, get_notification, get_unread_count, list_notifications, mark_all_as_read, mark_as_read,
};
use crate::delivery::http::v1::profile::{get_own_profile, get_user_profile};
use crate::delivery::http::v1::ws::notifications_ws;
use crate::repository::postgres::{
    PostgresFollowRepository, PostgresLikeRepository, PostgresNotificationRepository, PostgresPostRepository,
    PostgresUserRepository, create_pool,
};
use crate::usecase::connections::ConnectionRegistry;
use crate::usecase::delivery::NotificationDispatcher;
use crate::usecase::follows::FollowsUseCase;
use crate::usecase::jwt::JwtService;
use crate::usecase::likes::LikesUseCase;
use crate::usecase::notifications::NotificationsUseCase;
use crate::usecase::profile::ProfileUseCase;

pub struct AppState {
    pub notifications_usecase: NotificationsUseCase<PostgresNotificationRepository>,
    pub likes_usecase: LikesUseCase<PostgresLikeRepository, PostgresPostRepository>,
    pub follows_usecase: FollowsUseCase<PostgresFollowRepository, PostgresUserRepository>,
    pub profile_usecase: ProfileUseCase<PostgresUserRepository, PostgresPostRepository, PostgresFollowRepository>,
    pub registry: Arc<ConnectionRegistry>,
    pub jwt_service: JwtService,
    pub metrics_handle: PrometheusHandle,
    pub realtime_ping_interval: Option<Duration>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::from_env()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Held until the end of main so buffered spans are flushed on exit.
    let _telemetry_guard = if config.telemetry_enabled {
        let telemetry_config = telemetry::TelemetryConfig::from(&config);
        let guard = telemetry::init_telemetry_with_subscriber(&telemetry_config, env_filter)
            .map_err(|e| anyhow::anyhow!("failed to initialize telemetry: {e}"))?;
        Some(guard)
    } else {
        telemetry::init_subscriber_without_telemetry(env_filter);
        None
    };

    tracing::info!("starting the social service");

    let metrics_handle = PrometheusBuilder::new().install_recorder()?;
    metrics_process::Collector::default().describe();
    tracing::info!("prometheus metrics initialized");

    tracing::info!(
        telemetry_enabled = config.telemetry_enabled,
        realtime_buffer_size = config.realtime_buffer_size,
        realtime_max_sessions_per_user = config.realtime_max_sessions_per_user,
        "config loaded"
    );

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("database pool created");

    sqlx::migrate!().run(&pool).await?;
    tracing::info!("database migrations applied");

    let user_repository = PostgresUserRepository::new(pool.clone());
    let post_repository = PostgresPostRepository::new(pool.clone());
    let follow_repository = PostgresFollowRepository::new(pool.clone());

    let registry = Arc::new(ConnectionRegistry::new(config.registry_settings()));
    let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));

    let shared_state = Arc::new(AppState {
        notifications_usecase: NotificationsUseCase::new(PostgresNotificationRepository::new(pool.clone()), dispatcher),
        likes_usecase: LikesUseCase::new(PostgresLikeRepository::new(pool), post_repository.clone()),
        follows_usecase: FollowsUseCase::new(follow_repository.clone(), user_repository.clone()),
        profile_usecase: ProfileUseCase::new(user_repository, post_repository, follow_repository),
        registry,
        jwt_service: JwtService::new(config.jwt_secret.clone()),
        metrics_handle,
        realtime_ping_interval: config.ping_interval(),
    });

    let api = Router::new()
        .route("/api/v1/notifications", get(list_notifications))
        .route("/api/v1/notifications/unread-count", get(get_unread_count))
        .route("/api/v1/notifications/read-all", put(mark_all_as_read))
        .route(
            "/api/v1/notifications/{id}",
            get(get_notification).delete(delete_notification),
        )
        .route("/api/v1/notifications/{id}/read", put(mark_as_read))
        .route("/api/v1/posts/{id}/like", post(like_post).delete(unlike_post))
        .route("/api/v1/users/{id}/follow", post(follow_user).delete(unfollow_user))
        .route("/api/v1/users/{id}/profile", get(get_user_profile))
        .route("/api/v1/profile", get(get_own_profile))
        .layer(middleware::from_fn_with_state(
            shared_state.clone(),
            auth_middleware,
        ));

    // The WebSocket route authenticates itself before upgrading.
    let realtime = Router::new().route("/api/v1/notifications/ws", get(notifications_ws));

    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(render_metrics))
        .merge(api)
        .merge(realtime)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, "social service running");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("social service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn render_metrics(State(state): State<Arc<AppState>>) -> String {
    metrics_process::Collector::default().collect();
    metrics::gauge!("realtime_connected_users").set(state.registry.connected_users() as f64);
    state.metrics_handle.render()
}

#[tracing::instrument]
async fn healthz() -> &'static str {
    "OK"
}
