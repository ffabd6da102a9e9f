use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;

use crate::api::AppState;
use crate::auth::{AuthProvider, DeterministicAuthProvider, ReqwestAuthProvider};
use crate::config::AppConfig;
use crate::publisher::BroadcastPublisher;
use crate::repository::SeaOrmRoomRepository;
use crate::service::RoomService;

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod publisher;
pub mod repository;
pub mod service;
pub mod solver;

#[cfg(test)]
pub mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let _logging_guard = logging::init(&config);

    info!(listen_addr = %config.listen_addr, "starting room-party");

    let repository = SeaOrmRoomRepository::new(&config.db_connection, config.db_pool_size).await?;
    repository.run_migrations().await?;

    let auth_provider: Arc<dyn AuthProvider> = if config.auth_provider_url.is_empty() {
        tracing::warn!("auth_provider_url is empty, falling back to the deterministic test provider");
        Arc::new(DeterministicAuthProvider)
    } else {
        Arc::new(ReqwestAuthProvider::new(
            config.auth_provider_url.clone(),
            config.auth_provider_appid.clone(),
            config.auth_provider_secret.clone(),
        ))
    };

    let room_service = Arc::new(RoomService::new(
        Arc::new(repository),
        Arc::new(BroadcastPublisher::new()),
        StdRng::from_os_rng(),
    ));

    spawn_stale_room_sweep(room_service.clone(), config.stale_room_ttl_secs);

    let state = AppState { room_service, auth_provider };
    let app = api::router(state, Duration::from_secs(config.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically closes `waiting` rooms that have sat idle past the
/// configured TTL, using the same path an owner-initiated close takes.
fn spawn_stale_room_sweep(room_service: Arc<RoomService>, ttl_secs: u64) {
    let interval = Duration::from_secs(ttl_secs.max(1) / 2);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match room_service.close_stale_rooms(ttl_secs).await {
                Ok(0) => {}
                Ok(n) => info!(count = n, "closed stale rooms"),
                Err(err) => tracing::error!(%err, "stale room sweep failed"),
            }
        }
    });
}
