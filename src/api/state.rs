use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthProvider;
use crate::service::RoomService;

#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub auth_provider: Arc<dyn AuthProvider>,
}

impl FromRef<AppState> for Arc<dyn AuthProvider> {
    fn from_ref(state: &AppState) -> Self {
        state.auth_provider.clone()
    }
}
