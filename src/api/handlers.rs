use axum::{Json, extract::Path, extract::State, http::Uri};
use validator::Validate;

use crate::api::auth::AuthenticatedUser;
use crate::api::dto::{ApiResponse, CreateRoomRequest, SetLabelRulesRequest, SetMemberLabelsRequest, SuccessFlag};
use crate::api::state::AppState;
use crate::domain::room::{DEFAULT_MAX_MEMBERS, MAX_GAME_NAME_LEN};
use crate::error::{ErrorResponse, ServiceError, with_path};

type HandlerResult<T> = Result<ApiResponse<T>, ErrorResponse>;

pub async fn create_room(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    uri: Uri,
    Json(body): Json<CreateRoomRequest>,
) -> HandlerResult<crate::domain::RoomSnapshot> {
    body.validate().map_err(|_| with_path(ServiceError::InvalidGameName(MAX_GAME_NAME_LEN), &uri))?;

    let max_members = body.max_members.unwrap_or(DEFAULT_MAX_MEMBERS);
    let snapshot = state
        .room_service
        .create_room(&user_id, &body.game_name, max_members)
        .await
        .map_err(|e| with_path(e, &uri))?;

    Ok(ApiResponse::ok(snapshot))
}

pub async fn my_owned_room(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    uri: Uri,
) -> HandlerResult<Option<crate::domain::RoomSnapshot>> {
    let room = state.room_service.get_my_owned_room(&user_id).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(room))
}

pub async fn my_joined_room(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    uri: Uri,
) -> HandlerResult<Option<crate::domain::RoomSnapshot>> {
    let room = state.room_service.get_my_joined_room(&user_id).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(room))
}

pub async fn get_room(
    State(state): State<AppState>,
    AuthenticatedUser(_user_id): AuthenticatedUser,
    Path(code): Path<String>,
    uri: Uri,
) -> HandlerResult<crate::domain::RoomSnapshot> {
    let room = state.room_service.get_room(&code).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(room))
}

pub async fn join_room(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(code): Path<String>,
    uri: Uri,
) -> HandlerResult<crate::domain::RoomSnapshot> {
    let room = state.room_service.join_room(&user_id, &code).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(room))
}

pub async fn leave_room(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(code): Path<String>,
    uri: Uri,
) -> HandlerResult<SuccessFlag> {
    state.room_service.leave_room(&user_id, &code).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(SuccessFlag::TRUE))
}

pub async fn remove_member(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path((code, member_id)): Path<(String, String)>,
    uri: Uri,
) -> HandlerResult<SuccessFlag> {
    state
        .room_service
        .remove_member(&owner_id, &code, &member_id)
        .await
        .map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(SuccessFlag::TRUE))
}

pub async fn close_room(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path(code): Path<String>,
    uri: Uri,
) -> HandlerResult<SuccessFlag> {
    state.room_service.close_room(&owner_id, &code).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(SuccessFlag::TRUE))
}

pub async fn divide_teams(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path(code): Path<String>,
    uri: Uri,
) -> HandlerResult<crate::domain::DivisionResult> {
    let division = state.room_service.divide_teams(&owner_id, &code).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(division))
}

pub async fn redivide_teams(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path(code): Path<String>,
    uri: Uri,
) -> HandlerResult<crate::domain::DivisionResult> {
    let division =
        state.room_service.redivide_teams(&owner_id, &code).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(division))
}

pub async fn get_division_result(
    State(state): State<AppState>,
    AuthenticatedUser(_user_id): AuthenticatedUser,
    Path(code): Path<String>,
    uri: Uri,
) -> HandlerResult<crate::domain::DivisionResult> {
    let division = state.room_service.get_division_result(&code).await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(division))
}

pub async fn set_member_labels(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path((code, member_id)): Path<(String, String)>,
    uri: Uri,
    Json(body): Json<SetMemberLabelsRequest>,
) -> HandlerResult<SuccessFlag> {
    state
        .room_service
        .set_member_labels(&owner_id, &code, &member_id, &body.labels)
        .await
        .map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(SuccessFlag::TRUE))
}

pub async fn set_label_rules(
    State(state): State<AppState>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Path(code): Path<String>,
    uri: Uri,
    Json(body): Json<SetLabelRulesRequest>,
) -> HandlerResult<SuccessFlag> {
    let rules: Vec<(String, String)> = body.label_rules.into_iter().collect();
    state
        .room_service
        .set_label_rules(&owner_id, &code, &rules)
        .await
        .map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(SuccessFlag::TRUE))
}

#[derive(serde::Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

pub async fn healthz(State(state): State<AppState>, uri: Uri) -> HandlerResult<HealthBody> {
    state.room_service.health().await.map_err(|e| with_path(e, &uri))?;
    Ok(ApiResponse::ok(HealthBody { status: "ok" }))
}
