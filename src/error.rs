use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// The error taxonomy for the whole service, plus the ambient
/// wrapper variants every mutation needs for infra failures that don't map
/// to a semantic kind.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("room or membership not found")]
    NotFound,
    #[error("caller is not the room owner")]
    NotOwner,
    #[error("missing or invalid bearer token")]
    Unauthenticated,
    #[error("room is not joinable")]
    RoomNotJoinable,
    #[error("room is full")]
    RoomFull,
    #[error("caller already owns an active room")]
    HasActiveRoom,
    #[error("operation requires a different room status")]
    WrongStatus,
    #[error("room has too few members to divide")]
    TooFewMembers,
    #[error("label '{0}' is not in the vocabulary")]
    InvalidLabel(String),
    #[error("rule '{0}' is not recognized")]
    InvalidRule(String),
    #[error("more than one label has rule same_team")]
    ConflictingRules,
    #[error("owner cannot remove themselves")]
    CannotRemoveOwner,
    #[error("member not found")]
    MemberNotFound,
    #[error("a room code could not be generated after 10 attempts")]
    CodeExhausted,
    #[error("game name must be between 1 and {0} characters")]
    InvalidGameName(usize),
    #[error("maxMembers must be between {0} and {1}")]
    InvalidMaxMembers(i32, i32),
    #[error("room code already in use")]
    RoomCodeConflict,
    #[error("already a member of this room")]
    AlreadyMember,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound | ServiceError::MemberNotFound => StatusCode::NOT_FOUND,
            ServiceError::NotOwner => StatusCode::FORBIDDEN,
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::RoomNotJoinable
            | ServiceError::RoomFull
            | ServiceError::HasActiveRoom
            | ServiceError::WrongStatus
            | ServiceError::TooFewMembers
            | ServiceError::InvalidLabel(_)
            | ServiceError::InvalidRule(_)
            | ServiceError::ConflictingRules
            | ServiceError::CannotRemoveOwner
            | ServiceError::InvalidGameName(_)
            | ServiceError::InvalidMaxMembers(_, _)
            | ServiceError::RoomCodeConflict
            | ServiceError::AlreadyMember => StatusCode::BAD_REQUEST,
            ServiceError::CodeExhausted
            | ServiceError::Config(_)
            | ServiceError::Database(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "statusCode")]
    status_code: u16,
    message: String,
    timestamp: String,
    path: String,
}

/// Carries the request path through to error rendering; set by middleware.
#[derive(Clone, Default)]
pub struct RequestPath(pub String);

pub struct ErrorResponse {
    pub error: ServiceError,
    pub path: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.error.status();

        if status.is_server_error() {
            tracing::error!(error = %self.error, path = %self.path, "request failed");
        } else {
            tracing::debug!(error = %self.error, path = %self.path, "request rejected");
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            message: self.error.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            path: self.path,
        };

        (status, Json(body)).into_response()
    }
}

/// Bound to an (unauthenticated) path for handlers that fail before a
/// `RequestPath` extension is available.
pub fn with_path(error: ServiceError, uri: &Uri) -> ErrorResponse {
    ErrorResponse { error, path: uri.path().to_string() }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
