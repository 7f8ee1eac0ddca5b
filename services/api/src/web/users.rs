//! services/api/src/web/users.rs
//!
//! User endpoints: CRUD over the `users` collection plus friend-list mutation.

use crate::error::{ApiError, ErrorBody, MessageBody};
use crate::web::extract::{JsonBody, PathParams};
use crate::web::rest::{UserProfileResponse, UserResponse};
use crate::web::state::AppState;
use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use social_core::domain::{NewUser, UserChanges};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

pub const NO_USER: &str = "No user found with that ID";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

/// Only the fields present in the body are changed.
#[derive(Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteUserResponse {
    pub message: String,
    pub user: UserResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /users - List every user with thoughts and friends populated
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserProfileResponse]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserProfileResponse>>, ApiError> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /users/{user_id} - Fetch one user with thoughts and friends populated
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "The user's id.")),
    responses(
        (status = 200, description = "The user", body = UserProfileResponse),
        (status = 404, description = "No such user", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    PathParams(user_id): PathParams<Uuid>,
) -> Result<Json<UserProfileResponse>, ApiError> {
    let user = state
        .db
        .get_user(user_id)
        .await
        .map_err(ApiError::not_found_as(NO_USER))?;
    Ok(Json(user.into()))
}

/// POST /users - Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Schema check failed", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .create_user(NewUser {
            username: req.username,
            email: req.email,
        })
        .await?;
    info!(user_id = %user.id, "Created user {}", user.username);
    Ok(Json(user.into()))
}

/// PUT /users/{user_id} - Merge the supplied fields into a user
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "The user's id.")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 400, description = "Schema check failed", body = ErrorBody),
        (status = 404, description = "No such user", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    PathParams(user_id): PathParams<Uuid>,
    JsonBody(req): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let changes = UserChanges {
        username: req.username,
        email: req.email,
    };
    let user = state
        .db
        .update_user(user_id, changes)
        .await
        .map_err(ApiError::not_found_as(NO_USER))?;
    Ok(Json(user.into()))
}

/// DELETE /users/{user_id} - Delete a user
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "The user's id.")),
    responses(
        (status = 200, description = "User deleted", body = DeleteUserResponse),
        (status = 404, description = "No such user", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    PathParams(user_id): PathParams<Uuid>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    let user = state
        .db
        .delete_user(user_id)
        .await
        .map_err(ApiError::not_found_as(NO_USER))?;
    info!(user_id = %user.id, "Deleted user {}", user.username);
    Ok(Json(DeleteUserResponse {
        message: "User deleted successfully".to_string(),
        user: user.into(),
    }))
}

/// POST /users/{user_id}/friends/{friend_id} - Add a friend (no-op when already present)
#[utoipa::path(
    post,
    path = "/users/{user_id}/friends/{friend_id}",
    tag = "users",
    params(
        ("user_id" = Uuid, Path, description = "The user whose friend list changes."),
        ("friend_id" = Uuid, Path, description = "The friend to add.")
    ),
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 404, description = "No such user", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn add_friend_handler(
    State(state): State<Arc<AppState>>,
    PathParams((user_id, friend_id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .add_friend(user_id, friend_id)
        .await
        .map_err(ApiError::not_found_as(NO_USER))?;
    Ok(Json(user.into()))
}

/// DELETE /users/{user_id}/friends/{friend_id} - Remove a friend (no-op when absent)
#[utoipa::path(
    delete,
    path = "/users/{user_id}/friends/{friend_id}",
    tag = "users",
    params(
        ("user_id" = Uuid, Path, description = "The user whose friend list changes."),
        ("friend_id" = Uuid, Path, description = "The friend to remove.")
    ),
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 404, description = "No such user", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn remove_friend_handler(
    State(state): State<Arc<AppState>>,
    PathParams((user_id, friend_id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .remove_friend(user_id, friend_id)
        .await
        .map_err(ApiError::not_found_as(NO_USER))?;
    Ok(Json(user.into()))
}
