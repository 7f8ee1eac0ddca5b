//! services/api/src/web/thoughts.rs
//!
//! Thought endpoints: CRUD over the `thoughts` collection, the embedded
//! reaction list, and the cascade into the owning user's thought list.
//!
//! Create and delete are two separate datastore writes. When the second write
//! finds no user, the first is kept and the response says so.

use crate::error::{ApiError, ErrorBody, MessageBody};
use crate::web::extract::{JsonBody, PathParams};
use crate::web::rest::{ThoughtResponse, UserResponse};
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use social_core::domain::{NewReaction, NewThought, ThoughtChanges};
use social_core::ports::PortError;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

pub const NO_THOUGHT: &str = "No thought found with that ID";
pub const CREATED_WITHOUT_USER: &str = "No user found with that ID, but the thought was created";
pub const DELETED_WITHOUT_USER: &str = "No user found with that ID, but the thought was deleted";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateThoughtRequest {
    pub thought_text: String,
    pub username: String,
    /// The user whose thought list receives the new thought's id.
    pub user_id: Uuid,
}

/// Only the fields present in the body are changed.
#[derive(Deserialize, ToSchema, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateThoughtRequest {
    pub thought_text: Option<String>,
    pub username: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddReactionRequest {
    pub reaction_body: String,
    pub username: String,
}

/// Sent with a 404 when the thought was stored but no user took the reference.
#[derive(Serialize, ToSchema)]
pub struct UnlinkedThoughtResponse {
    pub message: String,
    pub thought: ThoughtResponse,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteThoughtResponse {
    pub message: String,
    pub user_data: UserResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /thoughts - List every thought with its reactions
#[utoipa::path(
    get,
    path = "/thoughts",
    tag = "thoughts",
    responses(
        (status = 200, description = "All thoughts", body = [ThoughtResponse]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_thoughts_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ThoughtResponse>>, ApiError> {
    let thoughts = state.db.list_thoughts().await?;
    Ok(Json(thoughts.into_iter().map(Into::into).collect()))
}

/// GET /thoughts/{id} - Fetch one thought
#[utoipa::path(
    get,
    path = "/thoughts/{id}",
    tag = "thoughts",
    params(("id" = Uuid, Path, description = "The thought's id.")),
    responses(
        (status = 200, description = "The thought", body = ThoughtResponse),
        (status = 404, description = "No such thought", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_thought_handler(
    State(state): State<Arc<AppState>>,
    PathParams(thought_id): PathParams<Uuid>,
) -> Result<Json<ThoughtResponse>, ApiError> {
    let thought = state
        .db
        .get_thought(thought_id)
        .await
        .map_err(ApiError::not_found_as(NO_THOUGHT))?;
    Ok(Json(thought.into()))
}

/// POST /thoughts - Create a thought and add it to the owning user's list
#[utoipa::path(
    post,
    path = "/thoughts",
    tag = "thoughts",
    request_body = CreateThoughtRequest,
    responses(
        (status = 200, description = "Thought created and linked", body = ThoughtResponse),
        (status = 400, description = "Schema check failed", body = ErrorBody),
        (status = 404, description = "Thought created, but no user had the given id", body = UnlinkedThoughtResponse),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_thought_handler(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateThoughtRequest>,
) -> Result<Response, ApiError> {
    // 1. Insert the thought
    let thought = state
        .db
        .create_thought(NewThought {
            thought_text: req.thought_text,
            username: req.username,
        })
        .await?;

    // 2. Reference it from the owner named in the body
    match state.db.attach_thought(req.user_id, thought.id).await {
        Ok(_) => {
            info!(thought_id = %thought.id, user_id = %req.user_id, "Created thought");
            Ok(Json(ThoughtResponse::from(thought)).into_response())
        }
        Err(PortError::NotFound(_)) => {
            warn!(
                thought_id = %thought.id,
                user_id = %req.user_id,
                "Thought created but no user took the reference"
            );
            let body = UnlinkedThoughtResponse {
                message: CREATED_WITHOUT_USER.to_string(),
                thought: thought.into(),
            };
            Ok((StatusCode::NOT_FOUND, Json(body)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// PUT /thoughts/{id} - Merge the supplied fields into a thought
#[utoipa::path(
    put,
    path = "/thoughts/{id}",
    tag = "thoughts",
    params(("id" = Uuid, Path, description = "The thought's id.")),
    request_body = UpdateThoughtRequest,
    responses(
        (status = 200, description = "The updated thought", body = ThoughtResponse),
        (status = 400, description = "Schema check failed", body = ErrorBody),
        (status = 404, description = "No such thought", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn update_thought_handler(
    State(state): State<Arc<AppState>>,
    PathParams(thought_id): PathParams<Uuid>,
    JsonBody(req): JsonBody<UpdateThoughtRequest>,
) -> Result<Json<ThoughtResponse>, ApiError> {
    let changes = ThoughtChanges {
        thought_text: req.thought_text,
        username: req.username,
    };
    let thought = state
        .db
        .update_thought(thought_id, changes)
        .await
        .map_err(ApiError::not_found_as(NO_THOUGHT))?;
    Ok(Json(thought.into()))
}

/// DELETE /thoughts/{id}/{thought_id} - Delete a thought and pull it from a user's list
///
/// The first path segment is the id of the user whose list is updated.
#[utoipa::path(
    delete,
    path = "/thoughts/{id}/{thought_id}",
    tag = "thoughts",
    params(
        ("id" = Uuid, Path, description = "The user whose thought list drops the reference."),
        ("thought_id" = Uuid, Path, description = "The thought to delete.")
    ),
    responses(
        (status = 200, description = "Thought deleted and unlinked", body = DeleteThoughtResponse),
        (status = 404, description = "No such thought, or the thought was deleted but no user had the given id", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn delete_thought_handler(
    State(state): State<Arc<AppState>>,
    PathParams((user_id, thought_id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<DeleteThoughtResponse>, ApiError> {
    // 1. Remove the thought; nothing else happens if it is missing
    state
        .db
        .delete_thought(thought_id)
        .await
        .map_err(ApiError::not_found_as(NO_THOUGHT))?;

    // 2. Pull the reference from the user named in the path
    match state.db.detach_thought(user_id, thought_id).await {
        Ok(user) => {
            info!(%thought_id, %user_id, "Deleted thought");
            Ok(Json(DeleteThoughtResponse {
                message: "Thought deleted successfully".to_string(),
                user_data: user.into(),
            }))
        }
        Err(PortError::NotFound(_)) => {
            warn!(%thought_id, %user_id, "Thought deleted but no user held the reference");
            Err(ApiError::NotFound(DELETED_WITHOUT_USER.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /thoughts/{id}/reactions - Add a reaction unless an identical one exists
#[utoipa::path(
    post,
    path = "/thoughts/{id}/reactions",
    tag = "thoughts",
    params(("id" = Uuid, Path, description = "The thought's id.")),
    request_body = AddReactionRequest,
    responses(
        (status = 200, description = "The updated thought", body = ThoughtResponse),
        (status = 400, description = "Schema check failed", body = ErrorBody),
        (status = 404, description = "No such thought", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn add_reaction_handler(
    State(state): State<Arc<AppState>>,
    PathParams(thought_id): PathParams<Uuid>,
    JsonBody(req): JsonBody<AddReactionRequest>,
) -> Result<Json<ThoughtResponse>, ApiError> {
    let reaction = NewReaction {
        reaction_body: req.reaction_body,
        username: req.username,
    };
    let thought = state
        .db
        .add_reaction(thought_id, reaction)
        .await
        .map_err(ApiError::not_found_as(NO_THOUGHT))?;
    Ok(Json(thought.into()))
}

/// DELETE /thoughts/{id}/reactions/{reaction_id} - Remove a reaction by id
#[utoipa::path(
    delete,
    path = "/thoughts/{id}/reactions/{reaction_id}",
    tag = "thoughts",
    params(
        ("id" = Uuid, Path, description = "The thought's id."),
        ("reaction_id" = Uuid, Path, description = "The reaction to remove.")
    ),
    responses(
        (status = 200, description = "The thought, without the reaction", body = ThoughtResponse),
        (status = 404, description = "No such thought", body = MessageBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn remove_reaction_handler(
    State(state): State<Arc<AppState>>,
    PathParams((thought_id, reaction_id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<ThoughtResponse>, ApiError> {
    let thought = state
        .db
        .remove_reaction(thought_id, reaction_id)
        .await
        .map_err(ApiError::not_found_as(NO_THOUGHT))?;
    Ok(Json(thought.into()))
}
