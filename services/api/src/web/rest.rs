//! services/api/src/web/rest.rs
//!
//! Contains the JSON document shapes shared by the REST handlers and the
//! master definition for the OpenAPI specification.

use crate::error::{ErrorBody, MessageBody};
use crate::web::{thoughts, users};
use chrono::{DateTime, Utc};
use serde::Serialize;
use social_core::domain::{Reaction, Thought, User, UserProfile};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        users::list_users_handler,
        users::get_user_handler,
        users::create_user_handler,
        users::update_user_handler,
        users::delete_user_handler,
        users::add_friend_handler,
        users::remove_friend_handler,
        thoughts::list_thoughts_handler,
        thoughts::get_thought_handler,
        thoughts::create_thought_handler,
        thoughts::update_thought_handler,
        thoughts::delete_thought_handler,
        thoughts::add_reaction_handler,
        thoughts::remove_reaction_handler,
    ),
    components(
        schemas(
            UserResponse,
            UserProfileResponse,
            ThoughtResponse,
            ReactionResponse,
            MessageBody,
            ErrorBody,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            users::DeleteUserResponse,
            thoughts::CreateThoughtRequest,
            thoughts::UpdateThoughtRequest,
            thoughts::AddReactionRequest,
            thoughts::UnlinkedThoughtResponse,
            thoughts::DeleteThoughtResponse,
        )
    ),
    tags(
        (name = "users", description = "Users and their friend lists."),
        (name = "thoughts", description = "Thoughts and their embedded reactions.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Document Payloads
//=========================================================================================

/// A user with its thoughts and friends as id lists.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub thoughts: Vec<Uuid>,
    pub friends: Vec<Uuid>,
    pub friend_count: usize,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            friend_count: user.friend_count(),
            id: user.id,
            username: user.username,
            email: user.email,
            thoughts: user.thoughts,
            friends: user.friends,
        }
    }
}

/// A user with its thoughts and friends resolved into documents.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub thoughts: Vec<ThoughtResponse>,
    pub friends: Vec<UserResponse>,
    pub friend_count: usize,
}

impl From<UserProfile> for UserProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            email: profile.email,
            thoughts: profile.thoughts.into_iter().map(Into::into).collect(),
            friends: profile.friends.into_iter().map(Into::into).collect(),
            friend_count: profile.friend_count,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub thought_text: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub reactions: Vec<ReactionResponse>,
    pub reaction_count: usize,
}

impl From<Thought> for ThoughtResponse {
    fn from(thought: Thought) -> Self {
        Self {
            reaction_count: thought.reaction_count(),
            id: thought.id,
            thought_text: thought.thought_text,
            username: thought.username,
            created_at: thought.created_at,
            reactions: thought.reactions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReactionResponse {
    pub reaction_id: Uuid,
    pub reaction_body: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Reaction> for ReactionResponse {
    fn from(reaction: Reaction) -> Self {
        Self {
            reaction_id: reaction.reaction_id,
            reaction_body: reaction.reaction_body,
            username: reaction.username,
            created_at: reaction.created_at,
        }
    }
}
