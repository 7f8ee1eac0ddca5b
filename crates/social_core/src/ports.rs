//! crates/social_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of a specific datastore.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    NewReaction, NewThought, NewUser, Thought, ThoughtChanges, User, UserChanges, UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the underlying datastore.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A schema constraint was violated on write.
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The document store holding the `users` and `thoughts` collections.
///
/// Every method is a single datastore operation. Lookups by id return
/// `PortError::NotFound` when nothing matches; writes run the checks from
/// [`crate::validation`] first and return `PortError::Validation` on failure.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> PortResult<Vec<UserProfile>>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserProfile>;

    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn update_user(&self, user_id: Uuid, changes: UserChanges) -> PortResult<User>;

    /// Removes the user and returns the document as it was.
    async fn delete_user(&self, user_id: Uuid) -> PortResult<User>;

    /// Set-insert into the user's friend list. Adding a present id is a no-op.
    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> PortResult<User>;

    /// Set-remove from the user's friend list. Removing an absent id is a no-op.
    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> PortResult<User>;

    /// Set-insert of a thought reference into the user's thought list.
    async fn attach_thought(&self, user_id: Uuid, thought_id: Uuid) -> PortResult<User>;

    /// Pulls a thought reference from the user's thought list.
    async fn detach_thought(&self, user_id: Uuid, thought_id: Uuid) -> PortResult<User>;

    // --- Thoughts ---
    async fn list_thoughts(&self) -> PortResult<Vec<Thought>>;

    async fn get_thought(&self, thought_id: Uuid) -> PortResult<Thought>;

    async fn create_thought(&self, thought: NewThought) -> PortResult<Thought>;

    async fn update_thought(
        &self,
        thought_id: Uuid,
        changes: ThoughtChanges,
    ) -> PortResult<Thought>;

    /// Removes the thought and returns the document as it was.
    async fn delete_thought(&self, thought_id: Uuid) -> PortResult<Thought>;

    // --- Reactions (embedded in thoughts) ---

    /// Appends the reaction unless one with the same body and username exists.
    async fn add_reaction(&self, thought_id: Uuid, reaction: NewReaction) -> PortResult<Thought>;

    /// Pulls the reaction with the given id. An unknown reaction id leaves
    /// the thought unchanged.
    async fn remove_reaction(&self, thought_id: Uuid, reaction_id: Uuid) -> PortResult<Thought>;
}
