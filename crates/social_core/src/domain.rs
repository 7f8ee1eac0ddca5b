//! crates/social_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Stored Documents
//=========================================================================================

/// A user as stored: its thoughts and friends are held by reference only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Ids of the thoughts this user posted, in insertion order.
    pub thoughts: Vec<Uuid>,
    /// Ids of other users, in insertion order, without duplicates.
    pub friends: Vec<Uuid>,
}

impl User {
    pub fn friend_count(&self) -> usize {
        self.friends.len()
    }
}

/// A user with its thought and friend references resolved into documents.
///
/// References that no longer resolve (a deleted friend, an orphaned thought id)
/// are skipped.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub thoughts: Vec<Thought>,
    pub friends: Vec<User>,
    /// Number of stored friend references, resolved or not.
    pub friend_count: usize,
}

/// A short post. `username` is a denormalized copy of the author's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thought {
    pub id: Uuid,
    pub thought_text: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub reactions: Vec<Reaction>,
}

impl Thought {
    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }
}

/// A reply embedded in a thought. It has no lifecycle outside its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub reaction_id: Uuid,
    pub reaction_body: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Write Payloads
//=========================================================================================

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

/// A partial update: only the fields that are `Some` change.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewThought {
    pub thought_text: String,
    pub username: String,
}

/// A partial update: only the fields that are `Some` change.
#[derive(Debug, Clone, Default)]
pub struct ThoughtChanges {
    pub thought_text: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReaction {
    pub reaction_body: String,
    pub username: String,
}

impl Reaction {
    /// Two reactions carry the same content when body and author match.
    pub fn same_content(&self, other: &NewReaction) -> bool {
        self.reaction_body == other.reaction_body && self.username == other.username
    }
}
