//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. The two
//! collections live behind a single `RwLock`; every port method takes the lock
//! once, so each operation is atomic on its own while multi-step handler flows
//! are not. Selected with `DATABASE_URL=memory://` and used by the test suite.

use async_trait::async_trait;
use chrono::Utc;
use social_core::domain::{
    NewReaction, NewThought, NewUser, Reaction, Thought, ThoughtChanges, User, UserChanges,
    UserProfile,
};
use social_core::ports::{DatabaseService, PortError, PortResult};
use social_core::validation;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    thoughts: Vec<Thought>,
}

impl Collections {
    fn user(&self, user_id: Uuid) -> PortResult<&User> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| user_not_found(user_id))
    }

    fn user_mut(&mut self, user_id: Uuid) -> PortResult<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| user_not_found(user_id))
    }

    fn thought_mut(&mut self, thought_id: Uuid) -> PortResult<&mut Thought> {
        self.thoughts
            .iter_mut()
            .find(|t| t.id == thought_id)
            .ok_or_else(|| thought_not_found(thought_id))
    }

    /// Rejects a username or email already held by a user other than `except`.
    fn ensure_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<Uuid>,
    ) -> PortResult<()> {
        for other in self.users.iter().filter(|u| Some(u.id) != except) {
            if username == Some(other.username.as_str()) {
                return Err(PortError::Validation(format!(
                    "username: '{}' is already taken",
                    other.username
                )));
            }
            if email == Some(other.email.as_str()) {
                return Err(PortError::Validation(format!(
                    "email: '{}' is already registered",
                    other.email
                )));
            }
        }
        Ok(())
    }

    fn populate(&self, user: &User) -> UserProfile {
        let thoughts = user
            .thoughts
            .iter()
            .filter_map(|id| self.thoughts.iter().find(|t| t.id == *id))
            .cloned()
            .collect();
        let friends = user
            .friends
            .iter()
            .filter_map(|id| self.users.iter().find(|u| u.id == *id))
            .cloned()
            .collect();
        UserProfile {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            thoughts,
            friends,
            friend_count: user.friend_count(),
        }
    }
}

fn user_not_found(user_id: Uuid) -> PortError {
    PortError::NotFound(format!("User {} not found", user_id))
}

fn thought_not_found(thought_id: Uuid) -> PortError {
    PortError::NotFound(format!("Thought {} not found", thought_id))
}

/// Set-insert: appends `id` unless it is already present.
fn add_to_set(list: &mut Vec<Uuid>, id: Uuid) {
    if !list.contains(&id) {
        list.push(id);
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A document store held entirely in process memory.
#[derive(Default)]
pub struct MemoryAdapter {
    store: RwLock<Collections>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for MemoryAdapter {
    async fn list_users(&self) -> PortResult<Vec<UserProfile>> {
        let store = self.store.read().await;
        Ok(store.users.iter().map(|u| store.populate(u)).collect())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserProfile> {
        let store = self.store.read().await;
        let user = store.user(user_id)?;
        Ok(store.populate(user))
    }

    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let user = validation::validate_new_user(user)?;
        let mut store = self.store.write().await;
        store.ensure_unique(Some(&user.username), Some(&user.email), None)?;

        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            thoughts: Vec::new(),
            friends: Vec::new(),
        };
        store.users.push(record.clone());
        Ok(record)
    }

    async fn update_user(&self, user_id: Uuid, changes: UserChanges) -> PortResult<User> {
        let changes = validation::validate_user_changes(changes)?;
        let mut store = self.store.write().await;
        store.user(user_id)?;
        store.ensure_unique(
            changes.username.as_deref(),
            changes.email.as_deref(),
            Some(user_id),
        )?;

        let user = store.user_mut(user_id)?;
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<User> {
        let mut store = self.store.write().await;
        let index = store
            .users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| user_not_found(user_id))?;
        Ok(store.users.remove(index))
    }

    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> PortResult<User> {
        let mut store = self.store.write().await;
        let user = store.user_mut(user_id)?;
        add_to_set(&mut user.friends, friend_id);
        Ok(user.clone())
    }

    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> PortResult<User> {
        let mut store = self.store.write().await;
        let user = store.user_mut(user_id)?;
        user.friends.retain(|id| *id != friend_id);
        Ok(user.clone())
    }

    async fn attach_thought(&self, user_id: Uuid, thought_id: Uuid) -> PortResult<User> {
        let mut store = self.store.write().await;
        let user = store.user_mut(user_id)?;
        add_to_set(&mut user.thoughts, thought_id);
        Ok(user.clone())
    }

    async fn detach_thought(&self, user_id: Uuid, thought_id: Uuid) -> PortResult<User> {
        let mut store = self.store.write().await;
        let user = store.user_mut(user_id)?;
        user.thoughts.retain(|id| *id != thought_id);
        Ok(user.clone())
    }

    async fn list_thoughts(&self) -> PortResult<Vec<Thought>> {
        Ok(self.store.read().await.thoughts.clone())
    }

    async fn get_thought(&self, thought_id: Uuid) -> PortResult<Thought> {
        self.store
            .read()
            .await
            .thoughts
            .iter()
            .find(|t| t.id == thought_id)
            .cloned()
            .ok_or_else(|| thought_not_found(thought_id))
    }

    async fn create_thought(&self, thought: NewThought) -> PortResult<Thought> {
        let thought = validation::validate_new_thought(thought)?;
        let record = Thought {
            id: Uuid::new_v4(),
            thought_text: thought.thought_text,
            username: thought.username,
            created_at: Utc::now(),
            reactions: Vec::new(),
        };
        self.store.write().await.thoughts.push(record.clone());
        Ok(record)
    }

    async fn update_thought(
        &self,
        thought_id: Uuid,
        changes: ThoughtChanges,
    ) -> PortResult<Thought> {
        let changes = validation::validate_thought_changes(changes)?;
        let mut store = self.store.write().await;
        let thought = store.thought_mut(thought_id)?;
        if let Some(text) = changes.thought_text {
            thought.thought_text = text;
        }
        if let Some(username) = changes.username {
            thought.username = username;
        }
        Ok(thought.clone())
    }

    async fn delete_thought(&self, thought_id: Uuid) -> PortResult<Thought> {
        let mut store = self.store.write().await;
        let index = store
            .thoughts
            .iter()
            .position(|t| t.id == thought_id)
            .ok_or_else(|| thought_not_found(thought_id))?;
        Ok(store.thoughts.remove(index))
    }

    async fn add_reaction(&self, thought_id: Uuid, reaction: NewReaction) -> PortResult<Thought> {
        let reaction = validation::validate_new_reaction(reaction)?;
        let mut store = self.store.write().await;
        let thought = store.thought_mut(thought_id)?;
        if !thought.reactions.iter().any(|r| r.same_content(&reaction)) {
            thought.reactions.push(Reaction {
                reaction_id: Uuid::new_v4(),
                reaction_body: reaction.reaction_body,
                username: reaction.username,
                created_at: Utc::now(),
            });
        }
        Ok(thought.clone())
    }

    async fn remove_reaction(&self, thought_id: Uuid, reaction_id: Uuid) -> PortResult<Thought> {
        let mut store = self.store.write().await;
        let thought = store.thought_mut(thought_id)?;
        thought.reactions.retain(|r| r.reaction_id != reaction_id);
        Ok(thought.clone())
    }
}
