//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `social_core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! The document shape is spread over tables: a user's thought and friend lists
//! live in `user_thoughts` / `user_friends` (ordered by `position`), and a
//! thought's embedded reactions live in `reactions`. Mutations that also read
//! the resulting document back run inside one short transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use social_core::domain::{
    NewReaction, NewThought, NewUser, Reaction, Thought, ThoughtChanges, User, UserChanges,
    UserProfile,
};
use social_core::ports::{DatabaseService, PortError, PortResult};
use social_core::validation;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
}
impl UserRecord {
    fn to_domain(self, thoughts: Vec<Uuid>, friends: Vec<Uuid>) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            thoughts,
            friends,
        }
    }
}

/// One entry of a user's `thoughts` or `friends` list.
#[derive(FromRow)]
struct ReferenceRecord {
    owner_id: Uuid,
    target_id: Uuid,
}

#[derive(FromRow)]
struct ThoughtRecord {
    id: Uuid,
    thought_text: String,
    username: String,
    created_at: DateTime<Utc>,
}
impl ThoughtRecord {
    fn to_domain(self, reactions: Vec<Reaction>) -> Thought {
        Thought {
            id: self.id,
            thought_text: self.thought_text,
            username: self.username,
            created_at: self.created_at,
            reactions,
        }
    }
}

#[derive(FromRow)]
struct ReactionRecord {
    reaction_id: Uuid,
    thought_id: Uuid,
    reaction_body: String,
    username: String,
    created_at: DateTime<Utc>,
}
impl ReactionRecord {
    fn to_domain(self) -> Reaction {
        Reaction {
            reaction_id: self.reaction_id,
            reaction_body: self.reaction_body,
            username: self.username,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps constraint violations to `Validation` and everything else to `Unexpected`.
fn db_error(e: sqlx::Error) -> PortError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("users_username_key") => "username: already taken".to_string(),
                Some("users_email_key") => "email: already registered".to_string(),
                _ => db_err.message().to_string(),
            };
            return PortError::Validation(message);
        }
        if db_err.is_check_violation() {
            return PortError::Validation(db_err.message().to_string());
        }
    }
    PortError::Unexpected(e.to_string())
}

fn user_not_found(user_id: Uuid) -> PortError {
    PortError::NotFound(format!("User {} not found", user_id))
}

fn thought_not_found(thought_id: Uuid) -> PortError {
    PortError::NotFound(format!("Thought {} not found", thought_id))
}

//=========================================================================================
// Document Loading
//=========================================================================================

/// Groups list entries by owner, keeping each list in `position` order.
fn group_targets(refs: Vec<ReferenceRecord>) -> HashMap<Uuid, Vec<Uuid>> {
    let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for r in refs {
        grouped.entry(r.owner_id).or_default().push(r.target_id);
    }
    grouped
}

/// Loads the users with the given ids, in the order given. Unknown ids are skipped.
async fn load_users(conn: &mut PgConnection, ids: &[Uuid]) -> PortResult<Vec<User>> {
    let records = sqlx::query_as::<_, UserRecord>(
        "SELECT id, username, email FROM users WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    let thought_refs = sqlx::query_as::<_, ReferenceRecord>(
        "SELECT user_id AS owner_id, thought_id AS target_id FROM user_thoughts WHERE user_id = ANY($1) ORDER BY position ASC",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    let friend_refs = sqlx::query_as::<_, ReferenceRecord>(
        "SELECT user_id AS owner_id, friend_id AS target_id FROM user_friends WHERE user_id = ANY($1) ORDER BY position ASC",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    let mut thoughts_of = group_targets(thought_refs);
    let mut friends_of = group_targets(friend_refs);
    let mut records: HashMap<Uuid, UserRecord> =
        records.into_iter().map(|r| (r.id, r)).collect();

    let mut users = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = records.remove(id) {
            let thoughts = thoughts_of.remove(id).unwrap_or_default();
            let friends = friends_of.remove(id).unwrap_or_default();
            users.push(record.to_domain(thoughts, friends));
        }
    }
    Ok(users)
}

/// Loads the thoughts with the given ids, in the order given. Unknown ids are skipped.
async fn load_thoughts(conn: &mut PgConnection, ids: &[Uuid]) -> PortResult<Vec<Thought>> {
    let records = sqlx::query_as::<_, ThoughtRecord>(
        "SELECT id, thought_text, username, created_at FROM thoughts WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    let reactions = sqlx::query_as::<_, ReactionRecord>(
        "SELECT reaction_id, thought_id, reaction_body, username, created_at FROM reactions WHERE thought_id = ANY($1) ORDER BY position ASC",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    let mut reactions_of: HashMap<Uuid, Vec<Reaction>> = HashMap::new();
    for reaction in reactions {
        reactions_of
            .entry(reaction.thought_id)
            .or_default()
            .push(reaction.to_domain());
    }
    let mut records: HashMap<Uuid, ThoughtRecord> =
        records.into_iter().map(|r| (r.id, r)).collect();

    let mut thoughts = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = records.remove(id) {
            thoughts.push(record.to_domain(reactions_of.remove(id).unwrap_or_default()));
        }
    }
    Ok(thoughts)
}

async fn fetch_user(conn: &mut PgConnection, user_id: Uuid) -> PortResult<User> {
    load_users(conn, &[user_id])
        .await?
        .pop()
        .ok_or_else(|| user_not_found(user_id))
}

async fn fetch_thought(conn: &mut PgConnection, thought_id: Uuid) -> PortResult<Thought> {
    load_thoughts(conn, &[thought_id])
        .await?
        .pop()
        .ok_or_else(|| thought_not_found(thought_id))
}

/// Resolves a user's thought and friend references into documents.
async fn populate(conn: &mut PgConnection, user: User) -> PortResult<UserProfile> {
    let thoughts = load_thoughts(conn, &user.thoughts).await?;
    let friends = load_users(conn, &user.friends).await?;
    Ok(UserProfile {
        friend_count: user.friend_count(),
        id: user.id,
        username: user.username,
        email: user.email,
        thoughts,
        friends,
    })
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn list_users(&self) -> PortResult<Vec<UserProfile>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users ORDER BY seq ASC")
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error)?;

        let mut profiles = Vec::with_capacity(ids.len());
        for user in load_users(&mut conn, &ids).await? {
            profiles.push(populate(&mut conn, user).await?);
        }
        Ok(profiles)
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<UserProfile> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        let user = fetch_user(&mut conn, user_id).await?;
        populate(&mut conn, user).await
    }

    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let user = validation::validate_new_user(user)?;
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, email) VALUES ($1, $2, $3) RETURNING id, username, email",
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.to_domain(Vec::new(), Vec::new()))
    }

    async fn update_user(&self, user_id: Uuid, changes: UserChanges) -> PortResult<User> {
        let changes = validation::validate_user_changes(changes)?;
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let result = sqlx::query(
            "UPDATE users SET username = COALESCE($2, username), email = COALESCE($3, email) WHERE id = $1",
        )
        .bind(user_id)
        .bind(changes.username)
        .bind(changes.email)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(user_not_found(user_id));
        }
        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(user)
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let user = fetch_user(&mut tx, user_id).await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(user)
    }

    async fn add_friend(&self, user_id: Uuid, friend_id: Uuid) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query(
            "INSERT INTO user_friends (user_id, friend_id) SELECT id, $2 FROM users WHERE id = $1 ON CONFLICT (user_id, friend_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(friend_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(user)
    }

    async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query("DELETE FROM user_friends WHERE user_id = $1 AND friend_id = $2")
            .bind(user_id)
            .bind(friend_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(user)
    }

    async fn attach_thought(&self, user_id: Uuid, thought_id: Uuid) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query(
            "INSERT INTO user_thoughts (user_id, thought_id) SELECT id, $2 FROM users WHERE id = $1 ON CONFLICT (user_id, thought_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(thought_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(user)
    }

    async fn detach_thought(&self, user_id: Uuid, thought_id: Uuid) -> PortResult<User> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query("DELETE FROM user_thoughts WHERE user_id = $1 AND thought_id = $2")
            .bind(user_id)
            .bind(thought_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        let user = fetch_user(&mut tx, user_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(user)
    }

    async fn list_thoughts(&self) -> PortResult<Vec<Thought>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM thoughts ORDER BY seq ASC")
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error)?;
        load_thoughts(&mut conn, &ids).await
    }

    async fn get_thought(&self, thought_id: Uuid) -> PortResult<Thought> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        fetch_thought(&mut conn, thought_id).await
    }

    async fn create_thought(&self, thought: NewThought) -> PortResult<Thought> {
        let thought = validation::validate_new_thought(thought)?;
        let record = sqlx::query_as::<_, ThoughtRecord>(
            "INSERT INTO thoughts (id, thought_text, username) VALUES ($1, $2, $3) RETURNING id, thought_text, username, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&thought.thought_text)
        .bind(&thought.username)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(record.to_domain(Vec::new()))
    }

    async fn update_thought(
        &self,
        thought_id: Uuid,
        changes: ThoughtChanges,
    ) -> PortResult<Thought> {
        let changes = validation::validate_thought_changes(changes)?;
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let result = sqlx::query(
            "UPDATE thoughts SET thought_text = COALESCE($2, thought_text), username = COALESCE($3, username) WHERE id = $1",
        )
        .bind(thought_id)
        .bind(changes.thought_text)
        .bind(changes.username)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(thought_not_found(thought_id));
        }
        let thought = fetch_thought(&mut tx, thought_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(thought)
    }

    async fn delete_thought(&self, thought_id: Uuid) -> PortResult<Thought> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let thought = fetch_thought(&mut tx, thought_id).await?;
        sqlx::query("DELETE FROM thoughts WHERE id = $1")
            .bind(thought_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;
        Ok(thought)
    }

    async fn add_reaction(&self, thought_id: Uuid, reaction: NewReaction) -> PortResult<Thought> {
        let reaction = validation::validate_new_reaction(reaction)?;
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query(
            "INSERT INTO reactions (reaction_id, thought_id, reaction_body, username) SELECT $1, id, $3, $4 FROM thoughts WHERE id = $2 ON CONFLICT (thought_id, reaction_body, username) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(thought_id)
        .bind(&reaction.reaction_body)
        .bind(&reaction.username)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
        let thought = fetch_thought(&mut tx, thought_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(thought)
    }

    async fn remove_reaction(&self, thought_id: Uuid, reaction_id: Uuid) -> PortResult<Thought> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        sqlx::query("DELETE FROM reactions WHERE thought_id = $1 AND reaction_id = $2")
            .bind(thought_id)
            .bind(reaction_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        let thought = fetch_thought(&mut tx, thought_id).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(thought)
    }
}
