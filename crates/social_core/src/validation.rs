//! crates/social_core/src/validation.rs
//!
//! Schema-level checks applied by every `DatabaseService` implementation before
//! a write. Each function returns the payload in its stored form (trimmed
//! where the field is trimmed) or a `PortError::Validation`.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{NewReaction, NewThought, NewUser, ThoughtChanges, UserChanges};
use crate::ports::{PortError, PortResult};

/// Upper bound, in characters, for thought text and reaction bodies.
pub const MAX_TEXT_LEN: usize = 280;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub fn validate_new_user(user: NewUser) -> PortResult<NewUser> {
    Ok(NewUser {
        username: username(&user.username)?,
        email: email(&user.email)?,
    })
}

pub fn validate_user_changes(changes: UserChanges) -> PortResult<UserChanges> {
    Ok(UserChanges {
        username: changes.username.as_deref().map(username).transpose()?,
        email: changes.email.as_deref().map(email).transpose()?,
    })
}

pub fn validate_new_thought(thought: NewThought) -> PortResult<NewThought> {
    Ok(NewThought {
        thought_text: text("thoughtText", thought.thought_text)?,
        username: required("username", &thought.username)?,
    })
}

pub fn validate_thought_changes(changes: ThoughtChanges) -> PortResult<ThoughtChanges> {
    Ok(ThoughtChanges {
        thought_text: changes
            .thought_text
            .map(|t| text("thoughtText", t))
            .transpose()?,
        username: changes
            .username
            .as_deref()
            .map(|u| required("username", u))
            .transpose()?,
    })
}

pub fn validate_new_reaction(reaction: NewReaction) -> PortResult<NewReaction> {
    Ok(NewReaction {
        reaction_body: text("reactionBody", reaction.reaction_body)?,
        username: required("username", &reaction.username)?,
    })
}

fn username(value: &str) -> PortResult<String> {
    required("username", value)
}

fn email(value: &str) -> PortResult<String> {
    let trimmed = value.trim();
    if !EMAIL_PATTERN.is_match(trimmed) {
        return Err(PortError::Validation(format!(
            "email: '{}' is not a valid email address",
            value
        )));
    }
    Ok(trimmed.to_string())
}

fn required(field: &str, value: &str) -> PortResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortError::Validation(format!("{}: path is required", field)));
    }
    Ok(trimmed.to_string())
}

fn text(field: &str, value: String) -> PortResult<String> {
    let len = value.chars().count();
    if len == 0 {
        return Err(PortError::Validation(format!("{}: path is required", field)));
    }
    if len > MAX_TEXT_LEN {
        return Err(PortError::Validation(format!(
            "{}: must be at most {} characters, got {}",
            field, MAX_TEXT_LEN, len
        )));
    }
    Ok(value)
}
