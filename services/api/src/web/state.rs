//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use social_core::ports::DatabaseService;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>) -> Self {
        Self { db, config }
    }
}
