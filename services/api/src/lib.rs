//! services/api/src/lib.rs
//!
//! The social network REST service: configuration, datastore adapters and the
//! axum web layer. The binaries in `src/bin` wire these together.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
