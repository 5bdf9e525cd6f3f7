//! # EarTrain Common Library
//!
//! Shared code for the EarTrain service crates:
//! - Database initialization, schema and row models
//! - Domain models (users, progress, chord progressions)
//! - Gamification formulas (levels, streaks, badges, session XP)
//! - Auth primitives (signed tokens, password hashing, reset tokens)
//! - Music theory helpers for voicing chord progressions
//! - Configuration loading
//! - Input validation and time utilities

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gamification;
pub mod models;
pub mod theory;
pub mod time;
pub mod uuid_utils;
pub mod validation;

pub use error::{Error, Result};
