//! Per-table query modules
//!
//! Functions return `eartrain_common::Result` so handlers can propagate with
//! `?`. Schema creation lives in `eartrain_common::db`.

pub mod chord_progressions;
pub mod leaderboard;
pub mod password_resets;
pub mod progress;
pub mod users;
