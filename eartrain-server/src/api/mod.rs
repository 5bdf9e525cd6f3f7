//! HTTP API handlers for eartrain-server

pub mod auth;
pub mod buildinfo;
pub mod chord_progressions;
pub mod extract;
pub mod health;
pub mod leaderboard;
pub mod oauth;
pub mod password_reset;
pub mod progress;
pub mod users;

pub use auth::auth_routes;
pub use buildinfo::buildinfo_routes;
pub use chord_progressions::chord_progression_routes;
pub use extract::{ApiJson, ApiQuery, AuthUser};
pub use health::health_routes;
pub use leaderboard::leaderboard_routes;
pub use oauth::oauth_routes;
pub use password_reset::password_reset_routes;
pub use progress::progress_routes;
pub use users::user_routes;
