//! Database initialization, schema and shared settings

pub mod init;
pub mod migrations;
pub mod seed;
pub mod settings;

pub use init::*;
pub use migrations::run_migrations;
pub use seed::{seed_chord_progressions, DEFAULT_PROGRESSIONS};
pub use settings::{get_setting, load_jwt_secret, set_setting};
