//! Authentication primitives
//!
//! Pure functions only; no HTTP framework dependencies. The server wires
//! these into extractors and handlers.
//!
//! - [`token`]: signed session tokens (HS256 JWT, 7-day expiry)
//! - [`password`]: argon2id password hashing
//! - [`reset`]: single-use password reset tokens

pub mod password;
pub mod reset;
pub mod token;

pub use password::{hash_password, verify_password, verify_password_or_dummy};
pub use reset::{generate_reset_token, hash_reset_token, ResetToken};
pub use token::{Claims, TokenError, TokenService, TOKEN_TTL_DAYS};
