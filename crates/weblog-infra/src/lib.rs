//! # Weblog Infrastructure
//!
//! Concrete implementations of the ports defined in `weblog-core`:
//! sea-orm repositories over PostgreSQL and the JWT/Argon2
//! authentication services.

pub mod auth;
pub mod database;

pub use auth::{Argon2PasswordService, JwtTokenService};
pub use database::{DatabaseConfig, connect};
