//! # Murmur Infrastructure
//!
//! Concrete implementations of the ports defined in `murmur-core`:
//! PostgreSQL repositories via SeaORM, an in-memory backend used for
//! tests and database-less runs, JWT + Argon2 authentication, and the
//! TTL page cache.

pub mod auth;
pub mod cache;
pub mod database;
pub mod memory;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use cache::InMemoryCache;
pub use database::{DatabaseConfig, connect};
pub use memory::MemoryStore;
