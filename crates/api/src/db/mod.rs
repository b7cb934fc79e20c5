//! Database operations for the Banyan `PostgreSQL` store.
//!
//! # Tables
//!
//! - `users` - Accounts, credentials, wishlists, reset-token fields
//! - `products` - Catalog entries with JSONB image and rating lists
//! - `categories` - User-managed category tree (slug-addressed)
//! - `orders` - Order aggregates with JSONB item snapshots
//!
//! Nested document fields (images, ratings, wishlist, order items,
//! addresses) are stored as JSONB and always read and written whole, so
//! every mutation is a fetch-modify-save round trip. Concurrent writers
//! to the same row race last-writer-wins; that is the accepted model
//! here, not an oversight (callers wanting stronger guarantees would add
//! a transaction or compare-and-swap at the call site).
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/` and are embedded via
//! `sqlx::migrate!`; the server applies them at startup.

pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
