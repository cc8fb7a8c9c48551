//! Keyward DB - Database abstractions
//!
//! SQLx-based database layer for Keyward, plus DashMap-backed in-memory
//! repositories for tests and database-less development.
//!
//! # Example
//!
//! ```rust,ignore
//! use keyward_db::{create_pool, run_migrations, Repositories};
//!
//! let pool = create_pool("postgres://localhost/keyward").await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let principal = repos.principals.find_by_email("user@example.com").await?;
//! ```

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use memory::{MemoryHandoffRepository, MemoryPrincipalRepository, MemorySessionRepository};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;
