//! Caja DB - Database abstractions
//!
//! SQLx-based database layer for Caja services.
//!
//! # Example
//!
//! ```rust,ignore
//! use caja_db::{create_pool, run_migrations, Repositories, SequenceRepository};
//!
//! let pool = create_pool("postgres://localhost/caja").await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let row = repos.sequences.increment(tenant_id, "SALE", "VTA-").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;
