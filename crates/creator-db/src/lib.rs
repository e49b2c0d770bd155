//! # creator-db
//!
//! Persistence layer for creator messaging.
//!
//! - PostgreSQL repositories (SQLx) with runtime-applied migrations
//! - In-memory repositories mirroring the same rules, for tests and
//!   single-process setups
//! - Blob storage backends (local filesystem, in-memory)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use creator_db::pool::{create_pool, run_migrations, PoolConfig};
//! use creator_db::repositories::PgMessageRepository;
//!
//! async fn example(url: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::new(url)).await?;
//!     run_migrations(&pool).await?;
//!     let messages = PgMessageRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod storage;

pub use memory::{MemoryBlobStorage, MemoryStore, StoreOp};
pub use pool::{create_pool, run_migrations, PgPool, PoolConfig};
pub use repositories::{
    PgConversationRepository, PgMessageRepository, PgPinRepository, PgReactionRepository,
    PgUserRepository,
};
pub use storage::LocalBlobStorage;
