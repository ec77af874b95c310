//! SQLite adapters behind the domain ports.

pub mod clothing_repo;
pub mod connection;
pub mod member_repo;
pub mod migrations;
pub mod record_repo;
pub mod task_repo;

pub use clothing_repo::SqliteClothingRepository;
pub use connection::{create_memory_pool, create_pool, ConnectionError};
pub use member_repo::SqliteMemberRepository;
pub use migrations::{MigrationError, Migrator};
pub use record_repo::SqliteMatchRecordRepository;
pub use task_repo::SqliteTaskRepository;
