//! Infrastructure adapters: persistence backends and lifecycle collaborators.

pub mod migration;
pub mod seed;

#[cfg(feature = "postgres")]
pub mod postgres_store;

pub use migration::LoggingMigrationRunner;
pub use seed::InMemorySeedRunner;

#[cfg(feature = "postgres")]
pub use postgres_store::PostgresModuleStateStore;
