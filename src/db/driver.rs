#[cfg(feature = "pg")]
pub mod pg;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::fmt::Debug;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::error::Result;

#[cfg(feature = "pg")]
pub use pg::Pg;
#[cfg(feature = "sqlite")]
pub use sqlite::Sqlite;

#[async_trait]
pub trait DatabaseDriver: Debug + Sync + Send + 'static {
    fn name(&self) -> &'static str;
    fn connection(&self) -> DatabaseConnection;
    /// Backend-specific session tuning. Called once before migrations.
    async fn configure(&self) -> Result<()>;
    /// Flush whatever the backend keeps aside, e.g. the SQLite WAL.
    async fn checkpoint(&self) -> Result<()>;
}
