//! SQL persistence through SeaORM.
//!
//! Backends are selected with the `sqlite` and `pg` cargo features. Whatever the backend, the schema is created by
//! [`migrations::Migrator`] when [`SqlStore`] is opened.
pub mod driver;
pub mod entity;
pub mod migrations;
pub mod store;

pub use driver::DatabaseDriver;
pub use store::SqlStore;
