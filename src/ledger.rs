//! Pure bookkeeping over in-memory records.
//!
//! Nothing here touches storage. The functions mutate the records they are given and report what moved; the
//! orchestrator in [`crate::inventory`] turns the mutated records into a [`ChangeSet`](crate::changes::ChangeSet).
pub mod assignment;
pub mod maintenance;
pub mod serial;

pub use serial::SerialHolder;
pub use serial::Taken;
