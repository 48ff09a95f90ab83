use thiserror::Error;

use crate::types::EntityKind;

pub type Result<T, E = InventoryError> = std::result::Result<T, E>;

/// Breaches of the stock/serial/assignment consistency rules.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("requested {requested} unit(s) from {holder} but only {available} available")]
    Overdraw {
        holder:    String,
        requested: u32,
        available: u32,
    },
    #[error("{holder} does not hold serial(s): {}", .serials.join(", "))]
    MissingSerials { holder: String, serials: Vec<String> },
    #[error("serial(s) already tracked elsewhere: {}", .serials.join(", "))]
    SerialsInUse { serials: Vec<String> },
    #[error("duplicate serial number(s): {}", .serials.join(", "))]
    DuplicateSerials { serials: Vec<String> },
    #[error("item '{item_id}' has stock {stock} but {serials} serial number(s)")]
    StockMismatch { item_id: String, stock: u32, serials: usize },
    #[error("{kind} '{id}' still has {count} outstanding assignment(s)")]
    OutstandingAssignments { kind: EntityKind, id: String, count: usize },
    #[error("attempt to modify previously deleted {kind} '{id}'")]
    ModifiedAfterDelete { kind: EntityKind, id: String },
}

/// The storage collaborator failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot replace data file: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("background I/O task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("{kind} '{id}' already exists in {store}")]
    DuplicateKey {
        store: &'static str,
        kind:  EntityKind,
        id:    String,
    },
    #[error("{kind} '{id}' is missing from {store}")]
    MissingRow {
        store: &'static str,
        kind:  EntityKind,
        id:    String,
    },
    #[error("malformed {what} in stored record '{id}': {value}")]
    Malformed {
        what:  &'static str,
        id:    String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistenceError),
}

impl InventoryError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn invariant(&self) -> Option<&InvariantViolation> {
        match self {
            Self::Invariant(v) => Some(v),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for InventoryError {
    fn from(value: sea_orm::DbErr) -> Self {
        PersistenceError::from(value).into()
    }
}

impl From<std::io::Error> for InventoryError {
    fn from(value: std::io::Error) -> Self {
        PersistenceError::from(value).into()
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(value: serde_json::Error) -> Self {
        PersistenceError::from(value).into()
    }
}

impl From<tempfile::PersistError> for InventoryError {
    fn from(value: tempfile::PersistError) -> Self {
        PersistenceError::from(value).into()
    }
}

impl From<tokio::task::JoinError> for InventoryError {
    fn from(value: tokio::task::JoinError) -> Self {
        PersistenceError::from(value).into()
    }
}
