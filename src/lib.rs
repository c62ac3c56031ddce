//! # Gamestore - hand-rolled persistence for a small game store
//!
//! Gamestore maps games, categories and their junction tables onto SQLite
//! without an ORM:
//! - Data mappers per table translating rows to entities and back
//! - A mapper registry resolving entity variants and logical names
//! - A unit of work batching new/modified/removed entities until commit
//! - An engine facade that loads everything and enforces unique names
//! - A JSON web layer and CLI on top

pub mod domain;
pub mod storage;
pub mod mapper;
pub mod unit_of_work;
pub mod engine;
pub mod patterns;
pub mod server;
pub mod ui;
pub mod config;

// Re-exports for convenient access
pub use domain::{Category, CategoryDependenceLink, DomainObject, Entity, Game, GameCategoryLink, Shared};
pub use engine::Engine;
pub use mapper::{AnyMapper, Mapper, MapperRegistry};
pub use storage::Store;
pub use unit_of_work::{CommitSummary, UnitOfWork, WorkContext};

/// Result type alias for Gamestore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Gamestore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Category with id = {0} does not exist")]
    CategoryNotFound(i64),

    #[error("A {kind} named '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("DB commit error: {0}")]
    Commit(#[source] rusqlite::Error),

    #[error("DB update error: {0}")]
    Update(#[source] rusqlite::Error),

    #[error("DB delete error: {0}")]
    Delete(#[source] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Commit stopped after {applied} statement(s), {dropped} pending change(s) dropped: {source}")]
    PartialCommit {
        applied: usize,
        dropped: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Unknown mapper: {0}")]
    UnknownMapper(String),

    #[error("Mapper for {mapper} cannot persist {entity}")]
    MapperMismatch { mapper: &'static str, entity: String },

    #[error("Unit of work used before it was initialized")]
    UnitOfWorkNotInitialized,

    #[error("Unknown user kind: {0}")]
    UnknownUserKind(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Lookup by id or name yielded nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::RecordNotFound(_) | Error::CategoryNotFound(_))
    }

    /// A store statement failed, possibly partway through a commit
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Commit(_)
                | Error::Update(_)
                | Error::Delete(_)
                | Error::Storage(_)
                | Error::PartialCommit { .. }
        )
    }

    /// Usage error: unknown mapper name or missing unit of work
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownMapper(_) | Error::MapperMismatch { .. } | Error::UnitOfWorkNotInitialized
        )
    }
}
