//! Data mappers - one per table
//!
//! A mapper translates between rows of its table and [`Shared`] entities:
//! - `all` / `find_by_id` hydrate rows, keeping the persisted id
//! - `insert` / `update` / `delete` issue one parameterized statement each
//!
//! The junction mappers also answer relationship queries by resolving the
//! opposite side through the [`MapperRegistry`], one lookup per link row.

pub mod category;
pub mod category_dependence;
pub mod game;
pub mod game_category;
pub mod registry;

use crate::domain::{Entity, Shared};
use crate::{Error, Result};

pub use category::CategoryMapper;
pub use category_dependence::CategoryDependenceMapper;
pub use game::GameMapper;
pub use game_category::GameCategoryMapper;
pub use registry::MapperRegistry;

/// Row/entity translation for one table
pub trait Mapper {
    type Entity;

    /// Table this mapper reads and writes
    const TABLE: &'static str;

    /// Every row, hydrated, in storage order
    fn all(&self) -> Result<Vec<Shared<Self::Entity>>>;

    /// Exactly one entity, or [`Error::RecordNotFound`]
    fn find_by_id(&self, id: i64) -> Result<Shared<Self::Entity>>;

    /// Insert every column but the id, then store the assigned id back into
    /// the entity. Fails with [`Error::Commit`].
    fn insert(&self, entity: &Shared<Self::Entity>) -> Result<()>;

    /// Update keyed by id. Fails with [`Error::Update`].
    fn update(&self, entity: &Shared<Self::Entity>) -> Result<()>;

    /// Delete keyed by id. Fails with [`Error::Delete`].
    fn delete(&self, id: i64) -> Result<()>;
}

pub(crate) fn not_found(table: &str, id: i64) -> Error {
    Error::RecordNotFound(format!("no row with id = {} in {}", id, table))
}

/// Replace a client-side id with the one the store assigned
pub(crate) fn adopt_row_id(table: &str, id: &mut i64, row_id: i64) {
    if *id != row_id {
        tracing::warn!(table, local_id = *id, row_id, "Store assigned a different id, adopting it");
        *id = row_id;
    }
}

/// A mapper picked at runtime, by entity variant or by logical name
#[derive(Debug, Clone)]
pub enum AnyMapper {
    Game(GameMapper),
    Category(CategoryMapper),
    GameCategory(GameCategoryMapper),
    CategoryDependence(CategoryDependenceMapper),
}

impl AnyMapper {
    pub fn table(&self) -> &'static str {
        match self {
            AnyMapper::Game(_) => GameMapper::TABLE,
            AnyMapper::Category(_) => CategoryMapper::TABLE,
            AnyMapper::GameCategory(_) => GameCategoryMapper::TABLE,
            AnyMapper::CategoryDependence(_) => CategoryDependenceMapper::TABLE,
        }
    }

    /// Every row of the table as tracked entities
    pub fn all(&self) -> Result<Vec<Entity>> {
        Ok(match self {
            AnyMapper::Game(m) => m.all()?.into_iter().map(Entity::from).collect(),
            AnyMapper::Category(m) => m.all()?.into_iter().map(Entity::from).collect(),
            AnyMapper::GameCategory(m) => m.all()?.into_iter().map(Entity::from).collect(),
            AnyMapper::CategoryDependence(m) => m.all()?.into_iter().map(Entity::from).collect(),
        })
    }

    pub fn find_by_id(&self, id: i64) -> Result<Entity> {
        Ok(match self {
            AnyMapper::Game(m) => m.find_by_id(id)?.into(),
            AnyMapper::Category(m) => m.find_by_id(id)?.into(),
            AnyMapper::GameCategory(m) => m.find_by_id(id)?.into(),
            AnyMapper::CategoryDependence(m) => m.find_by_id(id)?.into(),
        })
    }

    pub fn insert(&self, entity: &Entity) -> Result<()> {
        match (self, entity) {
            (AnyMapper::Game(m), Entity::Game(e)) => m.insert(e),
            (AnyMapper::Category(m), Entity::Category(e)) => m.insert(e),
            (AnyMapper::GameCategory(m), Entity::GameCategory(e)) => m.insert(e),
            (AnyMapper::CategoryDependence(m), Entity::CategoryDependence(e)) => m.insert(e),
            _ => Err(self.mismatch(entity)),
        }
    }

    pub fn update(&self, entity: &Entity) -> Result<()> {
        match (self, entity) {
            (AnyMapper::Game(m), Entity::Game(e)) => m.update(e),
            (AnyMapper::Category(m), Entity::Category(e)) => m.update(e),
            (AnyMapper::GameCategory(m), Entity::GameCategory(e)) => m.update(e),
            (AnyMapper::CategoryDependence(m), Entity::CategoryDependence(e)) => m.update(e),
            _ => Err(self.mismatch(entity)),
        }
    }

    pub fn delete(&self, entity: &Entity) -> Result<()> {
        if self.table() != entity.table() {
            return Err(self.mismatch(entity));
        }
        let id = entity.id();
        match self {
            AnyMapper::Game(m) => m.delete(id),
            AnyMapper::Category(m) => m.delete(id),
            AnyMapper::GameCategory(m) => m.delete(id),
            AnyMapper::CategoryDependence(m) => m.delete(id),
        }
    }

    fn mismatch(&self, entity: &Entity) -> Error {
        Error::MapperMismatch {
            mapper: self.table(),
            entity: entity.to_string(),
        }
    }
}
