//! Mapper registry - resolves entities and logical names to mappers

use crate::domain::Entity;
use crate::storage::Store;
use crate::{Error, Result};
use super::{AnyMapper, CategoryDependenceMapper, CategoryMapper, GameCategoryMapper, GameMapper};

/// Logical mapper names accepted by [`MapperRegistry::get_current_mapper`]
pub const MAPPER_NAMES: &[&str] = &["game", "category", "games_categories", "categories_dependence"];

/// Builds mappers bound to one shared store connection.
///
/// Mappers are cheap to construct and are built on every request; the
/// registry neither caches nor pools them.
#[derive(Debug, Clone)]
pub struct MapperRegistry {
    store: Store,
}

impl MapperRegistry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn games(&self) -> GameMapper {
        GameMapper::new(self.store.clone())
    }

    pub fn categories(&self) -> CategoryMapper {
        CategoryMapper::new(self.store.clone())
    }

    pub fn game_categories(&self) -> GameCategoryMapper {
        GameCategoryMapper::new(self.clone())
    }

    pub fn category_dependences(&self) -> CategoryDependenceMapper {
        CategoryDependenceMapper::new(self.clone())
    }

    /// Mapper for the entity's runtime variant
    pub fn get_mapper(&self, entity: &Entity) -> AnyMapper {
        match entity {
            Entity::Game(_) => AnyMapper::Game(self.games()),
            Entity::Category(_) => AnyMapper::Category(self.categories()),
            Entity::GameCategory(_) => AnyMapper::GameCategory(self.game_categories()),
            Entity::CategoryDependence(_) => AnyMapper::CategoryDependence(self.category_dependences()),
        }
    }

    /// Mapper by logical name: `game`, `category`, `games_categories` or
    /// `categories_dependence`
    pub fn get_current_mapper(&self, name: &str) -> Result<AnyMapper> {
        match name {
            "game" => Ok(AnyMapper::Game(self.games())),
            "category" => Ok(AnyMapper::Category(self.categories())),
            "games_categories" => Ok(AnyMapper::GameCategory(self.game_categories())),
            "categories_dependence" => Ok(AnyMapper::CategoryDependence(self.category_dependences())),
            _ => Err(Error::UnknownMapper(name.to_string())),
        }
    }
}
