//! Domain model - entities tracked by the unit of work
//!
//! Four entity variants map onto four tables:
//! - `Game`: games(id, name, description, price, release_date)
//! - `Category`: categories(id, name)
//! - `GameCategoryLink`: games_categories(id, game_id, category_id)
//! - `CategoryDependenceLink`: categories_dependence(id, main_category_id, sub_category_id)
//!
//! Entities travel as [`Shared`] handles so that a pending change holds a
//! reference to the entity, not a copy of it.

pub mod category;
pub mod game;
pub mod links;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::unit_of_work::UnitOfWork;

pub use category::Category;
pub use game::Game;
pub use links::{CategoryDependenceLink, GameCategoryLink};

/// Reference-counted, lockable handle to an entity.
///
/// Cloning the handle clones the reference. Every clone observes writes made
/// through any other clone.
#[derive(Debug, Default)]
pub struct Shared<T>(Arc<RwLock<T>>);

impl<T> Shared<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Lock for reading. A poisoned lock still yields the last written value.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when both handles point at the same entity
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> From<T> for Shared<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Serialize> Serialize for Shared<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.read().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Shared<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        T::deserialize(deserializer).map(Shared::new)
    }
}

/// Any entity the unit of work can track, dispatched on by the mapper registry
#[derive(Debug, Clone)]
pub enum Entity {
    Game(Shared<Game>),
    Category(Shared<Category>),
    GameCategory(Shared<GameCategoryLink>),
    CategoryDependence(Shared<CategoryDependenceLink>),
}

impl Entity {
    /// Table the entity lives in
    pub fn table(&self) -> &'static str {
        match self {
            Entity::Game(_) => "games",
            Entity::Category(_) => "categories",
            Entity::GameCategory(_) => "games_categories",
            Entity::CategoryDependence(_) => "categories_dependence",
        }
    }

    /// Current id of the underlying entity
    pub fn id(&self) -> i64 {
        match self {
            Entity::Game(game) => game.read().id,
            Entity::Category(category) => category.read().id,
            Entity::GameCategory(link) => link.read().id,
            Entity::CategoryDependence(link) => link.read().id,
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.table(), self.id())
    }
}

impl From<Shared<Game>> for Entity {
    fn from(game: Shared<Game>) -> Self {
        Entity::Game(game)
    }
}

impl From<Shared<Category>> for Entity {
    fn from(category: Shared<Category>) -> Self {
        Entity::Category(category)
    }
}

impl From<Shared<GameCategoryLink>> for Entity {
    fn from(link: Shared<GameCategoryLink>) -> Self {
        Entity::GameCategory(link)
    }
}

impl From<Shared<CategoryDependenceLink>> for Entity {
    fn from(link: Shared<CategoryDependenceLink>) -> Self {
        Entity::CategoryDependence(link)
    }
}

/// Capability to register an entity's pending change with a unit of work.
///
/// Marking only records the change; nothing reaches the store until
/// [`UnitOfWork::commit`].
pub trait DomainObject {
    fn as_entity(&self) -> Entity;

    fn mark_new(&self, uow: &mut UnitOfWork) {
        uow.register_new(self.as_entity());
    }

    fn mark_modify(&self, uow: &mut UnitOfWork) {
        uow.register_modify(self.as_entity());
    }

    fn mark_removed(&self, uow: &mut UnitOfWork) {
        uow.register_removed(self.as_entity());
    }
}

impl<T> DomainObject for Shared<T>
where
    Shared<T>: Into<Entity>,
{
    fn as_entity(&self) -> Entity {
        self.clone().into()
    }
}

/// In-process monotonic id counter for one entity type
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicI64,
}

impl IdSequence {
    /// Ids start at 1, matching SQLite's AUTOINCREMENT
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: i64) -> Self {
        Self { next: AtomicI64::new(first) }
    }

    /// Hand out the next id
    pub fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Id the next call to `next_id` will return
    pub fn peek(&self) -> i64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Make sure ids handed out from now on are greater than `id`
    pub fn advance_past(&self, id: i64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_handles_see_each_others_writes() {
        let game = Shared::new(Game::new(1, "Doom", "", 9.99, "1993-12-10"));
        let alias = game.clone();

        alias.write().price = 4.99;

        assert!(game.ptr_eq(&alias));
        assert_eq!(game.read().price, 4.99);
    }

    #[test]
    fn test_entity_reports_table_and_id() {
        let link: Entity = Shared::new(GameCategoryLink::new(7, 1, 2)).into();
        assert_eq!(link.table(), "games_categories");
        assert_eq!(link.id(), 7);
        assert_eq!(link.to_string(), "games_categories#7");
    }

    #[test]
    fn test_id_sequence_is_monotonic() {
        let seq = IdSequence::new();
        assert_eq!(seq.next_id(), 1);
        assert_eq!(seq.next_id(), 2);

        seq.advance_past(10);
        assert_eq!(seq.next_id(), 11);

        // Never moves backwards
        seq.advance_past(3);
        assert_eq!(seq.peek(), 12);
    }

    #[test]
    fn test_shared_serializes_inner_value() {
        let link = Shared::new(CategoryDependenceLink::new(1, 2, 3));
        let json = serde_json::to_string(&link).unwrap();
        assert_eq!(json, r#"{"id":1,"main_category_id":2,"sub_category_id":3}"#);

        let back: Shared<CategoryDependenceLink> = serde_json::from_str(&json).unwrap();
        assert_eq!(*back.read(), *link.read());
    }
}
