//! Mapper for the games_categories junction table

use rusqlite::params;
use crate::domain::{Category, Game, GameCategoryLink, Shared};
use crate::{Error, Result};
use super::{Mapper, MapperRegistry, adopt_row_id, not_found};

const COLUMNS: &str = "id, game_id, category_id";

#[derive(Debug, Clone)]
pub struct GameCategoryMapper {
    registry: MapperRegistry,
}

impl GameCategoryMapper {
    pub fn new(registry: MapperRegistry) -> Self {
        Self { registry }
    }

    /// Games linked to a category, one lookup per link row, in link order
    pub fn find_by_category_id(&self, category_id: i64) -> Result<Vec<Shared<Game>>> {
        let game_ids = self.registry.store().query_all(
            "SELECT game_id FROM games_categories WHERE category_id = ?1 ORDER BY id",
            [category_id],
            |row| row.get::<_, i64>(0),
        )?;

        let games = self.registry.games();
        game_ids.into_iter().map(|id| games.find_by_id(id)).collect()
    }

    /// Categories a game belongs to, one lookup per link row, in link order
    pub fn find_by_game_id(&self, game_id: i64) -> Result<Vec<Shared<Category>>> {
        let category_ids = self.registry.store().query_all(
            "SELECT category_id FROM games_categories WHERE game_id = ?1 ORDER BY id",
            [game_id],
            |row| row.get::<_, i64>(0),
        )?;

        let categories = self.registry.categories();
        category_ids.into_iter().map(|id| categories.find_by_id(id)).collect()
    }
}

impl Mapper for GameCategoryMapper {
    type Entity = GameCategoryLink;
    const TABLE: &'static str = "games_categories";

    fn all(&self) -> Result<Vec<Shared<GameCategoryLink>>> {
        let sql = format!("SELECT {} FROM {} ORDER BY id", COLUMNS, Self::TABLE);
        let links = self.registry.store().query_all(&sql, [], row_to_link)?;
        Ok(links.into_iter().map(Shared::new).collect())
    }

    fn find_by_id(&self, id: i64) -> Result<Shared<GameCategoryLink>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", COLUMNS, Self::TABLE);
        self.registry
            .store()
            .query_one(&sql, [id], row_to_link)?
            .map(Shared::new)
            .ok_or_else(|| not_found(Self::TABLE, id))
    }

    fn insert(&self, entity: &Shared<GameCategoryLink>) -> Result<()> {
        let mut link = entity.write();
        link.sync_ends();
        let row_id = self
            .registry
            .store()
            .insert(
                "INSERT INTO games_categories (game_id, category_id) VALUES (?1, ?2)",
                params![link.game_id, link.category_id],
            )
            .map_err(Error::Commit)?;
        adopt_row_id(Self::TABLE, &mut link.id, row_id);
        Ok(())
    }

    fn update(&self, entity: &Shared<GameCategoryLink>) -> Result<()> {
        let mut link = entity.write();
        link.sync_ends();
        self.registry
            .store()
            .execute(
                "UPDATE games_categories SET game_id = ?1, category_id = ?2 WHERE id = ?3",
                params![link.game_id, link.category_id, link.id],
            )
            .map_err(Error::Update)?;
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.registry
            .store()
            .execute("DELETE FROM games_categories WHERE id = ?1", [id])
            .map_err(Error::Delete)?;
        Ok(())
    }
}

fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<GameCategoryLink> {
    Ok(GameCategoryLink::new(row.get(0)?, row.get(1)?, row.get(2)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Store;

    fn seeded() -> MapperRegistry {
        let registry = MapperRegistry::new(Store::open_in_memory().unwrap());
        for (id, name) in [(1, "Doom"), (2, "Quake"), (3, "Myst")] {
            registry.games().insert(&Shared::new(Game::new(id, name, "", 1.0, ""))).unwrap();
        }
        for (id, name) in [(1, "Shooter"), (2, "Puzzle")] {
            registry.categories().insert(&Shared::new(Category::new(id, name))).unwrap();
        }
        let links = registry.game_categories();
        for (id, game, category) in [(1, 2, 1), (2, 1, 1), (3, 3, 2), (4, 1, 2)] {
            links.insert(&Shared::new(GameCategoryLink::new(id, game, category))).unwrap();
        }
        registry
    }

    #[test]
    fn test_find_by_category_id_hydrates_games_in_link_order() {
        let registry = seeded();
        let games = registry.game_categories().find_by_category_id(1).unwrap();

        let names: Vec<String> = games.iter().map(|g| g.read().name.clone()).collect();
        assert_eq!(names, vec!["Quake", "Doom"]);
    }

    #[test]
    fn test_find_by_game_id_hydrates_categories() {
        let registry = seeded();
        let categories = registry.game_categories().find_by_game_id(1).unwrap();

        let names: Vec<String> = categories.iter().map(|c| c.read().name.clone()).collect();
        assert_eq!(names, vec!["Shooter", "Puzzle"]);
        assert!(registry.game_categories().find_by_game_id(99).unwrap().is_empty());
    }

    #[test]
    fn test_delete_does_not_cascade() {
        let registry = seeded();
        registry.games().delete(1).unwrap();

        assert_eq!(registry.game_categories().all().unwrap().len(), 4);
        // The dangling link now fails the lookup
        let err = registry.game_categories().find_by_category_id(1).unwrap_err();
        assert!(err.is_not_found());
    }
}
