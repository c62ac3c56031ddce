//! Mapper for the games table

use rusqlite::params;
use crate::domain::{Game, Shared};
use crate::storage::Store;
use crate::{Error, Result};
use super::{Mapper, adopt_row_id, not_found};

const COLUMNS: &str = "id, name, description, price, release_date";

#[derive(Debug, Clone)]
pub struct GameMapper {
    store: Store,
}

impl GameMapper {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Look a game up by its unique name
    pub fn find_by_name(&self, name: &str) -> Result<Option<Shared<Game>>> {
        let sql = format!("SELECT {} FROM {} WHERE name = ?1", COLUMNS, Self::TABLE);
        let game = self.store.query_one(&sql, [name], row_to_game)?;
        Ok(game.map(Shared::new))
    }
}

impl Mapper for GameMapper {
    type Entity = Game;
    const TABLE: &'static str = "games";

    fn all(&self) -> Result<Vec<Shared<Game>>> {
        let sql = format!("SELECT {} FROM {} ORDER BY id", COLUMNS, Self::TABLE);
        let games = self.store.query_all(&sql, [], row_to_game)?;
        Ok(games.into_iter().map(Shared::new).collect())
    }

    fn find_by_id(&self, id: i64) -> Result<Shared<Game>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", COLUMNS, Self::TABLE);
        self.store
            .query_one(&sql, [id], row_to_game)?
            .map(Shared::new)
            .ok_or_else(|| not_found(Self::TABLE, id))
    }

    fn insert(&self, entity: &Shared<Game>) -> Result<()> {
        let mut game = entity.write();
        let row_id = self
            .store
            .insert(
                "INSERT INTO games (name, description, price, release_date) VALUES (?1, ?2, ?3, ?4)",
                params![game.name, game.description, game.price, game.release_date],
            )
            .map_err(Error::Commit)?;
        adopt_row_id(Self::TABLE, &mut game.id, row_id);
        Ok(())
    }

    fn update(&self, entity: &Shared<Game>) -> Result<()> {
        let game = entity.read();
        self.store
            .execute(
                "UPDATE games SET name = ?1, description = ?2, price = ?3, release_date = ?4 WHERE id = ?5",
                params![game.name, game.description, game.price, game.release_date, game.id],
            )
            .map_err(Error::Update)?;
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.store
            .execute("DELETE FROM games WHERE id = ?1", [id])
            .map_err(Error::Delete)?;
        Ok(())
    }
}

/// Helper to convert a row to a Game
fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<Game> {
    Ok(Game {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        release_date: row.get(4)?,
    })
}
