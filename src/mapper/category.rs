//! Mapper for the categories table

use crate::domain::{Category, Shared};
use crate::storage::Store;
use crate::{Error, Result};
use super::{Mapper, adopt_row_id, not_found};

#[derive(Debug, Clone)]
pub struct CategoryMapper {
    store: Store,
}

impl CategoryMapper {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl Mapper for CategoryMapper {
    type Entity = Category;
    const TABLE: &'static str = "categories";

    fn all(&self) -> Result<Vec<Shared<Category>>> {
        let categories = self
            .store
            .query_all("SELECT id, name FROM categories ORDER BY id", [], row_to_category)?;
        Ok(categories.into_iter().map(Shared::new).collect())
    }

    fn find_by_id(&self, id: i64) -> Result<Shared<Category>> {
        self.store
            .query_one("SELECT id, name FROM categories WHERE id = ?1", [id], row_to_category)?
            .map(Shared::new)
            .ok_or_else(|| not_found(Self::TABLE, id))
    }

    fn insert(&self, entity: &Shared<Category>) -> Result<()> {
        let mut category = entity.write();
        let row_id = self
            .store
            .insert("INSERT INTO categories (name) VALUES (?1)", [&category.name])
            .map_err(Error::Commit)?;
        adopt_row_id(Self::TABLE, &mut category.id, row_id);
        Ok(())
    }

    fn update(&self, entity: &Shared<Category>) -> Result<()> {
        let category = entity.read();
        self.store
            .execute(
                "UPDATE categories SET name = ?1 WHERE id = ?2",
                rusqlite::params![category.name, category.id],
            )
            .map_err(Error::Update)?;
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.store
            .execute("DELETE FROM categories WHERE id = ?1", [id])
            .map_err(Error::Delete)?;
        Ok(())
    }
}

fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category::new(row.get(0)?, row.get::<_, String>(1)?))
}
