//! Mapper for the categories_dependence junction table

use rusqlite::params;
use crate::domain::{Category, CategoryDependenceLink, Shared};
use crate::{Error, Result};
use super::{Mapper, MapperRegistry, adopt_row_id, not_found};

const COLUMNS: &str = "id, main_category_id, sub_category_id";

#[derive(Debug, Clone)]
pub struct CategoryDependenceMapper {
    registry: MapperRegistry,
}

impl CategoryDependenceMapper {
    pub fn new(registry: MapperRegistry) -> Self {
        Self { registry }
    }

    /// Subcategories of a category, one lookup per link row, in link order
    pub fn find_by_main_category_id(&self, main_category_id: i64) -> Result<Vec<Shared<Category>>> {
        let sub_ids = self.registry.store().query_all(
            "SELECT sub_category_id FROM categories_dependence WHERE main_category_id = ?1 ORDER BY id",
            [main_category_id],
            |row| row.get::<_, i64>(0),
        )?;

        let categories = self.registry.categories();
        sub_ids.into_iter().map(|id| categories.find_by_id(id)).collect()
    }

    /// The main category of a subcategory, if it has one.
    /// When several links exist the first one wins.
    pub fn find_main_category(&self, sub_category_id: i64) -> Result<Option<Shared<Category>>> {
        let main_id = self.registry.store().query_one(
            "SELECT main_category_id FROM categories_dependence WHERE sub_category_id = ?1 ORDER BY id LIMIT 1",
            [sub_category_id],
            |row| row.get::<_, i64>(0),
        )?;

        main_id
            .map(|id| self.registry.categories().find_by_id(id))
            .transpose()
    }
}

impl Mapper for CategoryDependenceMapper {
    type Entity = CategoryDependenceLink;
    const TABLE: &'static str = "categories_dependence";

    fn all(&self) -> Result<Vec<Shared<CategoryDependenceLink>>> {
        let sql = format!("SELECT {} FROM {} ORDER BY id", COLUMNS, Self::TABLE);
        let links = self.registry.store().query_all(&sql, [], row_to_link)?;
        Ok(links.into_iter().map(Shared::new).collect())
    }

    fn find_by_id(&self, id: i64) -> Result<Shared<CategoryDependenceLink>> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?1", COLUMNS, Self::TABLE);
        self.registry
            .store()
            .query_one(&sql, [id], row_to_link)?
            .map(Shared::new)
            .ok_or_else(|| not_found(Self::TABLE, id))
    }

    fn insert(&self, entity: &Shared<CategoryDependenceLink>) -> Result<()> {
        let mut link = entity.write();
        link.sync_ends();
        let row_id = self
            .registry
            .store()
            .insert(
                "INSERT INTO categories_dependence (main_category_id, sub_category_id) VALUES (?1, ?2)",
                params![link.main_category_id, link.sub_category_id],
            )
            .map_err(Error::Commit)?;
        adopt_row_id(Self::TABLE, &mut link.id, row_id);
        Ok(())
    }

    fn update(&self, entity: &Shared<CategoryDependenceLink>) -> Result<()> {
        let mut link = entity.write();
        link.sync_ends();
        self.registry
            .store()
            .execute(
                "UPDATE categories_dependence SET main_category_id = ?1, sub_category_id = ?2 WHERE id = ?3",
                params![link.main_category_id, link.sub_category_id, link.id],
            )
            .map_err(Error::Update)?;
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.registry
            .store()
            .execute("DELETE FROM categories_dependence WHERE id = ?1", [id])
            .map_err(Error::Delete)?;
        Ok(())
    }
}

fn row_to_link(row: &rusqlite::Row) -> rusqlite::Result<CategoryDependenceLink> {
    Ok(CategoryDependenceLink::new(row.get(0)?, row.get(1)?, row.get(2)?))
}
