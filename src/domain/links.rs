//! Junction rows for the two many-to-many relations
//!
//! A link built from entity handles reads its ids from them each time it is
//! written, so a parent inserted in the same commit contributes the row id
//! the store assigned to it rather than the id it was created with.

use serde::{Deserialize, Serialize};

use super::{Category, Game, Shared};

/// Membership of a game in a category
#[derive(Clone, Serialize, Deserialize)]
pub struct GameCategoryLink {
    pub id: i64,
    pub game_id: i64,
    pub category_id: i64,
    #[serde(skip)]
    ends: Option<(Shared<Game>, Shared<Category>)>,
}

impl GameCategoryLink {
    pub fn new(id: i64, game_id: i64, category_id: i64) -> Self {
        Self { id, game_id, category_id, ends: None }
    }

    /// Link tied to both entities; see [`GameCategoryLink::sync_ends`]
    pub fn between(id: i64, game: &Shared<Game>, category: &Shared<Category>) -> Self {
        let mut link = Self::new(id, 0, 0);
        link.ends = Some((game.clone(), category.clone()));
        link.sync_ends();
        link
    }

    /// Refresh `game_id` and `category_id` from the linked handles
    pub fn sync_ends(&mut self) {
        if let Some((game, category)) = &self.ends {
            self.game_id = game.read().id;
            self.category_id = category.read().id;
        }
    }
}

impl PartialEq for GameCategoryLink {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.game_id == other.game_id && self.category_id == other.category_id
    }
}

impl std::fmt::Debug for GameCategoryLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameCategoryLink")
            .field("id", &self.id)
            .field("game_id", &self.game_id)
            .field("category_id", &self.category_id)
            .finish()
    }
}

/// Directed hierarchy edge: `sub_category_id` belongs under `main_category_id`
#[derive(Clone, Serialize, Deserialize)]
pub struct CategoryDependenceLink {
    pub id: i64,
    pub main_category_id: i64,
    pub sub_category_id: i64,
    #[serde(skip)]
    ends: Option<(Shared<Category>, Shared<Category>)>,
}

impl CategoryDependenceLink {
    pub fn new(id: i64, main_category_id: i64, sub_category_id: i64) -> Self {
        Self { id, main_category_id, sub_category_id, ends: None }
    }

    pub fn between(id: i64, main: &Shared<Category>, sub: &Shared<Category>) -> Self {
        let mut link = Self::new(id, 0, 0);
        link.ends = Some((main.clone(), sub.clone()));
        link.sync_ends();
        link
    }

    pub fn sync_ends(&mut self) {
        if let Some((main, sub)) = &self.ends {
            self.main_category_id = main.read().id;
            self.sub_category_id = sub.read().id;
        }
    }
}

impl PartialEq for CategoryDependenceLink {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.main_category_id == other.main_category_id
            && self.sub_category_id == other.sub_category_id
    }
}

impl std::fmt::Debug for CategoryDependenceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryDependenceLink")
            .field("id", &self.id)
            .field("main_category_id", &self.main_category_id)
            .field("sub_category_id", &self.sub_category_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_ends_follow_parent_ids() {
        let game = Shared::new(Game::new(4, "Doom", "", 1.0, ""));
        let category = Shared::new(Category::new(2, "Shooter"));
        let mut link = GameCategoryLink::between(1, &game, &category);
        assert_eq!((link.game_id, link.category_id), (4, 2));

        game.write().id = 9;
        link.sync_ends();
        assert_eq!(link, GameCategoryLink::new(1, 9, 2));
    }

    #[test]
    fn test_plain_link_keeps_its_ids() {
        let mut link = CategoryDependenceLink::new(1, 3, 5);
        link.sync_ends();
        assert_eq!((link.main_category_id, link.sub_category_id), (3, 5));
    }
}
