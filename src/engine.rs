//! Engine - the application facade over the loaded store
//!
//! On load the engine reads every table through the mappers and keeps the
//! result in memory. Creation checks name uniqueness against that view and
//! hands back entities that are not persisted yet: callers still mark them
//! and commit a unit of work. The in-memory view is never refreshed from the
//! store, so writes from other processes are not seen.

use std::collections::HashSet;
use serde::Serialize;

use crate::domain::{Category, CategoryDependenceLink, Game, GameCategoryLink, IdSequence, Shared};
use crate::mapper::{Mapper, MapperRegistry};
use crate::patterns::{User, UserKind};
use crate::{Error, Result};

/// A category with its direct subcategories, as listed by the store front
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    pub category: Shared<Category>,
    pub sub_categories: Vec<Shared<Category>>,
}

#[derive(Debug, Default)]
pub struct Engine {
    games: Vec<Shared<Game>>,
    categories: Vec<Shared<Category>>,
    games_categories: Vec<Shared<GameCategoryLink>>,
    categories_dependence: Vec<Shared<CategoryDependenceLink>>,
    developers: Vec<User>,
    customers: Vec<User>,
    game_ids: IdSequence,
    category_ids: IdSequence,
    game_link_ids: IdSequence,
    category_link_ids: IdSequence,
}

impl Engine {
    /// Engine with nothing loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Load categories, games and both junction tables.
    ///
    /// Each id counter is moved past the largest id loaded for its table so
    /// new entities never reuse a persisted id.
    pub fn load(registry: &MapperRegistry) -> Result<Self> {
        let mut engine = Self::new();
        engine.categories = registry.categories().all()?;
        engine.games = registry.games().all()?;
        engine.games_categories = registry.game_categories().all()?;
        engine.categories_dependence = registry.category_dependences().all()?;

        sync_ids(&engine.category_ids, engine.categories.iter().map(|c| c.read().id));
        sync_ids(&engine.game_ids, engine.games.iter().map(|g| g.read().id));
        sync_ids(&engine.game_link_ids, engine.games_categories.iter().map(|l| l.read().id));
        sync_ids(&engine.category_link_ids, engine.categories_dependence.iter().map(|l| l.read().id));

        tracing::info!(
            categories = engine.categories.len(),
            games = engine.games.len(),
            game_links = engine.games_categories.len(),
            category_links = engine.categories_dependence.len(),
            "Engine loaded"
        );
        Ok(engine)
    }

    // ========== Creation ==========

    /// New category with the next id. Not persisted and not added to the
    /// loaded view.
    pub fn create_category(&self, name: &str) -> Result<Shared<Category>> {
        if self.categories.iter().any(|c| c.read().name == name) {
            return Err(Error::DuplicateName { kind: "category", name: name.to_string() });
        }
        Ok(Shared::new(Category::new(self.category_ids.next_id(), name)))
    }

    /// New game with the next id. Not persisted and not added to the loaded
    /// view.
    pub fn create_game(
        &self,
        name: &str,
        description: &str,
        price: f64,
        release_date: &str,
    ) -> Result<Shared<Game>> {
        if self.games.iter().any(|g| g.read().name == name) {
            return Err(Error::DuplicateName { kind: "game", name: name.to_string() });
        }
        Ok(Shared::new(Game::new(
            self.game_ids.next_id(),
            name,
            description,
            price,
            release_date,
        )))
    }

    pub fn create_category_dependence(&self, main_id: i64, sub_id: i64) -> Shared<CategoryDependenceLink> {
        Shared::new(CategoryDependenceLink::new(self.category_link_ids.next_id(), main_id, sub_id))
    }

    pub fn create_game_category(&self, game_id: i64, category_id: i64) -> Shared<GameCategoryLink> {
        Shared::new(GameCategoryLink::new(self.game_link_ids.next_id(), game_id, category_id))
    }

    /// Dependence link that takes both category ids from the handles when
    /// written. Use it when either category is committed together with the
    /// link.
    pub fn link_categories(&self, main: &Shared<Category>, sub: &Shared<Category>) -> Shared<CategoryDependenceLink> {
        Shared::new(CategoryDependenceLink::between(self.category_link_ids.next_id(), main, sub))
    }

    /// Game/category link that takes both ids from the handles when written
    pub fn link_game(&self, game: &Shared<Game>, category: &Shared<Category>) -> Shared<GameCategoryLink> {
        Shared::new(GameCategoryLink::between(self.game_link_ids.next_id(), game, category))
    }

    /// Copy of the game called `name`, renamed `Copy_of_<name>`.
    /// `None` when no loaded game has that name.
    pub fn copy_game(&self, name: &str) -> Result<Option<Shared<Game>>> {
        let Some(original) = self.get_game(name) else {
            return Ok(None);
        };
        let template = original.read().prototype();
        let copy = self.create_game(
            &format!("Copy_of_{}", name),
            &template.description,
            template.price,
            &template.release_date,
        )?;
        Ok(Some(copy))
    }

    /// Build a user of the given kind and remember it
    pub fn create_user(&mut self, kind: &str) -> Result<User> {
        let user = User::create(kind)?;
        match user.kind {
            UserKind::Developer => self.developers.push(user.clone()),
            UserKind::Customer => self.customers.push(user.clone()),
        }
        Ok(user)
    }

    // ========== Loaded view ==========

    // Adding a committed entity moves its counter past the entity's id, which
    // may be a row id adopted from the store.

    pub fn add_category(&mut self, category: Shared<Category>) {
        self.category_ids.advance_past(category.read().id);
        self.categories.push(category);
    }

    pub fn add_game(&mut self, game: Shared<Game>) {
        self.game_ids.advance_past(game.read().id);
        self.games.push(game);
    }

    pub fn add_game_category(&mut self, link: Shared<GameCategoryLink>) {
        self.game_link_ids.advance_past(link.read().id);
        self.games_categories.push(link);
    }

    pub fn add_category_dependence(&mut self, link: Shared<CategoryDependenceLink>) {
        self.category_link_ids.advance_past(link.read().id);
        self.categories_dependence.push(link);
    }

    pub fn games(&self) -> &[Shared<Game>] {
        &self.games
    }

    pub fn categories(&self) -> &[Shared<Category>] {
        &self.categories
    }

    pub fn game_categories(&self) -> &[Shared<GameCategoryLink>] {
        &self.games_categories
    }

    pub fn category_dependences(&self) -> &[Shared<CategoryDependenceLink>] {
        &self.categories_dependence
    }

    pub fn developers(&self) -> &[User] {
        &self.developers
    }

    pub fn customers(&self) -> &[User] {
        &self.customers
    }

    // ========== Lookup ==========

    /// Loaded category with this id, or [`Error::CategoryNotFound`]
    pub fn find_category_by_id(&self, id: i64) -> Result<Shared<Category>> {
        self.categories
            .iter()
            .find(|c| c.read().id == id)
            .cloned()
            .ok_or(Error::CategoryNotFound(id))
    }

    /// Loaded game with this name. A miss is not an error here.
    pub fn get_game(&self, name: &str) -> Option<Shared<Game>> {
        self.games.iter().find(|g| g.read().name == name).cloned()
    }

    /// Categories arranged for listing: categories that have subcategories
    /// first, in order of their first dependence link, then every remaining
    /// category that is nobody's subcategory.
    pub fn category_tree(&self) -> Vec<CategoryNode> {
        let links: Vec<(i64, i64)> = self
            .categories_dependence
            .iter()
            .map(|l| {
                let link = l.read();
                (link.main_category_id, link.sub_category_id)
            })
            .collect();
        let subs: HashSet<i64> = links.iter().map(|&(_, sub)| sub).collect();

        let mut mains: Vec<i64> = Vec::new();
        for &(main, _) in &links {
            if !mains.contains(&main) {
                mains.push(main);
            }
        }

        let mut nodes: Vec<CategoryNode> = mains
            .iter()
            .filter(|id| !subs.contains(*id))
            .filter_map(|&main_id| {
                let category = self.find_category_by_id(main_id).ok()?;
                let sub_categories = links
                    .iter()
                    .filter(|&&(main, _)| main == main_id)
                    .filter_map(|&(_, sub)| self.find_category_by_id(sub).ok())
                    .collect();
                Some(CategoryNode { category, sub_categories })
            })
            .collect();

        for category in &self.categories {
            let id = category.read().id;
            if !subs.contains(&id) && !mains.contains(&id) {
                nodes.push(CategoryNode { category: category.clone(), sub_categories: Vec::new() });
            }
        }
        nodes
    }

    /// Games linked to the category plus, recursively, to its subcategories
    pub fn games_count(&self, category_id: i64) -> usize {
        let mut visited = HashSet::new();
        self.count_games(category_id, &mut visited)
    }

    fn count_games(&self, category_id: i64, visited: &mut HashSet<i64>) -> usize {
        if !visited.insert(category_id) {
            return 0;
        }
        let own = self
            .games_categories
            .iter()
            .filter(|l| l.read().category_id == category_id)
            .count();
        let sub_ids: Vec<i64> = self
            .categories_dependence
            .iter()
            .filter_map(|l| {
                let link = l.read();
                (link.main_category_id == category_id).then_some(link.sub_category_id)
            })
            .collect();
        own + sub_ids.into_iter().map(|id| self.count_games(id, visited)).sum::<usize>()
    }

    // ========== Form values ==========

    /// Decode a submitted form value: `%` becomes `=`, `+` becomes a space,
    /// then quoted-printable escapes are resolved and the bytes read as
    /// UTF-8 (invalid sequences are replaced).
    pub fn decode_value(value: &str) -> String {
        let prepared = value.replace('%', "=").replace('+', " ");
        let bytes = prepared.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'=' {
                out.push(bytes[i]);
                i += 1;
                continue;
            }
            i += 1;
            match bytes.get(i) {
                // Trailing `=` is a soft line break
                None => break,
                // Soft line break: skip through the end of the line
                Some(b'\n') | Some(b'\r') => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    i += 1;
                }
                Some(b'=') => {
                    out.push(b'=');
                    i += 1;
                }
                Some(&hi) => match bytes.get(i + 1) {
                    Some(&lo) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                        out.push(hex_value(hi) << 4 | hex_value(lo));
                        i += 2;
                    }
                    _ => out.push(b'='),
                },
            }
        }

        String::from_utf8_lossy(&out).into_owned()
    }
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

fn sync_ids(sequence: &IdSequence, ids: impl Iterator<Item = i64>) {
    if let Some(max) = ids.max() {
        sequence.advance_past(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainObject;
    use crate::storage::Store;
    use crate::unit_of_work::UnitOfWork;

    fn registry() -> MapperRegistry {
        MapperRegistry::new(Store::open_in_memory().unwrap().with_statement_journal())
    }

    #[test]
    fn test_create_category_then_duplicate_fails() {
        let mut engine = Engine::load(&registry()).unwrap();
        assert!(engine.categories().is_empty());

        let rpg = engine.create_category("RPG").unwrap();
        assert_eq!(rpg.read().id, 1);
        engine.add_category(rpg);

        let err = engine.create_category("RPG").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { kind: "category", ref name } if name == "RPG"));
    }

    #[test]
    fn test_duplicate_game_name_issues_no_insert() {
        let registry = registry();
        let mut engine = Engine::load(&registry).unwrap();
        let mut uow = UnitOfWork::new(registry.clone());

        let doom = engine.create_game("Doom", "", 9.99, "1993").unwrap();
        doom.mark_new(&mut uow);
        uow.commit().unwrap();
        engine.add_game(doom);
        let before = registry.store().journal().len();

        assert!(matches!(
            engine.create_game("Doom", "again", 1.0, "2016"),
            Err(Error::DuplicateName { kind: "game", .. })
        ));
        uow.commit().unwrap();
        assert_eq!(registry.store().journal().len(), before);
    }

    #[test]
    fn test_load_resyncs_id_counters() {
        let registry = registry();
        for name in ["Action", "Puzzle", "Racing"] {
            registry.categories().insert(&Shared::new(Category::new(0, name))).unwrap();
        }

        let engine = Engine::load(&registry).unwrap();
        assert_eq!(engine.categories().len(), 3);
        assert_eq!(engine.create_category("Sports").unwrap().read().id, 4);
        assert_eq!(engine.create_game("Doom", "", 1.0, "").unwrap().read().id, 1);
    }

    #[test]
    fn test_created_ids_match_store_ids_after_commit() {
        let registry = registry();
        let mut engine = Engine::load(&registry).unwrap();
        let mut uow = UnitOfWork::new(registry.clone());

        let shooter = engine.create_category("Shooter").unwrap();
        let doom = engine.create_game("Doom", "", 9.99, "1993").unwrap();
        let link = engine.create_game_category(doom.read().id, shooter.read().id);
        shooter.mark_new(&mut uow);
        doom.mark_new(&mut uow);
        link.mark_new(&mut uow);
        uow.commit().unwrap();
        engine.add_category(shooter);
        engine.add_game(doom);
        engine.add_game_category(link);

        let reloaded = Engine::load(&registry).unwrap();
        let games = registry.game_categories().find_by_category_id(1).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].read().name, "Doom");
        assert_eq!(reloaded.games_count(1), 1);
    }

    #[test]
    fn test_links_follow_parent_ids_adopted_from_store() {
        let registry = registry();
        let mut engine = Engine::load(&registry).unwrap();
        let mut uow = UnitOfWork::new(registry.clone());

        let action = engine.create_category("Action").unwrap();
        action.mark_new(&mut uow);
        uow.commit().unwrap();
        engine.add_category(action.clone());

        // Written by another process: the store's sequence is now ahead
        registry
            .store()
            .execute("INSERT INTO categories (name) VALUES (?1)", ["Racing"])
            .unwrap();

        let shooter = engine.create_category("Shooter").unwrap();
        assert_eq!(shooter.read().id, 2);
        let link = engine.link_categories(&action, &shooter);
        shooter.mark_new(&mut uow);
        link.mark_new(&mut uow);
        uow.commit().unwrap();

        assert_eq!(shooter.read().id, 3);
        assert_eq!(link.read().sub_category_id, 3);
        let subs = registry.category_dependences().find_by_main_category_id(1).unwrap();
        let names: Vec<String> = subs.iter().map(|c| c.read().name.clone()).collect();
        assert_eq!(names, vec!["Shooter"]);

        engine.add_category(shooter);
        assert_eq!(engine.create_category("Sports").unwrap().read().id, 4);
    }

    #[test]
    fn test_find_category_by_id_versus_get_game() {
        let mut engine = Engine::new();
        let rpg = engine.create_category("RPG").unwrap();
        engine.add_category(rpg);

        assert_eq!(engine.find_category_by_id(1).unwrap().read().name, "RPG");
        let err = engine.find_category_by_id(9).unwrap_err();
        assert!(matches!(err, Error::CategoryNotFound(9)));
        assert!(err.is_not_found());

        assert!(engine.get_game("Missing").is_none());
    }

    #[test]
    fn test_copy_game() {
        let mut engine = Engine::new();
        let doom = engine.create_game("Doom", "Demons", 9.99, "1993-12-10").unwrap();
        engine.add_game(doom.clone());

        let copy = engine.copy_game("Doom").unwrap().unwrap();
        {
            let copy = copy.read();
            assert_eq!(copy.name, "Copy_of_Doom");
            assert_eq!(copy.description, "Demons");
            assert_eq!(copy.price, 9.99);
            assert_ne!(copy.id, doom.read().id);
        }
        engine.add_game(copy);

        assert!(engine.copy_game("Quake").unwrap().is_none());
        assert!(matches!(engine.copy_game("Doom"), Err(Error::DuplicateName { .. })));
    }

    #[test]
    fn test_category_tree_and_games_count() {
        let mut engine = Engine::new();
        let names = ["Action", "Shooter", "Platformer", "Puzzle"];
        for name in names {
            let category = engine.create_category(name).unwrap();
            engine.add_category(category);
        }
        // Action(1) -> Shooter(2), Platformer(3); Puzzle(4) stands alone
        let l1 = engine.create_category_dependence(1, 2);
        let l2 = engine.create_category_dependence(1, 3);
        engine.add_category_dependence(l1);
        engine.add_category_dependence(l2);
        for (game, category) in [(1, 1), (2, 2), (3, 2), (4, 3), (5, 4)] {
            let link = engine.create_game_category(game, category);
            engine.add_game_category(link);
        }

        let tree = engine.category_tree();
        let listed: Vec<(String, Vec<String>)> = tree
            .iter()
            .map(|node| {
                (
                    node.category.read().name.clone(),
                    node.sub_categories.iter().map(|c| c.read().name.clone()).collect(),
                )
            })
            .collect();
        assert_eq!(
            listed,
            vec![
                ("Action".to_string(), vec!["Shooter".to_string(), "Platformer".to_string()]),
                ("Puzzle".to_string(), vec![]),
            ]
        );

        assert_eq!(engine.games_count(1), 4);
        assert_eq!(engine.games_count(2), 2);
        assert_eq!(engine.games_count(4), 1);
    }

    #[test]
    fn test_games_count_survives_cycles() {
        let mut engine = Engine::new();
        for (main, sub) in [(1, 2), (2, 1)] {
            let link = engine.create_category_dependence(main, sub);
            engine.add_category_dependence(link);
        }
        let link = engine.create_game_category(1, 2);
        engine.add_game_category(link);

        assert_eq!(engine.games_count(1), 1);
    }

    #[test]
    fn test_create_user_tracks_kinds() {
        let mut engine = Engine::new();
        engine.create_user("developer").unwrap();
        engine.create_user("customer").unwrap();
        engine.create_user("customer").unwrap();

        assert_eq!(engine.developers().len(), 1);
        assert_eq!(engine.customers().len(), 2);
        assert!(engine.create_user("admin").is_err());
    }

    #[test]
    fn test_decode_value() {
        assert_eq!(Engine::decode_value("Space+Quest"), "Space Quest");
        assert_eq!(Engine::decode_value("%D0%A0%D0%9F%D0%93+game"), "РПГ game");
        assert_eq!(Engine::decode_value("50%25+off"), "50% off");
        assert_eq!(Engine::decode_value("plain"), "plain");
        // Not an escape: left alone
        assert_eq!(Engine::decode_value("a%zz"), "a=zz");
        assert_eq!(Engine::decode_value("a%4"), "a=4");
        // Trailing escape marker is a soft line break
        assert_eq!(Engine::decode_value("50%"), "50");
        // A doubled marker yields one `=` and the rest is kept
        assert_eq!(Engine::decode_value("a%%41"), "a=41");
        assert_eq!(Engine::decode_value("line%\r\nbreak"), "linebreak");
    }
}
