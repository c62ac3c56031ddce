use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Game, Shared};
use crate::patterns::observer::Observer;

/// A game category.
///
/// Parent/child links live in `categories_dependence` rows. The game list
/// and observers are in-memory only and never persisted.
#[derive(Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// Unique across all categories
    pub name: String,
    #[serde(default)]
    pub games: Vec<Shared<Game>>,
    #[serde(skip)]
    observers: Vec<Arc<dyn Observer>>,
}

impl Category {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            games: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Subscribe an observer to game additions
    pub fn attach(&mut self, observer: Arc<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn observers(&self) -> &[Arc<dyn Observer>] {
        &self.observers
    }

    /// Call every attached observer with this category
    pub fn notify(&self) {
        for observer in &self.observers {
            observer.update(self);
        }
    }

    /// Append a game and notify observers once it is in the list
    pub fn add_game(&mut self, game: Shared<Game>) {
        self.games.push(game);
        self.notify();
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl std::fmt::Debug for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Category")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("games", &self.games.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl Observer for Recorder {
        fn update(&self, subject: &Category) {
            self.seen
                .lock()
                .unwrap()
                .push((subject.name.clone(), subject.games.len()));
        }
    }

    #[test]
    fn test_add_game_notifies_after_mutation() {
        let recorder = Arc::new(Recorder::default());
        let mut category = Category::new(1, "RPG");
        category.attach(recorder.clone());

        category.add_game(Shared::new(Game::new(1, "Fallout", "", 10.0, "1997-10-10")));
        category.add_game(Shared::new(Game::new(2, "Arcanum", "", 12.0, "2001-08-21")));

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(*seen, vec![("RPG".to_string(), 1), ("RPG".to_string(), 2)]);
    }

    #[test]
    fn test_serialization_skips_observers() {
        let mut category = Category::new(4, "Puzzle");
        category.attach(Arc::new(Recorder::default()));

        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json, serde_json::json!({"id": 4, "name": "Puzzle", "games": []}));

        let back: Category = serde_json::from_value(json).unwrap();
        assert_eq!(back, category);
        assert!(back.observers().is_empty());
    }
}
