//! JSON serialization of entity collections for the api endpoints

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

/// Wraps a value for JSON round trips
#[derive(Debug, Clone)]
pub struct Serializer<T> {
    value: T,
}

impl<T> Serializer<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Serialize> Serializer<T> {
    /// Encode the wrapped value as JSON
    pub fn save(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.value)?)
    }
}

impl<T: DeserializeOwned> Serializer<T> {
    /// Decode a value previously produced by [`Serializer::save`]
    pub fn load(json: &str) -> Result<T> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Game, Shared};

    #[test]
    fn test_games_survive_save_and_load() {
        let games = vec![
            Shared::new(Game::new(1, "Doom", "Demons", 9.99, "1993-12-10")),
            Shared::new(Game::new(2, "Myst", "Island", 19.99, "1993-09-24")),
        ];

        let json = Serializer::new(&games).save().unwrap();
        let loaded: Vec<Shared<Game>> = Serializer::load(&json).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(*loaded[1].read(), *games[1].read());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = Serializer::<Vec<Game>>::load("not json").unwrap_err();
        assert!(matches!(err, crate::Error::Serialization(_)));
    }
}
