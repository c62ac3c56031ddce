use serde::{Deserialize, Serialize};

/// A game offered by the store.
///
/// Category membership lives in `games_categories` rows, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    /// Unique across all games
    pub name: String,
    pub description: String,
    pub price: f64,
    pub release_date: String,
}

impl Game {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        release_date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
            release_date: release_date.into(),
        }
    }

    /// Field-by-field copy used as the template for a duplicated game
    pub fn prototype(&self) -> Game {
        self.clone()
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.2}, {})", self.name, self.price, self.release_date)
    }
}
