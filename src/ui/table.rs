use tabled::{settings::Style, Table, Tabled};

use crate::domain::{Category, Game, Shared};
use crate::storage::DbStats;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct GameRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Released")]
    release_date: String,
}

#[derive(Tabled)]
struct CategoryRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Games")]
    games: usize,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Games", &stats.games.to_string());
    builder.add_row("Categories", &stats.categories.to_string());
    builder.add_row("Game links", &stats.game_links.to_string());
    builder.add_row("Category links", &stats.category_links.to_string());
    builder.build()
}

pub fn games_table(games: &[Shared<Game>]) -> String {
    let rows: Vec<GameRow> = games
        .iter()
        .map(|game| {
            let game = game.read();
            GameRow {
                id: game.id,
                name: game.name.clone(),
                price: format!("{:.2}", game.price),
                release_date: game.release_date.clone(),
            }
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// `games_count` gives the number shown in the Games column
pub fn categories_table(categories: &[Shared<Category>], games_count: impl Fn(i64) -> usize) -> String {
    let rows: Vec<CategoryRow> = categories
        .iter()
        .map(|category| {
            let category = category.read();
            CategoryRow {
                id: category.id,
                name: category.name.clone(),
                games: games_count(category.id),
            }
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
