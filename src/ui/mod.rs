pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{caution, created, done, failure, field, listing, title};
pub use table::{categories_table, games_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
