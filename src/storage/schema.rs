//! Database schema definitions

/// SQL to create the games table
pub const CREATE_GAMES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS games (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    price REAL NOT NULL DEFAULT 0.0,
    release_date TEXT NOT NULL DEFAULT ''
)
"#;

/// SQL to create the categories table
pub const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

/// SQL to create the games_categories junction table
/// No foreign keys: deleting a game or category leaves its links in place
pub const CREATE_GAMES_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS games_categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id INTEGER NOT NULL,
    category_id INTEGER NOT NULL
)
"#;

/// SQL to create the categories_dependence junction table
pub const CREATE_CATEGORIES_DEPENDENCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories_dependence (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    main_category_id INTEGER NOT NULL,
    sub_category_id INTEGER NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_games_categories_game ON games_categories(game_id)",
    "CREATE INDEX IF NOT EXISTS idx_games_categories_category ON games_categories(category_id)",
    "CREATE INDEX IF NOT EXISTS idx_categories_dependence_main ON categories_dependence(main_category_id)",
    "CREATE INDEX IF NOT EXISTS idx_categories_dependence_sub ON categories_dependence(sub_category_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_GAMES_TABLE,
        CREATE_CATEGORIES_TABLE,
        CREATE_GAMES_CATEGORIES_TABLE,
        CREATE_CATEGORIES_DEPENDENCE_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
