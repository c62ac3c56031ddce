//! Gamestore CLI - manage and serve the game store database

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use gamestore::config::{self, GamestoreConfig};
use gamestore::mapper::{Mapper, MapperRegistry};
use gamestore::storage::Store;
use gamestore::ui::{self, Icons};
use gamestore::{DomainObject, Engine, WorkContext};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gamestore")]
#[command(version)]
#[command(about = "Game store backend over SQLite")]
#[command(long_about = r#"
Gamestore keeps games and their categories in a SQLite database and
serves them over HTTP.

Example usage:
  gamestore init
  gamestore add-category --name Action
  gamestore add-game --name Doom --price 9.99 --category 1
  gamestore serve --port 8000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Serve the store over HTTP
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show row counts for every table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Create a category, optionally under a main category
    AddCategory {
        #[arg(short, long)]
        name: String,

        /// Id of the main category
        #[arg(short, long)]
        parent: Option<i64>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Create a game and link it to categories
    AddGame {
        #[arg(short, long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long)]
        price: f64,

        #[arg(long, default_value = "")]
        release_date: String,

        /// Category ids to link the game to
        #[arg(long = "category")]
        categories: Vec<i64>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List games and categories
    List {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn main() {
    if let Err(e) = run() {
        ui::failure(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let loaded = config::load_config(Some(&config_path))?.unwrap_or_default();

    match cli.command {
        Commands::Init { database, force } => {
            let database = database.unwrap_or_else(|| config::default_database_path_in(Path::new(".")));
            let new_config = GamestoreConfig {
                database: Some(database.display().to_string()),
                ..loaded
            };
            config::write_config(&config_path, &new_config, force)?;
            let store = open_store(&database)?;

            ui::done("Store initialized");
            ui::field(Icons::GEAR, "Config", &config_path.display().to_string());
            ui::field(Icons::DATABASE, "Database", &database.display().to_string());
            println!("{}", ui::stats_table(&store.stats()?));
        }

        Commands::Serve { port, database } => {
            let database = database.unwrap_or_else(|| loaded.database_path());
            config::ensure_db_dir(&database)?;
            let port = port.unwrap_or_else(|| loaded.port());
            let log_file = loaded.log_file.as_ref().map(PathBuf::from);

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(gamestore::server::start_server(port, database, log_file))?;
        }

        Commands::Stats { database } => {
            let database = database.unwrap_or_else(|| loaded.database_path());
            let store = open_store(&database)?;

            ui::title(&format!("Gamestore Statistics ({})", database.display()));
            println!("{}", ui::stats_table(&store.stats()?));
        }

        Commands::AddCategory { name, parent, database } => {
            let registry = MapperRegistry::new(open_store(&database.unwrap_or_else(|| loaded.database_path()))?);
            let engine = Engine::load(&registry)?;

            let main = parent.map(|id| engine.find_category_by_id(id)).transpose()?;
            let category = engine.create_category(&name)?;
            let mut context = WorkContext::begin(registry.clone());
            let uow = context.unit_of_work()?;
            category.mark_new(uow);
            if let Some(main) = &main {
                engine.link_categories(main, &category).mark_new(uow);
            }
            let summary = uow.commit()?;

            tracing::debug!(inserted = summary.inserted, "Category committed");
            ui::created("Category", &name, category.read().id, "");
        }

        Commands::AddGame { name, description, price, release_date, categories, database } => {
            let registry = MapperRegistry::new(open_store(&database.unwrap_or_else(|| loaded.database_path()))?);
            let engine = Engine::load(&registry)?;

            let linked = categories
                .iter()
                .map(|id| engine.find_category_by_id(*id))
                .collect::<gamestore::Result<Vec<_>>>()?;
            let game = engine.create_game(&name, &description, price, &release_date)?;

            let mut context = WorkContext::begin(registry.clone());
            let uow = context.unit_of_work()?;
            game.mark_new(uow);
            for category in &linked {
                engine.link_game(&game, category).mark_new(uow);
            }
            let summary = uow.commit()?;

            tracing::debug!(inserted = summary.inserted, "Game committed");
            ui::created("Game", &name, game.read().id, &format!(" in {} categories", linked.len()));
        }

        Commands::List { database } => {
            let registry = MapperRegistry::new(open_store(&database.unwrap_or_else(|| loaded.database_path()))?);
            let engine = Engine::load(&registry)?;

            let categories = engine.categories();
            let table = (!categories.is_empty())
                .then(|| ui::categories_table(categories, |id| engine.games_count(id)));
            ui::listing(Icons::FOLDER, "Categories", table);

            let games = registry.games().all()?;
            let table = (!games.is_empty()).then(|| ui::games_table(&games));
            ui::listing(Icons::GAME, "Games", table);
        }
    }

    Ok(())
}

fn open_store(database: &Path) -> anyhow::Result<Store> {
    config::ensure_db_dir(database)?;
    if !database.exists() {
        ui::caution(&format!("Creating new database at {}", database.display()));
    }
    Ok(Store::open(database)?)
}
