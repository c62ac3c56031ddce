use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::mapper::MapperRegistry;
use crate::patterns::{EmailNotifier, FileWriter, LoggerRegistry, Observer, SmsNotifier};
use crate::storage::Store;
use crate::ui::Icons;

pub mod routes;

/// Server state
///
/// The engine's in-memory collections are shared by every request and
/// guarded by one mutex. Each request gets its own unit of work.
pub struct AppState {
    pub registry: MapperRegistry,
    pub engine: Mutex<Engine>,
    pub loggers: LoggerRegistry,
    pub notifiers: Vec<Arc<dyn Observer>>,
}

impl AppState {
    /// Load the engine from the store and set up loggers and notifiers
    pub fn new(store: Store, loggers: LoggerRegistry) -> crate::Result<Self> {
        let registry = MapperRegistry::new(store);
        let notifiers: Vec<Arc<dyn Observer>> = vec![
            Arc::new(EmailNotifier::new(&loggers)),
            Arc::new(SmsNotifier::new(&loggers)),
        ];
        let engine = Self::load_engine(&registry, &notifiers)?;
        Ok(Self {
            registry,
            engine: Mutex::new(engine),
            loggers,
            notifiers,
        })
    }

    /// Fresh engine with every notifier attached to every loaded category
    fn load_engine(registry: &MapperRegistry, notifiers: &[Arc<dyn Observer>]) -> crate::Result<Engine> {
        let engine = Engine::load(registry)?;
        for category in engine.categories() {
            let mut category = category.write();
            for notifier in notifiers {
                category.attach(notifier.clone());
            }
        }
        Ok(engine)
    }

    /// Replace the engine's view with what the store holds now.
    ///
    /// Used after a failed commit: rows applied before the failure become
    /// visible and the id counters catch up with the store.
    pub fn reload(&self, engine: &mut Engine) -> crate::Result<()> {
        *engine = Self::load_engine(&self.registry, &self.notifiers)?;
        Ok(())
    }

    pub fn engine(&self) -> MutexGuard<'_, Engine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/store", get(routes::get_store))
        .route("/categories", get(routes::list_categories).post(routes::create_category))
        .route("/games", post(routes::create_game))
        .route("/games/copy", post(routes::copy_game))
        .route("/games-list", get(routes::games_list))
        .route("/categories-api", get(routes::categories_api))
        .route("/games-api", get(routes::games_api))
        .route("/stats", get(routes::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(port: u16, database_path: PathBuf, log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let store = Store::open(&database_path)?;
    let loggers = match log_file {
        Some(path) => LoggerRegistry::with_writer(Arc::new(FileWriter::new(path))),
        None => LoggerRegistry::new(),
    };
    let state = Arc::new(AppState::new(store, loggers)?);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("{} Server running at http://{}", Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
