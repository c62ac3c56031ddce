use axum::{
    extract::{Query, RawQuery, State},
    http::{header, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::{Category, DomainObject, Game, Shared};
use crate::engine::{CategoryNode, Engine};
use crate::mapper::Mapper;
use crate::patterns::Serializer;
use crate::server::AppState;
use crate::storage::DbStats;
use crate::unit_of_work::{UnitOfWork, WorkContext};
use crate::Error;

#[derive(Deserialize)]
pub struct IdParams {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(e: Error) -> ApiError {
    let status = match &e {
        e if e.is_not_found() => StatusCode::NOT_FOUND,
        Error::DuplicateName { .. } => StatusCode::CONFLICT,
        Error::UnknownUserKind(_) => StatusCode::BAD_REQUEST,
        e if e.is_configuration() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    } else {
        tracing::debug!("Request rejected: {}", e);
    }
    (status, Json(ErrorResponse { error: e.to_string() }))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message.into() }))
}

/// `key=value&key=value` pairs with values run through
/// [`Engine::decode_value`]. Repeated keys keep every value.
#[derive(Debug, Default)]
pub struct FormData(HashMap<String, Vec<String>>);

impl FormData {
    pub fn parse(raw: &str) -> Self {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            fields
                .entry(key.to_string())
                .or_default()
                .push(Engine::decode_value(value));
        }
        Self(fields)
    }

    /// First value of a field, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    fn require(&self, key: &str) -> Result<&str, ApiError> {
        self.get(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| bad_request(format!("missing field '{}'", key)))
    }
}

/// Commit and, on failure, resync the engine with the store before
/// reporting the commit error
fn commit(state: &AppState, engine: &mut Engine, uow: &mut UnitOfWork) -> Result<(), ApiError> {
    let Err(e) = uow.commit() else {
        return Ok(());
    };
    if let Err(reload) = state.reload(engine) {
        tracing::error!("Engine reload after failed commit failed: {}", reload);
    }
    Err(api_error(e))
}

fn parse_id(value: &str) -> Result<i64, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| bad_request(format!("'{}' is not a valid id", value)))
}

#[derive(Serialize)]
pub struct StoreView {
    pub games: Vec<Shared<Game>>,
    pub categories: Vec<CategoryNode>,
}

pub async fn get_store(State(state): State<Arc<AppState>>) -> ApiResult<StoreView> {
    state.loggers.get("views").log("Store page requested");
    let games = state.registry.games().all().map_err(api_error)?;
    let categories = state.engine().category_tree();
    Ok(Json(StoreView { games, categories }))
}

#[derive(Serialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub games_count: usize,
}

pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<CategorySummary>> {
    let engine = state.engine();
    let summaries = engine
        .categories()
        .iter()
        .map(|category| {
            let category = category.read();
            CategorySummary {
                id: category.id,
                name: category.name.clone(),
                games_count: engine.games_count(category.id),
            }
        })
        .collect();
    Json(summaries)
}

/// Form fields: `name`, optional `category` (id of the main category)
pub async fn create_category(State(state): State<Arc<AppState>>, body: String) -> ApiResult<Shared<Category>> {
    let form = FormData::parse(&body);
    let name = form.require("name")?;

    let mut engine = state.engine();
    let main_category = match form.get("category").filter(|v| !v.is_empty()) {
        Some(main) => Some(engine.find_category_by_id(parse_id(main)?).map_err(api_error)?),
        None => None,
    };

    let category = engine.create_category(name).map_err(api_error)?;
    for notifier in &state.notifiers {
        category.write().attach(notifier.clone());
    }

    let mut context = WorkContext::begin(state.registry.clone());
    let uow = context.unit_of_work().map_err(api_error)?;
    category.mark_new(uow);

    let dependence = main_category.map(|main| {
        let link = engine.link_categories(&main, &category);
        link.mark_new(uow);
        link
    });

    commit(&state, &mut engine, uow)?;

    engine.add_category(category.clone());
    if let Some(link) = dependence {
        engine.add_category_dependence(link);
    }
    state.loggers.get("views").log(&format!("Category '{}' created", name));
    Ok(Json(category))
}

/// Form fields: `name`, `description`, `price`, `release_date` and any
/// number of `categories` ids
pub async fn create_game(State(state): State<Arc<AppState>>, body: String) -> ApiResult<Shared<Game>> {
    let form = FormData::parse(&body);
    let name = form.require("name")?;
    let description = form.get("description").unwrap_or_default();
    let release_date = form.get("release_date").unwrap_or_default();
    let price: f64 = form
        .require("price")?
        .trim()
        .parse()
        .map_err(|_| bad_request("price must be a number"))?;

    let mut engine = state.engine();
    let categories = form
        .all("categories")
        .iter()
        .map(|id| parse_id(id).and_then(|id| engine.find_category_by_id(id).map_err(api_error)))
        .collect::<Result<Vec<_>, _>>()?;

    let game = engine
        .create_game(name, description, price, release_date)
        .map_err(api_error)?;

    let mut context = WorkContext::begin(state.registry.clone());
    let uow = context.unit_of_work().map_err(api_error)?;
    game.mark_new(uow);

    let links: Vec<_> = categories
        .iter()
        .map(|category| engine.link_game(&game, category))
        .collect();
    for link in &links {
        link.mark_new(uow);
    }

    commit(&state, &mut engine, uow)?;

    for category in &categories {
        category.write().add_game(game.clone());
    }
    engine.add_game(game.clone());
    for link in links {
        engine.add_game_category(link);
    }
    state.loggers.get("views").log(&format!("Game '{}' created", name));
    Ok(Json(game))
}

/// Query: `name` of the game to duplicate
pub async fn copy_game(State(state): State<Arc<AppState>>, RawQuery(query): RawQuery) -> ApiResult<Shared<Game>> {
    let params = FormData::parse(query.as_deref().unwrap_or_default());
    let name = params.require("name")?;

    let mut engine = state.engine();
    let original = engine
        .get_game(name)
        .ok_or_else(|| api_error(Error::RecordNotFound(format!("no game named '{}'", name))))?;
    let copy = engine
        .copy_game(name)
        .map_err(api_error)?
        .ok_or_else(|| api_error(Error::RecordNotFound(format!("no game named '{}'", name))))?;

    let original_id = original.read().id;
    let categories = state
        .registry
        .game_categories()
        .find_by_game_id(original_id)
        .map_err(api_error)?;

    let mut context = WorkContext::begin(state.registry.clone());
    let uow = context.unit_of_work().map_err(api_error)?;
    copy.mark_new(uow);

    let links: Vec<_> = categories
        .iter()
        .map(|category| engine.link_game(&copy, category))
        .collect();
    for link in &links {
        link.mark_new(uow);
    }

    commit(&state, &mut engine, uow)?;

    for link in links {
        let category_id = link.read().category_id;
        if let Ok(category) = engine.find_category_by_id(category_id) {
            category.write().add_game(copy.clone());
        }
        engine.add_game_category(link);
    }
    engine.add_game(copy.clone());
    Ok(Json(copy))
}

#[derive(Serialize)]
pub struct GamesListView {
    pub category: Shared<Category>,
    pub games: Vec<Shared<Game>>,
}

/// Games of a category followed by the games of its direct subcategories
pub async fn games_list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IdParams>,
) -> ApiResult<GamesListView> {
    let category = state.registry.categories().find_by_id(params.id).map_err(api_error)?;
    let links = state.registry.game_categories();

    let mut games = links.find_by_category_id(params.id).map_err(api_error)?;
    let subs = state
        .registry
        .category_dependences()
        .find_by_main_category_id(params.id)
        .map_err(api_error)?;
    for sub in subs {
        let sub_id = sub.read().id;
        games.extend(links.find_by_category_id(sub_id).map_err(api_error)?);
    }

    Ok(Json(GamesListView { category, games }))
}

type JsonBody = ([(header::HeaderName, &'static str); 1], String);

fn json_body(json: String) -> JsonBody {
    ([(header::CONTENT_TYPE, "application/json")], json)
}

pub async fn categories_api(State(state): State<Arc<AppState>>) -> Result<JsonBody, ApiError> {
    let engine = state.engine();
    let json = Serializer::new(engine.categories()).save().map_err(api_error)?;
    Ok(json_body(json))
}

pub async fn games_api(State(state): State<Arc<AppState>>) -> Result<JsonBody, ApiError> {
    let engine = state.engine();
    let json = Serializer::new(engine.games()).save().map_err(api_error)?;
    Ok(json_body(json))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<DbStats> {
    let stats = state.registry.store().stats().map_err(api_error)?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::LoggerRegistry;
    use crate::storage::Store;

    fn state() -> Arc<AppState> {
        let store = Store::open_in_memory().unwrap();
        Arc::new(AppState::new(store, LoggerRegistry::new()).unwrap())
    }

    async fn post_category(state: &Arc<AppState>, body: &str) -> ApiResult<Shared<Category>> {
        create_category(State(state.clone()), body.to_string()).await
    }

    #[test]
    fn test_form_data_decodes_values() {
        let form = FormData::parse("name=Space+Quest&categories=1&categories=2&broken&price=");
        assert_eq!(form.get("name"), Some("Space Quest"));
        assert_eq!(form.all("categories"), ["1".to_string(), "2".to_string()]);
        assert_eq!(form.get("broken"), None);
        assert!(form.require("price").is_err());
    }

    #[tokio::test]
    async fn test_create_category_and_duplicate() {
        let state = state();
        let Json(rpg) = post_category(&state, "name=RPG").await.unwrap();
        assert_eq!(rpg.read().id, 1);

        let (status, _) = post_category(&state, "name=RPG").await.unwrap_err();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(state.registry.store().count("categories").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_resyncs_engine() {
        let state = state();
        state
            .registry
            .store()
            .execute("INSERT INTO categories (name) VALUES (?1)", ["Racing"])
            .unwrap();

        let (status, _) = post_category(&state, "name=Racing").await.unwrap_err();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.engine().categories().iter().any(|c| c.read().name == "Racing"));

        let Json(next) = post_category(&state, "name=Sports").await.unwrap();
        assert_eq!(next.read().id, 2);
    }

    #[tokio::test]
    async fn test_subcategory_link_follows_store_assigned_id() {
        let state = state();
        post_category(&state, "name=Action").await.unwrap();
        state
            .registry
            .store()
            .execute("INSERT INTO categories (name) VALUES (?1)", ["Racing"])
            .unwrap();

        let Json(shooter) = post_category(&state, "name=Shooter&category=1").await.unwrap();
        assert_eq!(shooter.read().id, 3);

        let subs = state.registry.category_dependences().find_by_main_category_id(1).unwrap();
        let names: Vec<String> = subs.iter().map(|c| c.read().name.clone()).collect();
        assert_eq!(names, vec!["Shooter"]);
        assert_eq!(state.engine().games_count(1), 0);
    }

    #[tokio::test]
    async fn test_subcategory_needs_existing_main() {
        let state = state();
        let (status, _) = post_category(&state, "name=Shooter&category=5").await.unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);

        post_category(&state, "name=Action").await.unwrap();
        post_category(&state, "name=Shooter&category=1").await.unwrap();
        let subs = state.registry.category_dependences().find_by_main_category_id(1).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].read().name, "Shooter");
    }

    #[tokio::test]
    async fn test_create_game_links_categories_and_lists_them() {
        let state = state();
        post_category(&state, "name=Action").await.unwrap();
        post_category(&state, "name=Shooter&category=1").await.unwrap();

        let body = "name=Doom&description=Demons+on+Mars&price=9.99&release_date=1993-12-10&categories=2";
        let Json(doom) = create_game(State(state.clone()), body.to_string()).await.unwrap();
        assert_eq!(doom.read().description, "Demons on Mars");

        let Json(view) = games_list(State(state.clone()), Query(IdParams { id: 1 })).await.unwrap();
        assert_eq!(view.category.read().name, "Action");
        assert_eq!(view.games.len(), 1);
        assert_eq!(view.games[0].read().name, "Doom");

        let Json(summaries) = list_categories(State(state.clone())).await;
        assert_eq!(summaries[0].games_count, 1);
        assert_eq!(state.engine().find_category_by_id(2).unwrap().read().games.len(), 1);
    }

    #[tokio::test]
    async fn test_create_game_rejects_bad_price() {
        let state = state();
        let (status, Json(body)) = create_game(State(state.clone()), "name=Doom&price=cheap".to_string())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "price must be a number");
    }

    #[tokio::test]
    async fn test_copy_game_duplicates_links() {
        let state = state();
        post_category(&state, "name=Shooter").await.unwrap();
        create_game(State(state.clone()), "name=Doom&price=9.99&categories=1".to_string())
            .await
            .unwrap();

        let Json(copy) = copy_game(State(state.clone()), RawQuery(Some("name=Doom".to_string())))
            .await
            .unwrap();
        assert_eq!(copy.read().name, "Copy_of_Doom");

        let games = state.registry.game_categories().find_by_category_id(1).unwrap();
        let names: Vec<String> = games.iter().map(|g| g.read().name.clone()).collect();
        assert_eq!(names, vec!["Doom", "Copy_of_Doom"]);

        let (status, _) = copy_game(State(state.clone()), RawQuery(Some("name=Quake".to_string())))
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_endpoints_serialize_loaded_view() {
        let state = state();
        post_category(&state, "name=Puzzle").await.unwrap();

        let (_, json) = categories_api(State(state.clone())).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!([{"id": 1, "name": "Puzzle", "games": []}]));

        let (_, json) = games_api(State(state.clone())).await.unwrap();
        assert_eq!(json, "[]");

        let Json(stats) = get_stats(State(state)).await.unwrap();
        assert_eq!(stats.categories, 1);
    }
}
