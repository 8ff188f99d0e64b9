//! In-memory fake of the dida365 v2 endpoints the client uses.
//!
//! One account, one inbox, and whatever projects and tasks the client
//! creates. Tokens are issued on sign-on and checked from the `t` cookie;
//! `MockState::expire_tokens` invalidates them so tests can drive the
//! client's relogin path.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_USERNAME: &str = "demo@example.com";
pub const DEFAULT_PASSWORD: &str = "demo";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub project_id: String,
}

#[derive(Deserialize)]
pub struct SignOn {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
struct ProjectAdd {
    name: String,
}

#[derive(Deserialize)]
struct ProjectBatch {
    #[serde(default)]
    add: Vec<ProjectAdd>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskAdd {
    title: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    project_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskUpdate {
    id: String,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    project_id: String,
}

#[derive(Deserialize)]
struct TaskBatch {
    #[serde(default)]
    add: Vec<TaskAdd>,
    #[serde(default)]
    update: Vec<TaskUpdate>,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    keywords: String,
}

struct Account {
    username: String,
    password: String,
    inbox_id: String,
    tokens: HashSet<String>,
    sign_ons: usize,
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

/// Shared handle on the fake account, cloned into every handler.
#[derive(Clone)]
pub struct MockState {
    account: Arc<Mutex<Account>>,
}

impl MockState {
    pub fn new(username: &str, password: &str) -> Self {
        let account = Account {
            username: username.to_string(),
            password: password.to_string(),
            inbox_id: format!("inbox{}", &new_id()[..9]),
            tokens: HashSet::new(),
            sign_ons: 0,
            projects: Vec::new(),
            tasks: Vec::new(),
        };
        Self {
            account: Arc::new(Mutex::new(account)),
        }
    }

    /// Invalidates every issued token.
    pub fn expire_tokens(&self) {
        self.lock().tokens.clear();
    }

    /// Number of successful sign-ons so far.
    pub fn sign_ons(&self) -> usize {
        self.lock().sign_ons
    }

    pub fn inbox_id(&self) -> String {
        self.lock().inbox_id.clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Account> {
        self.account.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the account if the request carries a live token.
    fn authorized(&self, headers: &HeaderMap) -> Result<MutexGuard<'_, Account>, StatusCode> {
        let account = self.lock();
        match token_from_cookie(headers) {
            Some(token) if account.tokens.contains(token) => Ok(account),
            _ => {
                debug!("rejecting request without a live token");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

pub fn app() -> Router {
    app_with_state(MockState::default())
}

pub fn app_with_state(state: MockState) -> Router {
    let api = Router::new()
        .route("/user/signon", post(sign_on))
        .route("/user/preferences/settings", get(preferences))
        .route("/batch/project", post(batch_project))
        .route("/projects", get(list_projects))
        .route("/batch/task", post(batch_task))
        .route("/batch/check/{checkpoint}", get(batch_check))
        .route("/search/task", get(search_tasks));
    Router::new().nest("/api/v2", api).with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, MockState::default()).await
}

pub async fn run_with_state(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..24].to_string()
}

fn new_etag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn token_from_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| pair.trim().strip_prefix("t="))
}

async fn sign_on(State(state): State<MockState>, Json(input): Json<SignOn>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let mut account = state.lock();
    if input.username != account.username || input.password != account.password {
        debug!(username = %input.username, "sign-on rejected");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"errorCode": "username_password_not_match"})),
        ));
    }
    let token = Uuid::new_v4().simple().to_string();
    account.tokens.insert(token.clone());
    account.sign_ons += 1;
    info!(username = %input.username, "issued token");
    Ok(Json(json!({
        "token": token,
        "userId": "115",
        "username": account.username,
        "inboxId": account.inbox_id,
    })))
}

async fn preferences(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    let account = state.authorized(&headers)?;
    Ok(Json(json!({
        "defaultProjectId": account.inbox_id,
        "timeZone": "Asia/Shanghai",
    })))
}

async fn batch_project(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(batch): Json<ProjectBatch>,
) -> Result<Json<Value>, StatusCode> {
    let mut account = state.authorized(&headers)?;
    let mut id2etag = HashMap::new();
    for add in batch.add {
        let id = new_id();
        account.projects.push(Project {
            id: id.clone(),
            name: add.name,
        });
        id2etag.insert(id, new_etag());
    }
    Ok(Json(json!({"id2etag": id2etag, "id2error": {}})))
}

async fn list_projects(State(state): State<MockState>, headers: HeaderMap) -> Result<Json<Vec<Project>>, StatusCode> {
    let account = state.authorized(&headers)?;
    Ok(Json(account.projects.clone()))
}

async fn batch_task(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(batch): Json<TaskBatch>,
) -> Result<Json<Value>, StatusCode> {
    let mut account = state.authorized(&headers)?;
    let mut id2etag = HashMap::new();
    let mut id2error = HashMap::new();

    for add in batch.add {
        let id = new_id();
        let project_id = add.project_id.unwrap_or_else(|| account.inbox_id.clone());
        account.tasks.push(Task {
            id: id.clone(),
            title: add.title,
            content: add.content.unwrap_or_default(),
            tags: add.tags,
            project_id,
        });
        id2etag.insert(id, new_etag());
    }

    for update in batch.update {
        match account.tasks.iter_mut().find(|t| t.id == update.id) {
            Some(task) => {
                task.title = update.title;
                task.content = update.content;
                task.tags = update.tags;
                task.project_id = update.project_id;
                id2etag.insert(update.id, new_etag());
            }
            None => {
                id2error.insert(update.id, "TASK_NOT_FOUND");
            }
        }
    }

    Ok(Json(json!({"id2etag": id2etag, "id2error": id2error})))
}

async fn batch_check(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(_checkpoint): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    let account = state.authorized(&headers)?;
    Ok(Json(json!({
        "checkPoint": 1,
        "syncTaskBean": {"update": account.tasks, "delete": [], "add": [], "empty": account.tasks.is_empty()},
        "projectProfiles": account.projects,
    })))
}

async fn search_tasks(
    State(state): State<MockState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Task>>, StatusCode> {
    let account = state.authorized(&headers)?;
    let keyword = params.keywords.to_lowercase();
    let hits = account
        .tasks
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&keyword) || t.content.to_lowercase().contains(&keyword))
        .cloned()
        .collect();
    Ok(Json(hits))
}
