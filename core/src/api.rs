//! Stateless request builder and response parser for the dida365 v2 API.
//!
//! # Design
//! `DidaApi` holds only the API base URL and the web link templates. Each
//! endpoint is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. Authenticated
//! builders take the bearer token explicitly, so the retrying client can
//! rebuild the same request after a fresh sign-on.
//!
//! Response bodies are decoded into the private per-endpoint schemas below.
//! A 2xx body missing a field the endpoint always returns is reported as
//! `UnexpectedResponse`, never as a panic.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DidaError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::link::Links;
use crate::types::{Credentials, NewProject, NewTask, Project, Task};

pub const DEFAULT_API_BASE: &str = "https://api.dida365.com/api/v2";

/// Device identification the web app sends with every request.
pub const X_DEVICE: &str = r#"{"platform":"web","os":"macOS 10.15.7","device":"Chrome 114.0.0.0","name":"","version":4562,"id":"64217d45c3630d2326189adc","channel":"website","campaign":"","websocket":""}"#;

pub const INBOX_TITLE: &str = "Inbox";

// ---------------------------------------------------------------------------
// Wire schemas
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct BatchAdd<T> {
    add: Vec<T>,
}

#[derive(Serialize)]
struct BatchUpdate<T> {
    update: Vec<T>,
}

#[derive(Serialize)]
struct ProjectAdd<'a> {
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskAdd<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    title: &'a str,
    tags: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskUpdate<'a> {
    id: &'a str,
    content: &'a str,
    title: &'a str,
    tags: &'a [String],
    project_id: &'a str,
}

#[derive(Deserialize)]
struct SignOnBody {
    token: Option<String>,
}

#[derive(Deserialize)]
struct Id2EtagBody {
    id2etag: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferencesBody {
    default_project_id: Option<String>,
}

#[derive(Deserialize)]
struct ProjectEntry {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskEntry {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    project_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncBody {
    sync_task_bean: Option<SyncTaskBean>,
}

#[derive(Deserialize)]
struct SyncTaskBean {
    #[serde(default)]
    update: Vec<TaskEntry>,
}

// ---------------------------------------------------------------------------
// Builder / parser
// ---------------------------------------------------------------------------

/// Synchronous, stateless request builder for the dida365 API.
#[derive(Debug, Clone)]
pub struct DidaApi {
    base_url: String,
    links: Links,
}

impl DidaApi {
    pub fn new(base_url: &str, links: Links) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            links,
        }
    }

    pub fn links(&self) -> &Links {
        &self.links
    }

    pub fn build_sign_on(&self, credentials: &Credentials) -> Result<HttpRequest> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/user/signon?wc=true&remember=true", self.base_url),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("x-device".to_string(), X_DEVICE.to_string()),
            ],
            body: Some(encode(credentials)?),
        })
    }

    pub fn build_create_project(&self, token: &str, input: &NewProject) -> Result<HttpRequest> {
        let body = BatchAdd {
            add: vec![ProjectAdd { name: &input.title }],
        };
        Ok(self.post(token, "/batch/project", encode(&body)?))
    }

    pub fn build_inbox_project(&self, token: &str) -> HttpRequest {
        self.get(token, format!("{}/user/preferences/settings?includeWeb=true", self.base_url))
    }

    pub fn build_list_projects(&self, token: &str) -> HttpRequest {
        self.get(token, format!("{}/projects", self.base_url))
    }

    pub fn build_create_task(&self, token: &str, input: &NewTask) -> Result<HttpRequest> {
        let body = BatchAdd {
            add: vec![TaskAdd {
                content: input.content.as_deref(),
                title: &input.title,
                tags: &input.tags,
                project_id: input.project_id.as_deref(),
            }],
        };
        Ok(self.post(token, "/batch/task", encode(&body)?))
    }

    pub fn build_update_task(&self, token: &str, task: &Task) -> Result<HttpRequest> {
        let body = BatchUpdate {
            update: vec![TaskUpdate {
                id: &task.id,
                content: &task.content,
                title: &task.title,
                tags: &task.tags,
                project_id: &task.project_id,
            }],
        };
        Ok(self.post(token, "/batch/task", encode(&body)?))
    }

    pub fn build_list_tasks(&self, token: &str) -> HttpRequest {
        self.get(token, format!("{}/batch/check/0", self.base_url))
    }

    pub fn build_search_tasks(&self, token: &str, keyword: &str) -> Result<HttpRequest> {
        let url = url::Url::parse_with_params(
            &format!("{}/search/task", self.base_url),
            &[("keywords", keyword), ("status", "0")],
        )
        .map_err(|e| DidaError::InvalidRequest(e.to_string()))?;
        Ok(self.get(token, url.to_string()))
    }

    /// Returns the bearer token. A non-2xx status means the credentials
    /// were rejected.
    pub fn parse_sign_on(&self, response: HttpResponse) -> Result<String> {
        if !response.is_success() {
            return Err(DidaError::AuthRejected {
                status: response.status,
                body: response.body,
            });
        }
        let body: SignOnBody = decode(&response.body)?;
        match body.token {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(DidaError::UnexpectedResponse("sign-on response has no token".into())),
        }
    }

    pub fn parse_create_project(&self, response: HttpResponse, input: &NewProject) -> Result<Project> {
        check_status(&response)?;
        let id = first_generated_id(&response.body)?;
        Ok(Project {
            link: self.links.project(&id),
            id,
            title: input.title.clone(),
        })
    }

    pub fn parse_inbox_project(&self, response: HttpResponse) -> Result<Project> {
        check_status(&response)?;
        let body: PreferencesBody = decode(&response.body)?;
        let id = body.default_project_id.ok_or_else(|| {
            DidaError::UnexpectedResponse("preferences have no defaultProjectId".into())
        })?;
        Ok(Project {
            id,
            title: INBOX_TITLE.to_string(),
            link: self.links.inbox_project(),
        })
    }

    pub fn parse_list_projects(&self, response: HttpResponse) -> Result<Vec<Project>> {
        check_status(&response)?;
        let entries: Vec<ProjectEntry> = decode(&response.body)?;
        Ok(entries
            .into_iter()
            .map(|p| Project {
                link: self.links.project(&p.id),
                title: p.name.unwrap_or_default(),
                id: p.id,
            })
            .collect())
    }

    /// The returned task carries the requested project id, or an empty one
    /// when the task went to the inbox.
    pub fn parse_create_task(&self, response: HttpResponse, input: &NewTask) -> Result<Task> {
        check_status(&response)?;
        let id = first_generated_id(&response.body)?;
        let project_id = input.project_id.clone().unwrap_or_default();
        Ok(Task {
            link: self.links.task(&id, Some(&project_id)),
            id,
            title: input.title.clone(),
            content: input.content.clone().unwrap_or_default(),
            tags: input.tags.clone(),
            project_id,
        })
    }

    /// The update response body carries nothing the caller needs; the input
    /// task comes back with a freshly derived link.
    pub fn parse_update_task(&self, response: HttpResponse, task: Task) -> Result<Task> {
        check_status(&response)?;
        Ok(self.relink(task))
    }

    pub fn parse_list_tasks(&self, response: HttpResponse) -> Result<Vec<Task>> {
        check_status(&response)?;
        let body: SyncBody = decode(&response.body)?;
        let bean = body
            .sync_task_bean
            .ok_or_else(|| DidaError::UnexpectedResponse("sync snapshot has no syncTaskBean".into()))?;
        Ok(bean.update.into_iter().map(|t| self.task_from(t)).collect())
    }

    pub fn parse_search_tasks(&self, response: HttpResponse) -> Result<Vec<Task>> {
        check_status(&response)?;
        let entries: Vec<TaskEntry> = decode(&response.body)?;
        Ok(entries.into_iter().map(|t| self.task_from(t)).collect())
    }

    /// Recomputes `task.link` from its id and project id.
    pub fn relink(&self, mut task: Task) -> Task {
        task.link = self.links.task(&task.id, Some(&task.project_id));
        task
    }

    fn task_from(&self, entry: TaskEntry) -> Task {
        let project_id = entry.project_id.unwrap_or_default();
        Task {
            link: self.links.task(&entry.id, Some(&project_id)),
            id: entry.id,
            title: entry.title.unwrap_or_default(),
            content: entry.content.unwrap_or_default(),
            tags: entry.tags.unwrap_or_default(),
            project_id,
        }
    }

    fn get(&self, token: &str, path: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path,
            headers: auth_headers(token),
            body: None,
        }
    }

    fn post(&self, token: &str, endpoint: &str, body: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}{endpoint}", self.base_url),
            headers: auth_headers(token),
            body: Some(body),
        }
    }
}

impl Default for DidaApi {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, Links::default())
    }
}

fn auth_headers(token: &str) -> Vec<(String, String)> {
    vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("x-device".to_string(), X_DEVICE.to_string()),
        ("cookie".to_string(), format!("t={token}")),
    ]
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| DidaError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| DidaError::DeserializationError(e.to_string()))
}

/// Batch-add responses map each generated id to its etag; single-item
/// batches carry exactly one key.
fn first_generated_id(body: &str) -> Result<String> {
    let body: Id2EtagBody = decode(body)?;
    body.id2etag
        .and_then(|ids| ids.keys().next().cloned())
        .ok_or_else(|| DidaError::UnexpectedResponse("batch response has no generated id".into()))
}

/// Map non-success status codes to the appropriate `DidaError` variant.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 401 {
        return Err(DidaError::Unauthorized);
    }
    Err(DidaError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
