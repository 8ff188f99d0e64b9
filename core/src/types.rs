//! Domain records returned by the client and accepted as operation inputs.
//!
//! # Design
//! These are plain records, independent of the JSON the service speaks. The
//! per-endpoint wire schemas live privately in `api`, which maps them onto
//! these types and fills in the derived `link`.

use serde::{Deserialize, Serialize};

/// Username/password pair posted to the sign-on endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub title: String,
    /// Free text; may embed a back-link to the note.
    pub content: String,
    /// Insertion order is kept for display.
    pub tags: Vec<String>,
    /// Empty when the server did not report an owning project.
    pub project_id: String,
    pub link: String,
}

impl Task {
    /// Appends `tag` unless it is already present.
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    /// Puts `line` in front of the existing content.
    pub fn prepend_content(&mut self, line: &str) {
        self.content = if self.content.is_empty() {
            line.to_string()
        } else {
            format!("{line}\n{}", self.content)
        };
    }
}

/// Input for `DidaClient::create_project`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
}

/// Input for `DidaClient::create_task`. Omitting `project_id` files the task
/// in the inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub tags: Vec<String>,
    pub content: Option<String>,
    pub project_id: Option<String>,
}

/// Anything a prompt can list by title.
pub trait Titled {
    fn title(&self) -> &str;
}

impl Titled for Project {
    fn title(&self) -> &str {
        &self.title
    }
}

impl Titled for Task {
    fn title(&self) -> &str {
        &self.title
    }
}
