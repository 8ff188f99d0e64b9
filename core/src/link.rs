//! Web UI link derivation and small string helpers.
//!
//! Links are client-side templates over the service's web app; they are
//! computed from ids on demand and never read from a server response.

/// Path segment the web app uses for the inbox instead of its real id.
pub const INBOX_SEGMENT: &str = "inbox";

pub const DEFAULT_WEB_BASE: &str = "https://dida365.com/webapp";

/// True for `None`, the empty string, and strings made only of whitespace.
///
/// Whitespace follows Unicode `White_Space`, so `"\u{3000}"` is blank. The
/// byte-order mark U+FEFF counts as whitespace too.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.chars().all(|c| c.is_whitespace() || c == '\u{feff}'))
}

/// Case-insensitive substring match used to filter prompt suggestions.
pub fn contains_ignore_case(text: &str, query: &str) -> bool {
    text.to_lowercase().contains(&query.to_lowercase())
}

/// Markdown inline link `[label](url)`.
pub fn markdown_link(label: &str, url: &str) -> String {
    format!("[{label}]({url})")
}

/// Builds web app links for projects and tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    web_base: String,
}

impl Links {
    pub fn new(web_base: &str) -> Self {
        Self {
            web_base: web_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn project(&self, project_id: &str) -> String {
        format!("{}/#p/{project_id}/tasks", self.web_base)
    }

    pub fn inbox_project(&self) -> String {
        self.project(INBOX_SEGMENT)
    }

    /// Link to a task; a blank or missing project id addresses the inbox.
    pub fn task(&self, task_id: &str, project_id: Option<&str>) -> String {
        let segment = match project_id {
            Some(id) if !is_blank(Some(id)) => id,
            _ => INBOX_SEGMENT,
        };
        format!("{}/#p/{segment}/tasks/{task_id}", self.web_base)
    }
}

impl Default for Links {
    fn default() -> Self {
        Self::new(DEFAULT_WEB_BASE)
    }
}
