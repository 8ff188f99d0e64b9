//! Client core for linking editor notes to dida365 tasks and projects.
//!
//! # Overview
//! `DidaApi` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network (host-does-IO pattern). `DidaClient` binds it
//! to a `Session` and a `Transport` and re-authenticates once when a request
//! fails. `LinkPlugin` implements the editor commands on top, talking to the
//! host only through the capability traits in `editor`.
//!
//! # Design
//! - `DidaApi` is stateless; the bearer token is an explicit argument.
//! - The session store and settings store are injected, never global.
//! - Links to the web app are derived from ids, never read from the server.

pub mod api;
pub mod client;
pub mod config;
pub mod editor;
pub mod error;
pub mod http;
pub mod link;
pub mod plugin;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use api::DidaApi;
pub use client::{sign_on, DidaClient};
pub use config::{ConfigStore, JsonFileStore, LinkOptions, MemoryConfigStore, Settings, SettingsSessionStore};
pub use editor::{Document, DocumentEditor, EditorText, FrontmatterEditor, Notifier, Position, Prompter};
pub use error::{DidaError, ErrorKind, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use link::{is_blank, Links};
pub use plugin::{Command, Host, LinkPlugin};
pub use session::{Ephemeral, Session, SessionStore};
pub use transport::UreqTransport;
pub use types::{Credentials, NewProject, NewTask, Project, Task, Titled};
