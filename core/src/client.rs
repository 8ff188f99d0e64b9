//! Session-bound dida365 client with transparent re-authentication.
//!
//! # Design
//! `DidaClient` pairs the stateless `DidaApi` with a `Transport`, the
//! current `Session`, and the `SessionStore` that persists it. Every
//! authenticated operation goes through `call`, which attempts the request
//! once and, when the failure is auth- or network-class, signs on again
//! (persisting the new token) and attempts the rebuilt request exactly once
//! more. The second failure propagates unchanged. Response-shape failures
//! are not retried because a fresh token cannot fix them.

use tracing::{debug, info, warn};

use crate::api::DidaApi;
use crate::error::{ErrorKind, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::link::is_blank;
use crate::session::{Session, SessionStore};
use crate::types::{Credentials, NewProject, NewTask, Project, Task};

/// Signs on with `credentials` and returns the bearer token.
///
/// Used standalone to verify credentials and by `DidaClient` to
/// (re)authenticate.
pub fn sign_on<T: Transport>(api: &DidaApi, transport: &T, credentials: &Credentials) -> Result<String> {
    let request = api.build_sign_on(credentials)?;
    let response = transport.execute(&request)?;
    api.parse_sign_on(response)
}

pub struct DidaClient<T, S> {
    api: DidaApi,
    transport: T,
    session: Session,
    store: S,
    relogins: u32,
}

impl<T: Transport, S: SessionStore> DidaClient<T, S> {
    /// Builds a client, signing on first if the session carries no token.
    /// Fails if that sign-on fails.
    pub fn connect(api: DidaApi, session: Session, transport: T, store: S) -> Result<Self> {
        let mut client = Self {
            api,
            transport,
            session,
            store,
            relogins: 0,
        };
        if !client.session.has_token() {
            client.sign_on()?;
        }
        Ok(client)
    }

    pub fn api(&self) -> &DidaApi {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// How many times a failed request triggered a fresh sign-on.
    pub fn relogins(&self) -> u32 {
        self.relogins
    }

    /// Signs on with the session's credentials, replaces the token and
    /// persists the session before returning.
    pub fn sign_on(&mut self) -> Result<()> {
        let token = sign_on(&self.api, &self.transport, &self.session.credentials())?;
        self.session.token = token;
        self.store.save(&self.session)?;
        info!(username = %self.session.username, "signed on");
        Ok(())
    }

    pub fn create_project(&mut self, input: &NewProject) -> Result<Project> {
        self.call(
            |api, token| api.build_create_project(token, input),
            |api, response| api.parse_create_project(response, input),
        )
    }

    pub fn inbox_project(&mut self) -> Result<Project> {
        self.call(
            |api, token| Ok(api.build_inbox_project(token)),
            |api, response| api.parse_inbox_project(response),
        )
    }

    pub fn list_projects(&mut self) -> Result<Vec<Project>> {
        self.call(
            |api, token| Ok(api.build_list_projects(token)),
            |api, response| api.parse_list_projects(response),
        )
    }

    /// Creates a task. Without a project id the service files it in the
    /// inbox; the returned task then carries the inbox id, looked up after
    /// creation. If that lookup fails the task comes back with an empty
    /// project id and an `inbox` link.
    pub fn create_task(&mut self, input: &NewTask) -> Result<Task> {
        let input = NewTask {
            project_id: input.project_id.clone().filter(|id| !is_blank(Some(id))),
            ..input.clone()
        };
        let task = self.call(
            |api, token| api.build_create_task(token, &input),
            |api, response| api.parse_create_task(response, &input),
        )?;
        if input.project_id.is_some() {
            return Ok(task);
        }

        // The task already exists; a failed lookup only loses the project id.
        match self.inbox_project() {
            Ok(inbox) => {
                debug!(task = %task.id, inbox = %inbox.id, "resolved inbox for new task");
                Ok(self.api.relink(Task {
                    project_id: inbox.id,
                    ..task
                }))
            }
            Err(err) => {
                warn!(task = %task.id, error = %err, "inbox lookup failed, keeping inbox link");
                Ok(task)
            }
        }
    }

    pub fn update_task(&mut self, task: &Task) -> Result<Task> {
        self.call(
            |api, token| api.build_update_task(token, task),
            |api, response| api.parse_update_task(response, task.clone()),
        )
    }

    pub fn list_tasks(&mut self) -> Result<Vec<Task>> {
        self.call(
            |api, token| Ok(api.build_list_tasks(token)),
            |api, response| api.parse_list_tasks(response),
        )
    }

    pub fn search_tasks(&mut self, keyword: &str) -> Result<Vec<Task>> {
        self.call(
            |api, token| api.build_search_tasks(token, keyword),
            |api, response| api.parse_search_tasks(response),
        )
    }

    fn call<R, B, P>(&mut self, build: B, parse: P) -> Result<R>
    where
        B: Fn(&DidaApi, &str) -> Result<HttpRequest>,
        P: Fn(&DidaApi, HttpResponse) -> Result<R>,
    {
        match self.attempt(&build, &parse) {
            Err(err) if err.triggers_relogin() => {
                let reason = match err.kind() {
                    ErrorKind::Auth => "unauthorized",
                    _ => "network",
                };
                warn!(reason, error = %err, "request failed, signing on again and retrying once");
                self.relogins += 1;
                self.sign_on()?;
                self.attempt(&build, &parse)
            }
            result => result,
        }
    }

    fn attempt<R, B, P>(&self, build: &B, parse: &P) -> Result<R>
    where
        B: Fn(&DidaApi, &str) -> Result<HttpRequest>,
        P: Fn(&DidaApi, HttpResponse) -> Result<R>,
    {
        let request = build(&self.api, &self.session.token)?;
        debug!(method = ?request.method, url = %request.path, "sending request");
        let response = self.transport.execute(&request)?;
        parse(&self.api, response)
    }
}
