//! The editor-facing commands: create or link a dida365 project/task from
//! the current note and write the link back into it.
//!
//! # Design
//! `LinkPlugin` owns the settings, the `ConfigStore` they live in and the
//! `Transport`. Each command opens a `DidaClient` whose session store writes
//! refreshed tokens straight back into the settings, so a relogin during one
//! command is kept for the next. Everything the host UI provides comes in
//! through `Host`.

use tracing::{info, warn};

use crate::client::{sign_on, DidaClient};
use crate::config::{ConfigStore, LinkOptions, Settings, SettingsSessionStore};
use crate::editor::{Document, DocumentEditor, EditorText, FrontmatterEditor, Notifier, Prompter};
use crate::error::{DidaError, ErrorKind, Result};
use crate::http::Transport;
use crate::link::{contains_ignore_case, markdown_link};
use crate::types::{NewProject, NewTask, Project, Task};

/// Tag added to every task created or linked from a note.
pub const BACKLINK_TAG: &str = "Obsidian";
/// Label of the back-link written into task content.
pub const BACKLINK_LABEL: &str = "Obsidian";
/// Label of the task link inserted at the cursor.
pub const TASK_LINK_LABEL: &str = "dida-task";
pub const TASK_PROPERTY: &str = "dida-task";
pub const PROJECT_PROPERTY: &str = "dida-project";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    CreateProject,
    CreateTask,
    LinkProject,
    LinkTask,
}

impl Command {
    pub const ALL: [Command; 4] = [
        Command::CreateProject,
        Command::CreateTask,
        Command::LinkProject,
        Command::LinkTask,
    ];

    /// Stable id the host registers the command under.
    pub fn id(self) -> &'static str {
        match self {
            Command::CreateProject => "dida365-create-project",
            Command::CreateTask => "dida365-create-task",
            Command::LinkProject => "dida365-link-project",
            Command::LinkTask => "dida365-link-task",
        }
    }

    /// Display name in the command palette.
    pub fn name(self) -> &'static str {
        match self {
            Command::CreateProject => "Create project",
            Command::CreateTask => "Create task",
            Command::LinkProject => "Link project",
            Command::LinkTask => "Link task",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}

/// Editor capabilities a command runs against.
pub struct Host<'a, E, P> {
    pub editor: &'a mut E,
    pub prompter: &'a mut P,
    /// `None` when the companion frontmatter plugin is not installed.
    pub frontmatter: Option<&'a mut dyn FrontmatterEditor>,
}

pub struct LinkPlugin<C, T> {
    settings: Settings,
    config: C,
    transport: T,
}

impl<C: ConfigStore, T: Transport> LinkPlugin<C, T> {
    pub fn load(config: C, transport: T) -> Result<Self> {
        let settings = config.load()?;
        Ok(Self {
            settings,
            config,
            transport,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// Applies `edit` and saves the result, as the settings panel does on
    /// every change.
    pub fn update_settings(&mut self, edit: impl FnOnce(&mut Settings)) -> Result<()> {
        edit(&mut self.settings);
        self.config.save(&self.settings)
    }

    /// Signs on with the configured credentials without touching the stored
    /// token.
    pub fn verify_credentials(&self) -> Result<()> {
        sign_on(&self.settings.api(), &self.transport, &self.settings.session().credentials())?;
        Ok(())
    }

    /// Runs `command` and reports the outcome through `notifier`.
    pub fn run<E, P, N>(&mut self, command: Command, host: &mut Host<'_, E, P>, notifier: &mut N) -> Result<()>
    where
        E: DocumentEditor,
        P: Prompter,
        N: Notifier,
    {
        let outcome = match command {
            Command::CreateProject => self
                .create_project(host)
                .map(|p| format!("Project \"{}\" created", p.title)),
            Command::CreateTask => self
                .create_task(host)
                .map(|t| format!("Task \"{}\" created", t.title)),
            Command::LinkProject => self
                .link_project(host)
                .map(|p| format!("Project \"{}\" linked", p.title)),
            Command::LinkTask => self
                .link_task(host)
                .map(|t| format!("Task \"{}\" linked", t.title)),
        };

        match outcome {
            Ok(notice) => {
                info!(command = command.id(), "command finished");
                notifier.notify(&notice);
                Ok(())
            }
            Err(DidaError::Cancelled) => Ok(()),
            Err(err) => {
                warn!(command = command.id(), error = %err, "command failed");
                let notice = match err.kind() {
                    ErrorKind::Precondition => err.to_string(),
                    _ => format!("{} failed: {err}", command.name()),
                };
                notifier.notify(&notice);
                Err(err)
            }
        }
    }

    /// Creates a project named after the note (or a prompted title).
    pub fn create_project<E: DocumentEditor, P: Prompter>(&mut self, host: &mut Host<'_, E, P>) -> Result<Project> {
        let options = self.settings.options;
        let document = active_document(&*host.editor)?;
        let title = resolve_title(options, &mut *host.prompter, "Project Title", document.name.clone())?;

        let project = self.connect()?.create_project(&NewProject { title })?;

        if options.enable_dida_task_link {
            place_project_link(options, host, &document, &project.link)?;
        }
        Ok(project)
    }

    /// Creates an inbox task titled from the selection, the current line or
    /// the note name, with a back-link to the note in its content.
    pub fn create_task<E: DocumentEditor, P: Prompter>(&mut self, host: &mut Host<'_, E, P>) -> Result<Task> {
        let options = self.settings.options;
        let document = active_document(&*host.editor)?;
        let selection = EditorText::selection(&*host.editor);
        let line = EditorText::current_line(&*host.editor).strip_prefix_symbols();

        let default_title = if !selection.is_empty() {
            selection.text.clone()
        } else if !line.is_empty() {
            line.text.clone()
        } else {
            document.name.clone()
        };
        let title = resolve_title(options, &mut *host.prompter, "Task Title", default_title)?;

        let task = self.connect()?.create_task(&NewTask {
            title,
            tags: vec![BACKLINK_TAG.to_string()],
            content: Some(markdown_link(BACKLINK_LABEL, &document.url)),
            project_id: None,
        })?;

        if options.enable_dida_task_link {
            place_task_link(options, host, &document, &selection, &line, &task.link)?;
        }
        Ok(task)
    }

    /// Lets the user pick an existing project and links the note to it.
    pub fn link_project<E: DocumentEditor, P: Prompter>(&mut self, host: &mut Host<'_, E, P>) -> Result<Project> {
        let options = self.settings.options;
        let document = active_document(&*host.editor)?;

        let projects = self.connect()?.list_projects()?;
        let project = host.prompter.pick::<Project>(&mut |query: &str| {
            projects
                .iter()
                .filter(|p| contains_ignore_case(&p.title, query))
                .cloned()
                .collect()
        })?;

        if options.enable_dida_task_link {
            place_project_link(options, host, &document, &project.link)?;
        }
        Ok(project)
    }

    /// Lets the user pick an existing task, tags it and adds a back-link to
    /// the note, then links the note to it.
    pub fn link_task<E: DocumentEditor, P: Prompter>(&mut self, host: &mut Host<'_, E, P>) -> Result<Task> {
        let options = self.settings.options;
        let document = active_document(&*host.editor)?;
        let selection = EditorText::selection(&*host.editor);
        let line = EditorText::current_line(&*host.editor).strip_prefix_symbols();

        let mut client = self.connect()?;
        let tasks = client.list_tasks()?;
        let mut task = host.prompter.pick::<Task>(&mut |query: &str| {
            tasks
                .iter()
                .filter(|t| contains_ignore_case(&t.title, query))
                .cloned()
                .collect()
        })?;

        task.add_tag(BACKLINK_TAG);
        task.prepend_content(&markdown_link(BACKLINK_LABEL, &document.url));
        let task = client.update_task(&task)?;
        drop(client);

        if options.enable_dida_task_link {
            place_task_link(options, host, &document, &selection, &line, &task.link)?;
        }
        Ok(task)
    }

    fn connect(&mut self) -> Result<DidaClient<&T, SettingsSessionStore<'_, C>>> {
        let api = self.settings.api();
        let session = self.settings.session();
        let store = SettingsSessionStore::new(&mut self.settings, &mut self.config);
        DidaClient::connect(api, session, &self.transport, store)
    }
}

fn active_document<E: DocumentEditor + ?Sized>(editor: &E) -> Result<Document> {
    editor
        .active_document()
        .ok_or_else(|| DidaError::precondition("Please select a file first"))
}

fn resolve_title<P: Prompter>(options: LinkOptions, prompter: &mut P, label: &str, default: String) -> Result<String> {
    if options.enable_input_prompt {
        prompter.input(label, &default)
    } else {
        Ok(default)
    }
}

fn frontmatter<'h, 'a, E, P>(host: &'h mut Host<'a, E, P>) -> Result<&'h mut (dyn FrontmatterEditor + 'a)> {
    match host.frontmatter.as_deref_mut() {
        Some(editor) => Ok(editor),
        None => Err(DidaError::precondition(
            "A frontmatter editor plugin (MetaEdit) is required for this feature",
        )),
    }
}

fn place_project_link<E, P>(options: LinkOptions, host: &mut Host<'_, E, P>, document: &Document, link: &str) -> Result<()> {
    if options.enable_frontmatter_to_dida_project_link {
        frontmatter(host)?.set_property(document, PROJECT_PROPERTY, link)?;
    }
    Ok(())
}

/// Writes the task link into the note: the selection, else the current
/// line, else the frontmatter, else a labelled link at the cursor.
fn place_task_link<E: DocumentEditor, P>(
    options: LinkOptions,
    host: &mut Host<'_, E, P>,
    document: &Document,
    selection: &EditorText,
    line: &EditorText,
    link: &str,
) -> Result<()> {
    if options.enable_selection_to_dida_task_link && !selection.is_empty() {
        selection.add_link(&mut *host.editor, link);
    } else if options.enable_line_to_dida_task_link && !line.is_empty() {
        line.add_link(&mut *host.editor, link);
    } else if options.enable_frontmatter_to_dida_task_link {
        frontmatter(host)?.set_property(document, TASK_PROPERTY, link)?;
    } else {
        host.editor.insert_at_cursor(&markdown_link(TASK_LINK_LABEL, link));
    }
    Ok(())
}
