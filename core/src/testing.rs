//! In-memory fakes shared by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::editor::{Document, DocumentEditor, FrontmatterEditor, Notifier, Position, Prompter};
use crate::error::{DidaError, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::Titled;

/// Replays canned responses in order and records every request.
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<Result<HttpResponse>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<HttpResponse>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(DidaError::Transport("no scripted response left".into())))
    }
}

pub fn ok(body: &str) -> Result<HttpResponse> {
    status(200, body)
}

pub fn status(code: u16, body: &str) -> Result<HttpResponse> {
    Ok(HttpResponse {
        status: code,
        headers: Vec::new(),
        body: body.to_string(),
    })
}

pub fn transport_error(msg: &str) -> Result<HttpResponse> {
    Err(DidaError::Transport(msg.to_string()))
}

/// Line-based editor buffer with a single cursor and optional selection.
#[derive(Debug, Default)]
pub struct MemoryEditor {
    pub document: Option<Document>,
    pub lines: Vec<String>,
    pub cursor: Position,
    /// Selection start and end.
    pub selection: Option<(Position, Position)>,
}

impl MemoryEditor {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            document: Some(Document {
                name: "Weekly review".into(),
                url: "obsidian://open?vault=notes&file=Weekly%20review".into(),
            }),
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Byte offset of `pos` in `text()`, clamped to the end of its line.
    fn offset(&self, pos: Position) -> usize {
        let before: usize = self.lines[..pos.line].iter().map(|l| l.len() + 1).sum();
        let line = &self.lines[pos.line];
        before + line.char_indices().nth(pos.ch).map_or(line.len(), |(i, _)| i)
    }
}

impl DocumentEditor for MemoryEditor {
    fn active_document(&self) -> Option<Document> {
        self.document.clone()
    }

    fn selection(&self) -> String {
        match self.selection {
            Some((from, to)) => self.text()[self.offset(from)..self.offset(to)].to_string(),
            None => String::new(),
        }
    }

    fn selection_start(&self) -> Position {
        self.selection.map_or(self.cursor, |(from, _)| from)
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn line(&self, line: usize) -> String {
        self.lines.get(line).cloned().unwrap_or_default()
    }

    fn replace_range(&mut self, text: &str, from: Position, to: Position) {
        let whole = self.text();
        let replaced = format!("{}{text}{}", &whole[..self.offset(from)], &whole[self.offset(to)..]);
        self.lines = replaced.split('\n').map(str::to_string).collect();
    }
}

/// Picks the first suggestion for a fixed query and answers inputs with
/// a fixed string, recording what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    pub query: String,
    pub input: Option<String>,
    pub asked: Vec<(String, String)>,
}

impl Prompter for ScriptedPrompter {
    fn pick<T: Titled>(&mut self, suggest: &mut dyn FnMut(&str) -> Vec<T>) -> Result<T> {
        suggest(&self.query).into_iter().next().ok_or(DidaError::Cancelled)
    }

    fn input(&mut self, label: &str, default: &str) -> Result<String> {
        self.asked.push((label.to_string(), default.to_string()));
        Ok(self.input.clone().unwrap_or_else(|| default.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryFrontmatter {
    pub properties: Vec<(String, String, String)>,
}

impl FrontmatterEditor for MemoryFrontmatter {
    fn set_property(&mut self, document: &Document, key: &str, value: &str) -> Result<()> {
        self.properties
            .push((document.name.clone(), key.to_string(), value.to_string()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub notices: Vec<String>,
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }
}
