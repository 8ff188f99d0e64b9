//! Capabilities the host editor provides, and text spans read from it.
//!
//! # Design
//! The library never talks to a UI toolkit. The host implements
//! `DocumentEditor`, `Prompter`, `FrontmatterEditor` and `Notifier`; the
//! plugin commands are written against these traits only.
//!
//! Positions are zero-based lines and character offsets within the line.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::link::{is_blank, markdown_link};
use crate::types::Titled;

/// Leading whitespace plus at most one heading, task-list or bullet marker.
static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:#{1,6}\s|[-*+]\s\[[ xX]\]\s|[-*+]\s)?").unwrap()
});

static INTERNAL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());

static EXTERNAL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]\([^)]+\)").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

/// Identity of the note being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name without extension.
    pub name: String,
    /// Shareable URL that opens the note in the editor.
    pub url: String,
}

pub trait DocumentEditor {
    /// The focused document, if any.
    fn active_document(&self) -> Option<Document>;

    /// Selected text; empty when nothing is selected.
    fn selection(&self) -> String;

    fn selection_start(&self) -> Position;

    fn cursor(&self) -> Position;

    fn line(&self, line: usize) -> String;

    fn replace_range(&mut self, text: &str, from: Position, to: Position);

    fn insert_at_cursor(&mut self, text: &str) {
        let cursor = self.cursor();
        self.replace_range(text, cursor, cursor);
    }
}

/// Modal prompts.
pub trait Prompter {
    /// Lets the user choose one item from the suggestions `suggest` returns
    /// for the typed query. Dismissing the prompt yields `DidaError::Cancelled`.
    fn pick<T: Titled>(&mut self, suggest: &mut dyn FnMut(&str) -> Vec<T>) -> Result<T>;

    /// Asks for a string, pre-filled with `default`.
    fn input(&mut self, label: &str, default: &str) -> Result<String>;
}

/// Edits a document's leading metadata block. Provided by a companion
/// plugin; hosts without one pass `None` where it is asked for.
pub trait FrontmatterEditor {
    /// Adds `key`, or overwrites it if present.
    fn set_property(&mut self, document: &Document, key: &str, value: &str) -> Result<()>;
}

/// Transient user-visible notices.
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// A run of editor text, remembered together with where it starts. A
/// selection may span several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorText {
    pub text: String,
    pub position: Position,
}

impl EditorText {
    pub fn new(text: impl Into<String>, position: Position) -> Self {
        Self {
            text: text.into(),
            position,
        }
    }

    /// The current selection.
    pub fn selection<E: DocumentEditor + ?Sized>(editor: &E) -> Self {
        Self::new(editor.selection(), editor.selection_start())
    }

    /// The whole line under the cursor.
    pub fn current_line<E: DocumentEditor + ?Sized>(editor: &E) -> Self {
        let cursor = editor.cursor();
        Self::new(editor.line(cursor.line), Position::new(cursor.line, 0))
    }

    /// Drops leading whitespace and one Markdown heading (`#`..`######`),
    /// task (`- [ ]`, `- [x]`) or bullet (`-`, `*`, `+`) marker, moving the
    /// position past what was removed.
    pub fn strip_prefix_symbols(&self) -> Self {
        let prefix = PREFIX_RE.find(&self.text).map_or(0, |m| m.end());
        let removed = self.text[..prefix].chars().count();
        Self::new(
            &self.text[prefix..],
            Position::new(self.position.line, self.position.ch + removed),
        )
    }

    pub fn is_empty(&self) -> bool {
        is_blank(Some(&self.text))
    }

    pub fn contains_link(&self) -> bool {
        self.contains_internal_link() || self.contains_external_link()
    }

    pub fn contains_internal_link(&self) -> bool {
        INTERNAL_LINK_RE.is_match(&self.text)
    }

    pub fn contains_external_link(&self) -> bool {
        EXTERNAL_LINK_RE.is_match(&self.text)
    }

    /// Replaces the span in `editor` with `[text](link)`.
    pub fn add_link<E: DocumentEditor + ?Sized>(&self, editor: &mut E, link: &str) -> Self {
        let replacement = markdown_link(&self.text, link);
        editor.replace_range(&replacement, self.position, self.end());
        Self::new(replacement, self.position)
    }

    /// Position just past the last character, following embedded newlines.
    pub fn end(&self) -> Position {
        match self.text.rsplit_once('\n') {
            Some((head, tail)) => Position::new(
                self.position.line + head.matches('\n').count() + 1,
                tail.chars().count(),
            ),
            None => Position::new(self.position.line, self.position.ch + self.text.chars().count()),
        }
    }
}
