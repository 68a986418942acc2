//! Structured messages emitted while processing documents.
//!
//! The core never formats messages; it hands them to a [`Diagnostic`].
use std::{
    fmt::{self, Display, Formatter},
    sync::{Mutex, PoisonError},
};

use crate::reference::Reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    Debug,
    Progress,
    Note,
    Warning,
    Error,
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::Debug => "debug",
            MessageKind::Progress => "progress",
            MessageKind::Note => "note",
            MessageKind::Warning => "warning",
            MessageKind::Error => "error",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub title: String,
    pub details: String,
    /// The source spans the message is about, most specific first.
    pub references: Vec<Reference>,
}

impl Message {
    pub fn new(kind: MessageKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            details: String::new(),
            references: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_references(mut self, references: impl IntoIterator<Item = Reference>) -> Self {
        self.references.extend(references);
        self
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.title)?;
        if let Some(reference) = self.references.first() {
            write!(f, " ({}:{})", reference.document(), reference.line())?;
        }
        if !self.details.is_empty() {
            write!(f, "\n{}", self.details)?;
        }
        Ok(())
    }
}

/// An append-only sink shared by every compilation of a unit.
pub trait Diagnostic: Send + Sync {
    fn print(&self, message: Message);
}

/// Collects messages in memory.
#[derive(Debug, Default)]
pub struct DiagnosticBuffer {
    messages: Mutex<Vec<Message>>,
}

impl DiagnosticBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Diagnostic for DiagnosticBuffer {
    fn print(&self, message: Message) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

/// Forwards every message to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostic;

impl Diagnostic for TracingDiagnostic {
    fn print(&self, message: Message) {
        let location = message
            .references
            .first()
            .map(|reference| format!("{}:{}", reference.document(), reference.line()))
            .unwrap_or_default();

        match message.kind {
            MessageKind::Debug => {
                tracing::debug!(%location, details = %message.details, "{}", message.title)
            }
            MessageKind::Progress => {
                tracing::trace!(%location, details = %message.details, "{}", message.title)
            }
            MessageKind::Note => {
                tracing::info!(%location, details = %message.details, "{}", message.title)
            }
            MessageKind::Warning => {
                tracing::warn!(%location, details = %message.details, "{}", message.title)
            }
            MessageKind::Error => {
                tracing::error!(%location, details = %message.details, "{}", message.title)
            }
        }
    }
}
