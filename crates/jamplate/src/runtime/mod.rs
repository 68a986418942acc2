//! The stack machine state that instructions execute against.
pub mod console;
pub mod error;
pub mod json;
pub mod memory;
pub mod value;

use std::sync::Arc;

use crate::diagnostic::{Diagnostic, Message};

pub use console::{BufferConsole, Console, WriterConsole};
pub use error::ExecutionError;
pub use memory::{Frame, Memory};
pub use value::{Evaluator, Value};

/// What an execution may reach outside of its memory.
#[derive(Clone)]
pub struct Environment {
    diagnostic: Arc<dyn Diagnostic>,
}

impl Environment {
    pub fn new(diagnostic: Arc<dyn Diagnostic>) -> Self {
        Self { diagnostic }
    }

    pub fn report(&self, message: Message) {
        self.diagnostic.print(message);
    }

    pub fn diagnostic(&self) -> &Arc<dyn Diagnostic> {
        &self.diagnostic
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}
