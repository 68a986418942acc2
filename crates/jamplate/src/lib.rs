//! `jamplate` is a text preprocessor. Documents are parsed into a forest of
//! trees over their text, analyzed into flows and operators, compiled into an
//! instruction tree and executed on a small stack machine.
//!
//! ## Examples
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use jamplate::{BufferConsole, Console, Document, Unit};
//!
//! let spec = Arc::new(jamplate::flavor::spec().unwrap());
//! let mut unit = Unit::new(spec);
//!
//! let document = Document::new("hello", "#declare name \"world\"\nHello #{name}#!");
//! let console = BufferConsole::new();
//! unit.process(&document, Box::new(console.clone())).unwrap();
//!
//! assert_eq!(console.read(), "Hello world!");
//! ```
//!
//! Every phase can also be run on its own:
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use jamplate::{Document, Unit, dump_instruction};
//!
//! let mut unit = Unit::new(Arc::new(jamplate::flavor::spec().unwrap()));
//! let document = Document::new("doc", "#{1 + 2}#");
//!
//! unit.initialize(&document);
//! unit.parse(&document).unwrap();
//! unit.analyze(&document).unwrap();
//! unit.compile(&document).unwrap();
//!
//! let compilation = unit.compilation(&document).unwrap();
//! let forest = compilation.forest();
//! assert_eq!(forest.children(forest.root()).count(), 1);
//! assert!(dump_instruction(compilation.instruction().unwrap()).contains("Print"));
//! ```
pub mod analyze;
mod arena;
pub mod compilation;
pub mod compile;
pub mod diagnostic;
pub mod document;
pub mod dominance;
mod error;
pub mod flavor;
pub mod instruction;
mod number;
pub mod parse;
pub mod reference;
pub mod runtime;
pub mod sketch;
pub mod tree;
mod unit;

pub use arena::{Arena, ArenaId};
pub use compilation::Compilation;
pub use diagnostic::{Diagnostic, DiagnosticBuffer, Message, MessageKind, TracingDiagnostic};
pub use document::{Document, DocumentError};
pub use dominance::Dominance;
pub use error::{Error, InnerError};
pub use instruction::{Instruction, Op, Optimization, dump_instruction};
pub use number::Number;
pub use reference::{Reference, Relation};
pub use runtime::{BufferConsole, Console, ExecutionError, Memory, Value, WriterConsole};
pub use sketch::Sketch;
pub use tree::{Forest, TreeError, TreeId};
pub use unit::{Hook, Options, Spec, Unit};

/// Parses, analyzes, compiles and runs `document` with the built-in flavor,
/// returning what it printed to its main console.
///
/// # Examples
///
/// ```rust
/// let output = jamplate::render(&jamplate::Document::new("doc", "#{2 * 21}#")).unwrap();
/// assert_eq!(output, "42");
/// ```
#[allow(clippy::result_large_err)]
pub fn render(document: &Document) -> Result<String, Error> {
    let spec = flavor::spec().map_err(|error| Error::from_error(document.read(), error.into()))?;
    let mut unit = Unit::new(std::sync::Arc::new(spec));
    let console = BufferConsole::new();
    unit.process(document, Box::new(console.clone()))?;
    Ok(console.read())
}
