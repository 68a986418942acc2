use miette::{Diagnostic, SourceOffset, SourceSpan};

use crate::{
    compile::CompileError, document::DocumentError, reference::Reference, runtime::ExecutionError,
    tree::TreeError,
};

#[derive(Debug, thiserror::Error)]
pub enum InnerError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Pattern(#[from] regex_lite::Error),
    #[error("Document `{0}` has not been initialized")]
    Uninitialized(String),
    #[error("Document `{0}` has not been compiled")]
    Uncompiled(String),
}

impl InnerError {
    /// The span of source the error is about, if any.
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            InnerError::Tree(error) => Some(error.reference()),
            InnerError::Compile(error) => error.reference(),
            InnerError::Execution(error) => error.reference(),
            InnerError::Document(_)
            | InnerError::Pattern(_)
            | InnerError::Uninitialized(_)
            | InnerError::Uncompiled(_) => None,
        }
    }
}

/// An error with enough context to be rendered against its source.
#[derive(Debug, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: InnerError,
    /// The text of the document the error points into.
    pub source_code: String,
    /// The location in the source code for diagnostics.
    pub location: SourceSpan,
}

impl Error {
    /// Locates `cause` in the document its reference points into, or at the
    /// start of `source_code` when it has no reference.
    pub fn from_error(source_code: impl Into<String>, cause: InnerError) -> Self {
        let (source_code, location) = match cause.reference() {
            Some(reference) => {
                let source_code = reference.document().read().to_string();
                let location = SourceSpan::new(
                    SourceOffset::from(reference.position() as usize),
                    std::cmp::max(reference.length() as usize, 1),
                );
                (source_code, location)
            }
            None => (source_code.into(), SourceSpan::new(SourceOffset::from(0), 1)),
        };

        Self {
            cause,
            source_code,
            location,
        }
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match &self.cause {
            InnerError::Document(_) => "DocumentError",
            InnerError::Tree(TreeError::Clash { .. }) => "TreeError::Clash",
            InnerError::Tree(TreeError::TakenPlace { .. }) => "TreeError::TakenPlace",
            InnerError::Tree(TreeError::OutOfBounds { .. }) => "TreeError::OutOfBounds",
            InnerError::Compile(CompileError::MissingComponent { .. }) => "CompileError::MissingComponent",
            InnerError::Compile(CompileError::OutsideFlow(_)) => "CompileError::OutsideFlow",
            InnerError::Compile(CompileError::Unrecognized(_)) => "CompileError::Unrecognized",
            InnerError::Compile(CompileError::Illegal { .. }) => "CompileError::Illegal",
            InnerError::Execution(ExecutionError::Illegal { .. }) => "ExecutionError::Illegal",
            InnerError::Execution(ExecutionError::UserDefined { .. }) => "ExecutionError::UserDefined",
            InnerError::Execution(ExecutionError::ZeroDivision(_)) => "ExecutionError::ZeroDivision",
            InnerError::Execution(ExecutionError::StackUnderflow(_)) => "ExecutionError::StackUnderflow",
            InnerError::Execution(ExecutionError::FrameUnderflow(_)) => "ExecutionError::FrameUnderflow",
            InnerError::Execution(ExecutionError::IterationLimit { .. }) => "ExecutionError::IterationLimit",
            InnerError::Pattern(_) => "PatternError",
            InnerError::Uninitialized(_) => "UnitError::Uninitialized",
            InnerError::Uncompiled(_) => "UnitError::Uncompiled",
        };

        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let help = match &self.cause {
            InnerError::Tree(TreeError::Clash { .. }) => {
                Some("Two constructs overlap. Check for an unbalanced bracket or an unterminated comment.")
            }
            InnerError::Compile(CompileError::OutsideFlow(_)) => {
                Some("Check that every `#if`, `#for`, `#while` and `#capture` has its matching end command.")
            }
            InnerError::Compile(CompileError::Unrecognized(_)) => {
                Some("Check the expression for a misplaced sign or an unbalanced bracket.")
            }
            InnerError::Compile(CompileError::MissingComponent { .. }) => {
                Some("The command is incomplete. Check its name and parameter.")
            }
            InnerError::Execution(ExecutionError::ZeroDivision(_)) => Some("Division by zero is not allowed."),
            InnerError::Execution(ExecutionError::IterationLimit { .. }) => {
                Some("Check the loop condition, or raise the iteration limit.")
            }
            InnerError::Execution(ExecutionError::UserDefined { .. }) => {
                Some("The document raised this error with `#error`.")
            }
            _ => None,
        };

        help.map(|help| Box::new(help) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(miette::LabeledSpan::new_with_span(
            Some(format!("{}", self.cause)),
            self.location,
        ))))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_code)
    }
}
