use thiserror::Error;

use crate::reference::Reference;

type Origin = Option<Reference>;

/// A failure while executing an instruction. It aborts the whole run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("{message}")]
    Illegal { reference: Origin, message: String },
    #[error("{message}")]
    UserDefined { reference: Origin, message: String },
    #[error("Divided by 0")]
    ZeroDivision(Origin),
    #[error("The operand stack is empty")]
    StackUnderflow(Origin),
    #[error("The root frame cannot be popped")]
    FrameUnderflow(Origin),
    #[error("Loop exceeded the limit of {limit} iterations")]
    IterationLimit { reference: Origin, limit: u64 },
}

impl ExecutionError {
    pub fn illegal(reference: &Origin, message: impl Into<String>) -> Self {
        ExecutionError::Illegal {
            reference: reference.clone(),
            message: message.into(),
        }
    }

    #[cold]
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            ExecutionError::Illegal { reference, .. } => reference.as_ref(),
            ExecutionError::UserDefined { reference, .. } => reference.as_ref(),
            ExecutionError::ZeroDivision(reference) => reference.as_ref(),
            ExecutionError::StackUnderflow(reference) => reference.as_ref(),
            ExecutionError::FrameUnderflow(reference) => reference.as_ref(),
            ExecutionError::IterationLimit { reference, .. } => reference.as_ref(),
        }
    }
}
