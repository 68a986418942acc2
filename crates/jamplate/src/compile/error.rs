use smol_str::SmolStr;
use thiserror::Error;

use crate::{
    reference::Reference,
    tree::{Forest, TreeId},
};

/// A tree was recognized by a compiler but cannot be compiled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("`{kind}` is missing its `{component}`")]
    MissingComponent {
        reference: Reference,
        kind: SmolStr,
        component: SmolStr,
    },
    #[error("`{}` is outside of a matching flow", .0.text().trim())]
    OutsideFlow(Reference),
    #[error("Unrecognized `{}`", .0.text().trim())]
    Unrecognized(Reference),
    #[error("{message}")]
    Illegal { reference: Reference, message: String },
}

impl CompileError {
    pub fn missing(forest: &Forest, tree: TreeId, component: &str) -> Self {
        CompileError::MissingComponent {
            reference: forest.reference(tree).clone(),
            kind: forest.kind(tree).into(),
            component: component.into(),
        }
    }

    pub fn unrecognized(forest: &Forest, tree: TreeId) -> Self {
        CompileError::Unrecognized(forest.reference(tree).clone())
    }

    #[cold]
    pub fn reference(&self) -> Option<&Reference> {
        match self {
            CompileError::MissingComponent { reference, .. } => Some(reference),
            CompileError::OutsideFlow(reference) => Some(reference),
            CompileError::Unrecognized(reference) => Some(reference),
            CompileError::Illegal { reference, .. } => Some(reference),
        }
    }
}
