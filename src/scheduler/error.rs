use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::expr::ExprError;
use crate::graph::EntityPath;

/// Category of a per-path evaluation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalErrorKind {
    Parse,
    Reference,
    Runtime,
    Cycle,
    Validation,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvalErrorKind::Parse => "parse",
            EvalErrorKind::Reference => "reference",
            EvalErrorKind::Runtime => "runtime",
            EvalErrorKind::Cycle => "cycle",
            EvalErrorKind::Validation => "validation",
        };
        f.write_str(name)
    }
}

/// An error scoped to a single entity path.
///
/// It is recorded in the evaluated tree; it never aborts the pass.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{kind} error at {path}: {message}")]
pub struct EvalError {
    pub path: EntityPath,
    pub kind: EvalErrorKind,
    pub message: String,
}

impl EvalError {
    pub fn new(path: EntityPath, kind: EvalErrorKind, message: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            message: message.into(),
        }
    }

    pub fn from_expr(path: EntityPath, err: &ExprError) -> Self {
        let (kind, message) = match err {
            ExprError::Parse { message, column } => {
                (EvalErrorKind::Parse, format!("{} (column {})", message, column))
            }
            ExprError::Reference(message) => (EvalErrorKind::Reference, message.clone()),
            ExprError::Runtime(message) => (EvalErrorKind::Runtime, message.clone()),
        };
        Self::new(path, kind, message)
    }

    pub fn cycle(path: EntityPath, members: &[EntityPath]) -> Self {
        let chain = members.iter().map(ToString::to_string).collect::<Vec<_>>().join(" -> ");
        Self::new(path, EvalErrorKind::Cycle, format!("cyclic dependency: {}", chain))
    }
}
