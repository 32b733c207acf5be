use thiserror::Error;

use crate::VariableId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Variable handle {0:?} does not resolve to a registered variable")]
    UnresolvedVariable(VariableId),
    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),
}
