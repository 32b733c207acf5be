mod error;
mod model;
mod variable;

pub use error::ModelError;
pub use model::{Constraint, Expression, LinTerm, Model, ObjectiveSense, QuadTerm};
pub use variable::{Variable, VariableId, VariableType};
