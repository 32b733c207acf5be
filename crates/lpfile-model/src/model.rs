use std::collections::HashMap;
use std::fmt;

use crate::{ModelError, Variable, VariableId, VariableType};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinTerm {
    pub coef: f64,
    pub var: VariableId,
}

/// `coef * var1 * var2`; `var1 == var2` is a squared term.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadTerm {
    pub coef: f64,
    pub var1: VariableId,
    pub var2: VariableId,
}

impl QuadTerm {
    pub fn is_square(&self) -> bool {
        self.var1 == self.var2
    }

    fn same_pair(&self, var1: VariableId, var2: VariableId) -> bool {
        (self.var1 == var1 && self.var2 == var2) || (self.var1 == var2 && self.var2 == var1)
    }
}

/// Linear and quadratic terms plus a constant offset, in insertion order.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Default)]
pub struct Expression {
    pub name: Option<String>,
    pub lin_terms: Vec<LinTerm>,
    pub quad_terms: Vec<QuadTerm>,
    pub offset: f64,
    /// Position in `lin_terms` by variable
    #[cfg_attr(feature = "serde", serde(skip))]
    lin_index: HashMap<VariableId, usize>,
    /// Position in `quad_terms` by unordered variable pair
    #[cfg_attr(feature = "serde", serde(skip))]
    quad_index: HashMap<(VariableId, VariableId), usize>,
}

fn pair_key(var1: VariableId, var2: VariableId) -> (VariableId, VariableId) {
    (var1.min(var2), var1.max(var2))
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Add `coef * var`. A variable already present has its coefficient
    /// increased in place, so each variable owns at most one linear term.
    pub fn add_linear(&mut self, var: VariableId, coef: f64) {
        match self.lin_slot(var) {
            Some(slot) => self.lin_terms[slot].coef += coef,
            None => {
                self.lin_index.insert(var, self.lin_terms.len());
                self.lin_terms.push(LinTerm { coef, var });
            }
        }
    }

    /// Add `coef * var1 * var2`, merging with an existing term over the same
    /// unordered pair.
    pub fn add_quadratic(&mut self, var1: VariableId, var2: VariableId, coef: f64) {
        match self.quad_slot(var1, var2) {
            Some(slot) => self.quad_terms[slot].coef += coef,
            None => {
                self.quad_index
                    .insert(pair_key(var1, var2), self.quad_terms.len());
                self.quad_terms.push(QuadTerm { coef, var1, var2 });
            }
        }
    }

    /// The index is rebuilt whenever it disagrees with `lin_terms`, which
    /// happens after deserializing or editing the public fields directly.
    fn lin_slot(&mut self, var: VariableId) -> Option<usize> {
        let fresh = |index: &HashMap<VariableId, usize>, terms: &[LinTerm]| {
            index.len() == terms.len()
                && index.get(&var).is_none_or(|&slot| terms.get(slot).is_some_and(|t| t.var == var))
        };
        if !fresh(&self.lin_index, &self.lin_terms) {
            self.lin_index = self
                .lin_terms
                .iter()
                .enumerate()
                .map(|(slot, t)| (t.var, slot))
                .collect();
        }
        self.lin_index.get(&var).copied()
    }

    fn quad_slot(&mut self, var1: VariableId, var2: VariableId) -> Option<usize> {
        let key = pair_key(var1, var2);
        let fresh = |index: &HashMap<(VariableId, VariableId), usize>, terms: &[QuadTerm]| {
            index.len() == terms.len()
                && index
                    .get(&key)
                    .is_none_or(|&slot| terms.get(slot).is_some_and(|t| t.same_pair(var1, var2)))
        };
        if !fresh(&self.quad_index, &self.quad_terms) {
            self.quad_index = self
                .quad_terms
                .iter()
                .enumerate()
                .map(|(slot, t)| (pair_key(t.var1, t.var2), slot))
                .collect();
        }
        self.quad_index.get(&key).copied()
    }

    pub fn has_terms(&self) -> bool {
        !self.lin_terms.is_empty() || !self.quad_terms.is_empty()
    }

    /// Every variable handle referenced by the expression, duplicates included.
    pub fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.lin_terms
            .iter()
            .map(|t| t.var)
            .chain(self.quad_terms.iter().flat_map(|t| [t.var1, t.var2]))
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.lin_terms == other.lin_terms
            && self.quad_terms == other.quad_terms
            && self.offset == other.offset
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("name", &self.name)
            .field("lin_terms", &self.lin_terms)
            .field("quad_terms", &self.quad_terms)
            .field("offset", &self.offset)
            .finish()
    }
}

/// `lower_bound <= expr <= upper_bound`; equality has both bounds equal.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub expr: Expression,
}

impl Constraint {
    /// A constraint with no finite bound yet.
    pub fn new(expr: Expression) -> Self {
        Self {
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
            expr,
        }
    }

    pub fn with_bounds(expr: Expression, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            lower_bound,
            upper_bound,
            expr,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.expr.name.as_deref()
    }

    pub fn is_equality(&self) -> bool {
        self.lower_bound == self.upper_bound
    }

    /// Both bounds finite and distinct.
    pub fn is_range(&self) -> bool {
        self.lower_bound.is_finite() && self.upper_bound.is_finite() && !self.is_equality()
    }
}

/// An optimization model together with the registry of its variables.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    pub sense: ObjectiveSense,
    pub objective: Expression,
    pub constraints: Vec<Constraint>,
    variables: Vec<Variable>,
    index: HashMap<String, VariableId>,
}

impl Model {
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            sense,
            ..Self::default()
        }
    }

    /// Handle of the variable called `name`, registering it with default
    /// attributes on first reference.
    pub fn variable_id(&mut self, name: &str) -> VariableId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        self.push_variable(Variable::new(name))
    }

    /// Register a fully specified variable.
    pub fn add_variable(&mut self, variable: Variable) -> Result<VariableId, ModelError> {
        if self.index.contains_key(&variable.name) {
            return Err(ModelError::DuplicateVariable(variable.name));
        }
        Ok(self.push_variable(variable))
    }

    fn push_variable(&mut self, variable: Variable) -> VariableId {
        let id = VariableId::new(self.variables.len() as u32);
        self.index.insert(variable.name.clone(), id);
        self.variables.push(variable);
        id
    }

    pub fn find_variable(&self, name: &str) -> Option<VariableId> {
        self.index.get(name).copied()
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    pub fn variable_mut(&mut self, id: VariableId) -> Option<&mut Variable> {
        self.variables.get_mut(id.index())
    }

    /// Name of the variable behind `id`.
    pub fn variable_name(&self, id: VariableId) -> Result<&str, ModelError> {
        self.variable(id)
            .map(|v| v.name.as_str())
            .ok_or(ModelError::UnresolvedVariable(id))
    }

    /// Variables in registry order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variables_of_type(&self, var_type: VariableType) -> impl Iterator<Item = &Variable> {
        self.variables.iter().filter(move |v| v.var_type == var_type)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> usize {
        self.constraints.push(constraint);
        self.constraints.len() - 1
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check that every term of the objective and the constraints refers to a
    /// registered variable.
    pub fn check_references(&self) -> Result<(), ModelError> {
        let expressions =
            std::iter::once(&self.objective).chain(self.constraints.iter().map(|c| &c.expr));
        for expr in expressions {
            for id in expr.variables() {
                if id.index() >= self.variables.len() {
                    return Err(ModelError::UnresolvedVariable(id));
                }
            }
        }
        Ok(())
    }
}
