/// Stable handle of a variable inside a [`Model`](crate::Model).
///
/// Handles are assigned in order of first reference and never reused.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct VariableId(u32);

impl VariableId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the inner u32 value.
    pub fn inner(self) -> u32 {
        self.0
    }

    /// Position of the variable in the model's registry.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableType {
    #[default]
    Continuous,
    Binary,
    General,
    SemiContinuous,
}

/// A decision variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub var_type: VariableType,
    /// Lower bound, 0 unless declared otherwise
    pub lower_bound: f64,
    /// Upper bound, +inf unless declared otherwise
    pub upper_bound: f64,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
        }
    }

    pub fn set_bounds(&mut self, lower: f64, upper: f64) {
        self.lower_bound = lower;
        self.upper_bound = upper;
    }

    pub fn is_free(&self) -> bool {
        self.lower_bound == f64::NEG_INFINITY && self.upper_bound == f64::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let x = Variable::new("x");
        assert_eq!(x.var_type, VariableType::Continuous);
        assert_eq!(x.lower_bound, 0.0);
        assert_eq!(x.upper_bound, f64::INFINITY);
        assert!(!x.is_free());
    }

    #[test]
    fn test_id_index() {
        assert_eq!(VariableId::new(7).index(), 7);
        assert_eq!(VariableId::new(7).inner(), 7);
    }
}
