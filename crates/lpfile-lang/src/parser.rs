use std::collections::{HashMap, HashSet};

use lpfile_model::{Constraint, Expression, Model, VariableId, VariableType};

use crate::error::ParseError;
use crate::keywords::{self, Section};
use crate::lexer::Lexer;
use crate::options::ReaderOptions;
use crate::tokens::{Comparison, Token, TokenKind, TokenProcessor};

static FILE_END: TokenKind = TokenKind::FileEnd;

/// Section the builder is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    Objective,
    Constraints,
    Bounds,
    General,
    Binary,
    SemiContinuous,
    Sos,
    End,
}

impl State {
    /// Transition on a section keyword. `None` when the keyword is not allowed
    /// here: the objective must come first and only once.
    fn next(self, section: Section) -> Option<State> {
        let next = match (self, section) {
            (State::None, Section::Objective(_)) => State::Objective,
            (State::None, _) | (_, Section::Objective(_)) => return None,
            (_, Section::Constraints) => State::Constraints,
            (_, Section::Bounds) => State::Bounds,
            (_, Section::General) => State::General,
            (_, Section::Binary) => State::Binary,
            (_, Section::SemiContinuous) => State::SemiContinuous,
            (_, Section::Sos) => State::Sos,
            (_, Section::End) => State::End,
        };
        Some(next)
    }
}

/// Lexing errors in input that does not open with an objective keyword are
/// reported as an invalid file.
fn reject_garbage(source: &str, err: ParseError) -> ParseError {
    let first_word = source
        .lines()
        .map(|line| line.split('\\').next().unwrap_or("").trim())
        .find(|line| !line.is_empty())
        .and_then(|line| line.split(|c: char| c.is_whitespace() || c == ':').next());
    match first_word {
        Some(word) if keywords::objective_sense(word).is_some() => err,
        _ => ParseError::InvalidArgument(format!("not an LP file ({err})")),
    }
}

/// Builds a [`Model`] from the semantic token stream, one section statement
/// at a time.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    state: State,
    model: Model,
    /// Constraint index by label, so repeated clauses fold into one constraint
    constraint_names: HashMap<String, usize>,
    /// Variables named by any bounds statement
    bounded: HashSet<VariableId>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            state: State::None,
            model: Model::default(),
            constraint_names: HashMap::new(),
            bounded: HashSet::new(),
        }
    }

    pub fn parse(source: &str) -> Result<Model, ParseError> {
        Self::parse_with(source, &ReaderOptions::default())
    }

    pub fn parse_with(source: &str, options: &ReaderOptions) -> Result<Model, ParseError> {
        let tokens = Lexer::tokenize(source, options)
            .and_then(|raw| TokenProcessor::process(&raw))
            .map_err(|err| reject_garbage(source, err))?;
        Parser::new(tokens).parse_model()
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.kind)
            .unwrap_or(&FILE_END)
    }

    fn peek_kind(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span.line)
            .unwrap_or(1)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.peek_kind().to_string(),
            line: self.line(),
        }
    }

    fn expect_constant(&mut self) -> Result<f64, ParseError> {
        match *self.peek_kind() {
            TokenKind::Constant(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.unexpected("constant")),
        }
    }

    fn expect_comparison(&mut self) -> Result<Comparison, ParseError> {
        match *self.peek_kind() {
            TokenKind::Comparison(op) => {
                self.advance();
                Ok(op)
            }
            _ => Err(self.unexpected("comparison")),
        }
    }

    /// Consume a variable name, registering the variable on first reference.
    fn expect_variable(&mut self) -> Result<VariableId, ParseError> {
        match self.peek_kind().clone() {
            TokenKind::VariableId(name) => {
                self.advance();
                Ok(self.model.variable_id(&name))
            }
            _ => Err(self.unexpected("variable name")),
        }
    }

    pub fn parse_model(mut self) -> Result<Model, ParseError> {
        loop {
            match (self.state, self.peek_kind().clone()) {
                (State::None, TokenKind::FileEnd) => {
                    return Err(ParseError::InvalidArgument(
                        "no section keyword before end of input".to_string(),
                    ));
                }
                (_, TokenKind::FileEnd) => break,
                (State::End, found) => {
                    return Err(ParseError::UnexpectedTokenAfterEnd {
                        line: self.line(),
                        found: found.to_string(),
                    });
                }
                (_, TokenKind::Section(section)) => {
                    self.enter(section)?;
                    self.advance();
                }
                (State::None, found) => {
                    return Err(ParseError::InvalidArgument(format!(
                        "expected an objective keyword at line {}, found {}",
                        self.line(),
                        found
                    )));
                }
                (State::Objective, _) => self.parse_objective()?,
                (State::Constraints, _) => self.parse_constraint()?,
                (State::Bounds, _) => self.parse_bound()?,
                (State::General, _) => self.parse_declaration(VariableType::General)?,
                (State::Binary, _) => self.parse_declaration(VariableType::Binary)?,
                (State::SemiContinuous, _) => {
                    self.parse_declaration(VariableType::SemiContinuous)?
                }
                // SOS content is not modelled
                (State::Sos, _) => self.advance(),
            }
        }
        self.finish()
    }

    fn enter(&mut self, section: Section) -> Result<(), ParseError> {
        let Some(next) = self.state.next(section) else {
            if self.state == State::None {
                return Err(ParseError::InvalidArgument(format!(
                    "expected an objective keyword at line {}, found {}",
                    self.line(),
                    section
                )));
            }
            return Err(self.unexpected("a section other than a second objective"));
        };
        if let Section::Objective(sense) = section {
            self.model.sense = sense;
        }
        tracing::trace!(
            component = "parser",
            operation = "enter_section",
            from = ?self.state,
            to = ?next,
            line = self.line(),
            "Entered section"
        );
        self.state = next;
        Ok(())
    }

    fn parse_objective(&mut self) -> Result<(), ParseError> {
        let mut objective = std::mem::take(&mut self.model.objective);
        if let TokenKind::ConstraintId(name) = self.peek_kind().clone() {
            self.advance();
            objective.name = Some(name);
        }
        self.parse_expression(&mut objective)?;
        self.model.objective = objective;

        match self.peek_kind() {
            TokenKind::Section(_) | TokenKind::FileEnd => Ok(()),
            _ => Err(self.unexpected("objective term or section keyword")),
        }
    }

    /// Accumulate linear terms, constants, and quadratic blocks into `expr`
    /// until a token that cannot continue an expression.
    ///
    /// A constant directly before a variable or `[` is its coefficient; any
    /// other constant is added to the offset.
    fn parse_expression(&mut self, expr: &mut Expression) -> Result<(), ParseError> {
        let mut pending: Option<f64> = None;
        loop {
            match self.peek_kind().clone() {
                TokenKind::Constant(value) => {
                    if let Some(offset) = pending.replace(value) {
                        expr.offset += offset;
                    }
                    self.advance();
                }
                TokenKind::VariableId(name) => {
                    let id = self.model.variable_id(&name);
                    expr.add_linear(id, pending.take().unwrap_or(1.0));
                    self.advance();
                }
                TokenKind::BracketOpen => {
                    let scale = pending.take().unwrap_or(1.0);
                    self.parse_quadratic(expr, scale)?;
                }
                _ => break,
            }
        }
        if let Some(offset) = pending {
            expr.offset += offset;
        }
        Ok(())
    }

    /// `[ c1 x ^ 2 + c2 x * y ... ] / d`: every coefficient is multiplied by
    /// `scale` and divided by `d` (1 when the divisor is absent).
    fn parse_quadratic(&mut self, expr: &mut Expression, scale: f64) -> Result<(), ParseError> {
        self.advance();
        let mut terms = Vec::new();
        loop {
            match self.peek_kind().clone() {
                TokenKind::BracketClose => {
                    self.advance();
                    break;
                }
                TokenKind::Constant(coef) => {
                    self.advance();
                    match self.peek_kind().clone() {
                        TokenKind::VariableId(name) => {
                            self.advance();
                            terms.push(self.parse_product(&name, coef)?);
                        }
                        _ => return Err(self.unexpected("variable in quadratic term")),
                    }
                }
                TokenKind::VariableId(name) => {
                    self.advance();
                    terms.push(self.parse_product(&name, 1.0)?);
                }
                _ => return Err(self.unexpected("quadratic term or ']'")),
            }
        }

        let divisor = if *self.peek_kind() == TokenKind::Slash {
            self.advance();
            match *self.peek_kind() {
                TokenKind::Constant(value) if value != 0.0 => {
                    self.advance();
                    value
                }
                _ => return Err(self.unexpected("non-zero divisor after ']/'")),
            }
        } else {
            1.0
        };

        for (var1, var2, coef) in terms {
            expr.add_quadratic(var1, var2, scale * coef / divisor);
        }
        Ok(())
    }

    /// The rest of a quadratic term after its first variable: `^ 2` or
    /// `* other`. `x*y` written without spaces arrives as one name.
    fn parse_product(
        &mut self,
        first: &str,
        coef: f64,
    ) -> Result<(VariableId, VariableId, f64), ParseError> {
        if let Some((left, right)) = first.split_once('*') {
            let var1 = self.model.variable_id(left);
            let var2 = if right.is_empty() {
                self.expect_variable()?
            } else {
                self.model.variable_id(right)
            };
            return Ok((var1, var2, coef));
        }

        let var1 = self.model.variable_id(first);
        match *self.peek_kind() {
            TokenKind::Hat => {
                self.advance();
                match *self.peek_kind() {
                    TokenKind::Constant(exponent) if exponent == 2.0 => {
                        self.advance();
                        Ok((var1, var1, coef))
                    }
                    _ => Err(self.unexpected("exponent 2")),
                }
            }
            TokenKind::Asterisk => {
                self.advance();
                let var2 = self.expect_variable()?;
                Ok((var1, var2, coef))
            }
            _ => Err(self.unexpected("'^ 2' or '* variable'")),
        }
    }

    /// One relational clause: `[name:] [c1 OP] expr [OP c2]`, where at least
    /// one side carries a bound.
    fn parse_constraint(&mut self) -> Result<(), ParseError> {
        let mut expr = match self.peek_kind().clone() {
            TokenKind::ConstraintId(name) => {
                self.advance();
                Expression::named(name)
            }
            _ => Expression::new(),
        };

        let mut bounds = (f64::NEG_INFINITY, f64::INFINITY);
        let mut bounded_left = false;
        if let (TokenKind::Constant(value), TokenKind::Comparison(op)) =
            (self.peek_at(0).clone(), self.peek_at(1).clone())
        {
            self.advance();
            self.advance();
            bounds = op.flipped().restrict(bounds, value);
            bounded_left = true;
        }

        self.parse_expression(&mut expr)?;
        if !expr.has_terms() {
            return Err(self.unexpected("constraint expression"));
        }

        match *self.peek_kind() {
            TokenKind::Comparison(op) => {
                self.advance();
                let value = self.expect_constant()?;
                bounds = op.restrict(bounds, value);
            }
            _ if bounded_left => {}
            _ => return Err(self.unexpected("comparison")),
        }

        let (lower, upper) = bounds;
        self.commit_constraint(Constraint::with_bounds(expr, lower, upper));
        Ok(())
    }

    /// Add a finished clause. A clause whose label was seen before only
    /// updates the bounds of the earlier constraint.
    fn commit_constraint(&mut self, constraint: Constraint) {
        let Some(name) = constraint.expr.name.clone() else {
            self.model.add_constraint(constraint);
            return;
        };
        match self.constraint_names.get(&name) {
            Some(&index) => {
                let existing = &mut self.model.constraints[index];
                if constraint.lower_bound != f64::NEG_INFINITY {
                    existing.lower_bound = constraint.lower_bound;
                }
                if constraint.upper_bound != f64::INFINITY {
                    existing.upper_bound = constraint.upper_bound;
                }
                tracing::trace!(
                    component = "parser",
                    operation = "fold_constraint",
                    constraint = %name,
                    "Folded repeated constraint clause"
                );
            }
            None => {
                let index = self.model.add_constraint(constraint);
                self.constraint_names.insert(name, index);
            }
        }
    }

    /// `c1 OP x [OP c2]`, `x OP c`, or `x free`.
    fn parse_bound(&mut self) -> Result<(), ParseError> {
        let id = match self.peek_kind().clone() {
            TokenKind::Constant(value) => {
                self.advance();
                let op = self.expect_comparison()?;
                let id = self.expect_variable()?;
                self.restrict_variable(id, op.flipped(), value);
                if let TokenKind::Comparison(op) = *self.peek_kind() {
                    self.advance();
                    let value = self.expect_constant()?;
                    self.restrict_variable(id, op, value);
                }
                id
            }
            TokenKind::VariableId(name) => {
                self.advance();
                let id = self.model.variable_id(&name);
                match *self.peek_kind() {
                    TokenKind::Free => {
                        self.advance();
                        if let Some(variable) = self.model.variable_mut(id) {
                            variable.set_bounds(f64::NEG_INFINITY, f64::INFINITY);
                        }
                    }
                    TokenKind::Comparison(op) => {
                        self.advance();
                        let value = self.expect_constant()?;
                        self.restrict_variable(id, op, value);
                    }
                    _ => return Err(self.unexpected("comparison or 'free'")),
                }
                id
            }
            _ => return Err(self.unexpected("bound statement")),
        };
        self.bounded.insert(id);
        Ok(())
    }

    fn restrict_variable(&mut self, id: VariableId, op: Comparison, value: f64) {
        if let Some(variable) = self.model.variable_mut(id) {
            let (lower, upper) = op.restrict((variable.lower_bound, variable.upper_bound), value);
            variable.set_bounds(lower, upper);
        }
    }

    fn parse_declaration(&mut self, var_type: VariableType) -> Result<(), ParseError> {
        let id = self.expect_variable()?;
        if let Some(variable) = self.model.variable_mut(id) {
            variable.var_type = var_type;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Model, ParseError> {
        // binaries get [0, 1] unless a bounds statement named them
        for index in 0..self.model.num_variables() {
            let id = VariableId::new(index as u32);
            if self.bounded.contains(&id) {
                continue;
            }
            if let Some(variable) = self.model.variable_mut(id) {
                if variable.var_type == VariableType::Binary {
                    variable.set_bounds(0.0, 1.0);
                }
            }
        }

        self.model
            .check_references()
            .map_err(|err| ParseError::UnresolvedVariableReference(err.to_string()))?;

        tracing::debug!(
            component = "parser",
            operation = "parse_model",
            status = "success",
            sense = ?self.model.sense,
            variables = self.model.num_variables(),
            constraints = self.model.num_constraints(),
            "Built model"
        );
        Ok(self.model)
    }
}
