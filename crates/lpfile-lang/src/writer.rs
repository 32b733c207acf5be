//! Serializes a [`Model`] back to LP text that the reader accepts.

use std::io::{self, Write};

use lpfile_model::{Constraint, Expression, Model, VariableType};

use crate::error::WriteError;
use crate::keywords::Section;
use crate::options::WriterOptions;

/// Sign-prefixed shortest form of `value`; exponent notation outside
/// `[1e-5, 1e16)`.
pub fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "+inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude == 0.0 || (1e-5..1e16).contains(&magnitude) {
        format!("{value:+}")
    } else {
        format!("{value:+e}")
    }
}

/// Writes space-separated words, starting a new line before any word that
/// would push the current line past `max_line_width`.
pub struct Writer<W: Write> {
    sink: W,
    options: WriterOptions,
    line_length: usize,
}

impl<W: Write> Writer<W> {
    pub fn new(sink: W, options: WriterOptions) -> Self {
        Self {
            sink,
            options,
            line_length: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn word(&mut self, text: &str) -> io::Result<()> {
        let length = text.chars().count();
        if self.line_length > 0 {
            if self.line_length + 1 + length > self.options.max_line_width {
                self.sink.write_all(b"\n")?;
                self.line_length = 0;
            } else {
                self.sink.write_all(b" ")?;
                self.line_length += 1;
            }
        }
        self.sink.write_all(text.as_bytes())?;
        self.line_length += length;
        Ok(())
    }

    fn line_end(&mut self) -> io::Result<()> {
        self.sink.write_all(b"\n")?;
        self.line_length = 0;
        Ok(())
    }

    fn keyword_line(&mut self, section: Section) -> io::Result<()> {
        self.word(section.keyword())?;
        self.line_end()
    }

    pub fn write(&mut self, model: &Model) -> Result<(), WriteError> {
        model.check_references()?;

        if let Some(header) = self.options.header.clone() {
            for line in header.lines() {
                writeln!(self.sink, "\\ {line}")?;
            }
            self.line_length = 0;
        }

        self.keyword_line(Section::Objective(model.sense))?;
        self.write_expression(model, &model.objective)?;
        self.line_end()?;

        self.keyword_line(Section::Constraints)?;
        for constraint in &model.constraints {
            self.write_constraint(model, constraint)?;
        }

        self.keyword_line(Section::Bounds)?;
        for variable in model.variables() {
            self.word(&format_number(variable.lower_bound))?;
            self.word("<=")?;
            self.word(&variable.name)?;
            self.word("<=")?;
            self.word(&format_number(variable.upper_bound))?;
            self.line_end()?;
        }

        let type_sections = [
            (Section::General, VariableType::General),
            (Section::Binary, VariableType::Binary),
            (Section::SemiContinuous, VariableType::SemiContinuous),
        ];
        for (section, var_type) in type_sections {
            let mut members = model.variables_of_type(var_type).peekable();
            if members.peek().is_none() {
                continue;
            }
            self.keyword_line(section)?;
            for variable in members {
                self.word(&variable.name)?;
                self.line_end()?;
            }
        }

        self.keyword_line(Section::End)?;
        self.sink.flush()?;

        tracing::debug!(
            component = "writer",
            operation = "write",
            status = "success",
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            "Rendered model"
        );
        Ok(())
    }

    fn write_constraint(&mut self, model: &Model, constraint: &Constraint) -> Result<(), WriteError> {
        let (lower, upper) = (constraint.lower_bound, constraint.upper_bound);
        if constraint.is_equality() {
            self.write_clause(model, &constraint.expr, "=", lower)?;
        } else if lower == f64::NEG_INFINITY {
            self.write_clause(model, &constraint.expr, "<=", upper)?;
        } else if upper == f64::INFINITY {
            self.write_clause(model, &constraint.expr, ">=", lower)?;
        } else if constraint.name().is_some() {
            // the reader folds clauses sharing a label
            self.write_clause(model, &constraint.expr, "<=", upper)?;
            self.write_clause(model, &constraint.expr, ">=", lower)?;
        } else {
            self.word(&format_number(lower))?;
            self.word("<=")?;
            self.write_expression(model, &constraint.expr)?;
            self.word("<=")?;
            self.word(&format_number(upper))?;
            self.line_end()?;
        }
        Ok(())
    }

    fn write_clause(
        &mut self,
        model: &Model,
        expr: &Expression,
        op: &str,
        rhs: f64,
    ) -> Result<(), WriteError> {
        self.write_expression(model, expr)?;
        self.word(op)?;
        self.word(&format_number(rhs))?;
        self.line_end()?;
        Ok(())
    }

    /// Quadratic coefficients are doubled inside the brackets and halved by
    /// the trailing `/2`. A block where doubling would overflow is written
    /// unscaled with `/1`.
    fn write_expression(&mut self, model: &Model, expr: &Expression) -> Result<(), WriteError> {
        if let Some(name) = &expr.name {
            self.word(&format!("{name}:"))?;
        }

        for term in &expr.lin_terms {
            self.word(&format_number(term.coef))?;
            self.word(model.variable_name(term.var)?)?;
        }

        if !expr.quad_terms.is_empty() {
            if !expr.lin_terms.is_empty() {
                self.word("+")?;
            }
            let halved = expr
                .quad_terms
                .iter()
                .all(|t| (2.0 * t.coef).is_finite() || !t.coef.is_finite());
            let scale = if halved { 2.0 } else { 1.0 };

            self.word("[")?;
            for term in &expr.quad_terms {
                self.word(&format_number(scale * term.coef))?;
                let var1 = model.variable_name(term.var1)?;
                if term.is_square() {
                    self.word(&format!("{var1}^2"))?;
                } else {
                    self.word(var1)?;
                    self.word("*")?;
                    self.word(model.variable_name(term.var2)?)?;
                }
            }
            self.word(if halved { "]/2" } else { "]/1" })?;
        }

        if expr.offset != 0.0 {
            self.word(&format_number(expr.offset))?;
        }
        Ok(())
    }
}
