//! Reclassification of raw tokens into the semantic tokens the model builder
//! consumes.

use std::fmt;

use crate::error::ParseError;
use crate::keywords::{self, Section};
use crate::lexer::{RawToken, RawTokenKind, Span};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Leq,
    Less,
    Equal,
    Greater,
    Geq,
}

impl Comparison {
    /// The same relation read right to left (`a <= b` is `b >= a`).
    pub fn flipped(self) -> Self {
        match self {
            Comparison::Leq => Comparison::Geq,
            Comparison::Less => Comparison::Greater,
            Comparison::Equal => Comparison::Equal,
            Comparison::Greater => Comparison::Less,
            Comparison::Geq => Comparison::Leq,
        }
    }

    /// Apply `value OP rhs` as a bound on `value`, returning the new
    /// `(lower, upper)` pair. Strict relations count as non-strict.
    pub fn restrict(self, (lower, upper): (f64, f64), rhs: f64) -> (f64, f64) {
        match self {
            Comparison::Leq | Comparison::Less => (lower, rhs),
            Comparison::Geq | Comparison::Greater => (rhs, upper),
            Comparison::Equal => (rhs, rhs),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Comparison::Leq => "<=",
            Comparison::Less => "<",
            Comparison::Equal => "=",
            Comparison::Greater => ">",
            Comparison::Geq => ">=",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Section(Section),
    /// `name:` labelling a constraint or the objective
    ConstraintId(String),
    VariableId(String),
    Constant(f64),
    Free,
    Comparison(Comparison),
    BracketOpen,
    BracketClose,
    Slash,
    Asterisk,
    Hat,
    FileEnd,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Section(section) => write!(f, "{section}"),
            TokenKind::ConstraintId(name) => write!(f, "label '{name}:'"),
            TokenKind::VariableId(name) => write!(f, "identifier '{name}'"),
            TokenKind::Constant(value) => write!(f, "constant {value}"),
            TokenKind::Free => write!(f, "'free'"),
            TokenKind::Comparison(op) => write!(f, "'{op}'"),
            TokenKind::BracketOpen => write!(f, "'['"),
            TokenKind::BracketClose => write!(f, "']'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Asterisk => write!(f, "'*'"),
            TokenKind::Hat => write!(f, "'^'"),
            TokenKind::FileEnd => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Groups raw tokens into semantic tokens with greedy longest-match
/// lookahead. Whitespace and line ends only separate tokens and are dropped
/// before matching.
pub struct TokenProcessor<'a> {
    raw: Vec<&'a RawToken>,
    pos: usize,
    in_sos: bool,
    tokens: Vec<Token>,
}

impl<'a> TokenProcessor<'a> {
    pub fn new(raw: &'a [RawToken]) -> Self {
        let raw = raw
            .iter()
            .filter(|t| !matches!(t.kind, RawTokenKind::Whitespace | RawTokenKind::LineEnd))
            .collect();
        Self {
            raw,
            pos: 0,
            in_sos: false,
            tokens: Vec::new(),
        }
    }

    pub fn process(raw: &'a [RawToken]) -> Result<Vec<Token>, ParseError> {
        let mut processor = TokenProcessor::new(raw);
        while processor.pos < processor.raw.len() {
            processor.step()?;
        }
        tracing::debug!(
            component = "tokens",
            operation = "process",
            status = "success",
            raw_tokens = raw.len(),
            tokens = processor.tokens.len(),
            "Processed tokens"
        );
        Ok(processor.tokens)
    }

    fn kind_at(&self, offset: usize) -> Option<&'a RawTokenKind> {
        self.raw.get(self.pos + offset).map(|&t| &t.kind)
    }

    fn str_at(&self, offset: usize) -> Option<&'a str> {
        match self.kind_at(offset) {
            Some(RawTokenKind::Str(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Emit `kind` covering the next `count` raw tokens.
    fn emit(&mut self, kind: TokenKind, count: usize) {
        let first = self.raw[self.pos].span;
        let last = self.raw[self.pos + count - 1].span;
        if let TokenKind::Section(section) = kind {
            self.in_sos = section == Section::Sos;
        }
        self.tokens.push(Token::new(kind, first.merge(last)));
        self.pos += count;
    }

    /// Like [`Self::kind_at`], but only for a token on the current token's line.
    fn kind_on_line_at(&self, offset: usize) -> Option<&'a RawTokenKind> {
        let current: &'a RawToken = *self.raw.get(self.pos)?;
        let token: &'a RawToken = *self.raw.get(self.pos + offset)?;
        (token.span.line == current.span.line).then_some(&token.kind)
    }

    fn str_on_line_at(&self, offset: usize) -> Option<&'a str> {
        match self.kind_on_line_at(offset) {
            Some(RawTokenKind::Str(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Like [`Self::kind_at`], but only when nothing separated the token
    /// from its predecessor in the source.
    fn adjacent_kind_at(&self, offset: usize) -> Option<&'a RawTokenKind> {
        let previous: &'a RawToken = *self.raw.get(self.pos + offset - 1)?;
        let token: &'a RawToken = *self.raw.get(self.pos + offset)?;
        (previous.span.end == token.span.start).then_some(&token.kind)
    }

    /// Value of the unsigned operand following a sign: a literal or an
    /// infinity keyword.
    fn operand_at(&self, offset: usize) -> Option<f64> {
        match self.kind_at(offset) {
            Some(RawTokenKind::Cons(value)) => Some(*value),
            Some(RawTokenKind::Str(text)) if keywords::is_keyword(text, keywords::INFINITY) => {
                Some(f64::INFINITY)
            }
            _ => None,
        }
    }

    fn step(&mut self) -> Result<(), ParseError> {
        if let Some(text) = self.str_at(0) {
            return self.step_str(text);
        }

        let Some(kind) = self.kind_at(0) else {
            return Ok(());
        };
        match kind {
            RawTokenKind::Plus | RawTokenKind::Minus => {
                let sign = if *kind == RawTokenKind::Minus { -1.0 } else { 1.0 };
                match self.operand_at(1) {
                    Some(value) => self.emit(TokenKind::Constant(sign * value), 2),
                    None => self.emit(TokenKind::Constant(sign), 1),
                }
            }
            RawTokenKind::Cons(value) => self.emit(TokenKind::Constant(*value), 1),
            RawTokenKind::Less | RawTokenKind::Greater | RawTokenKind::Equal => {
                let (op, count) = match (kind, self.adjacent_kind_at(1)) {
                    (RawTokenKind::Less, Some(RawTokenKind::Equal)) => (Comparison::Leq, 2),
                    (RawTokenKind::Less, _) => (Comparison::Less, 1),
                    (RawTokenKind::Greater, Some(RawTokenKind::Equal)) => (Comparison::Geq, 2),
                    (RawTokenKind::Greater, _) => (Comparison::Greater, 1),
                    (_, Some(RawTokenKind::Less)) => (Comparison::Leq, 2),
                    (_, Some(RawTokenKind::Greater)) => (Comparison::Geq, 2),
                    _ => (Comparison::Equal, 1),
                };
                self.emit(TokenKind::Comparison(op), count);
            }
            RawTokenKind::BracketOpen => self.emit(TokenKind::BracketOpen, 1),
            RawTokenKind::BracketClose => self.emit(TokenKind::BracketClose, 1),
            RawTokenKind::Slash => self.emit(TokenKind::Slash, 1),
            RawTokenKind::Asterisk => self.emit(TokenKind::Asterisk, 1),
            RawTokenKind::Hat => self.emit(TokenKind::Hat, 1),
            RawTokenKind::FileEnd => self.emit(TokenKind::FileEnd, 1),
            // SOS entries such as `s1: S1:: x:1` carry extra colons
            RawTokenKind::Colon if self.in_sos => self.pos += 1,
            RawTokenKind::Colon
            | RawTokenKind::Str(_)
            | RawTokenKind::Whitespace
            | RawTokenKind::LineEnd => {
                let token = self.raw[self.pos];
                return Err(ParseError::Tokenize {
                    line: token.span.line,
                    position: self.pos,
                    found: token.kind.to_string(),
                });
            }
        }
        Ok(())
    }

    fn step_str(&mut self, text: &'a str) -> Result<(), ParseError> {
        // semi-continuous
        if let (Some(RawTokenKind::Minus), Some(second)) =
            (self.kind_on_line_at(1), self.str_on_line_at(2))
        {
            if let Some(section) = keywords::section(&format!("{text}-{second}")) {
                self.emit(TokenKind::Section(section), 3);
                return Ok(());
            }
        }

        // subject to, such that
        if let Some(second) = self.str_on_line_at(1) {
            if let Some(section) = keywords::section(&format!("{text} {second}")) {
                self.emit(TokenKind::Section(section), 2);
                return Ok(());
            }
        }

        if let Some(section) = keywords::section(text) {
            self.emit(TokenKind::Section(section), 1);
        } else if self.kind_at(1) == Some(&RawTokenKind::Colon) {
            self.emit(TokenKind::ConstraintId(text.to_string()), 2);
        } else if keywords::is_keyword(text, keywords::FREE) {
            self.emit(TokenKind::Free, 1);
        } else if keywords::is_keyword(text, keywords::INFINITY) {
            self.emit(TokenKind::Constant(f64::INFINITY), 1);
        } else {
            self.emit(TokenKind::VariableId(text.to_string()), 1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::options::ReaderOptions;
    use lpfile_model::ObjectiveSense;

    fn process(source: &str) -> Result<Vec<TokenKind>, ParseError> {
        let raw = Lexer::tokenize(source, &ReaderOptions::default())?;
        let tokens = TokenProcessor::process(&raw)?;
        Ok(tokens.into_iter().map(|t| t.kind).collect())
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        process(source).unwrap()
    }

    fn var(name: &str) -> TokenKind {
        TokenKind::VariableId(name.to_string())
    }

    #[test]
    fn test_multi_word_keywords() {
        assert_eq!(
            kinds("subject to\nsuch  that\nSemi-Continuous"),
            vec![
                TokenKind::Section(Section::Constraints),
                TokenKind::Section(Section::Constraints),
                TokenKind::Section(Section::SemiContinuous),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_multi_word_keywords_stay_on_one_line() {
        assert_eq!(
            kinds("such\nthat\nsubject\nto\nsemi\n-continuous"),
            vec![
                var("such"),
                var("that"),
                var("subject"),
                var("to"),
                TokenKind::Section(Section::SemiContinuous),
                TokenKind::Constant(-1.0),
                var("continuous"),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_hyphenated_non_keyword_stays_expression() {
        assert_eq!(
            kinds("x - y"),
            vec![var("x"), TokenKind::Constant(-1.0), var("y"), TokenKind::FileEnd]
        );
    }

    #[test]
    fn test_objective_keyword_carries_sense() {
        assert_eq!(
            kinds("MAXIMIZE"),
            vec![
                TokenKind::Section(Section::Objective(ObjectiveSense::Maximize)),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_constraint_identifier() {
        assert_eq!(
            kinds("c1: 2 x"),
            vec![
                TokenKind::ConstraintId("c1".to_string()),
                TokenKind::Constant(2.0),
                var("x"),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_keyword_takes_priority_over_label() {
        // `st` is consumed as a keyword, leaving a stray colon
        let err = process("st: x").unwrap_err();
        assert!(matches!(err, ParseError::Tokenize { .. }));
    }

    #[test]
    fn test_free_and_infinity() {
        assert_eq!(
            kinds("x free -inf <= y <= +Infinity"),
            vec![
                var("x"),
                TokenKind::Free,
                TokenKind::Constant(f64::NEG_INFINITY),
                TokenKind::Comparison(Comparison::Leq),
                var("y"),
                TokenKind::Comparison(Comparison::Leq),
                TokenKind::Constant(f64::INFINITY),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_signed_constants() {
        assert_eq!(
            kinds("- 3 x + y + 4.5"),
            vec![
                TokenKind::Constant(-3.0),
                var("x"),
                TokenKind::Constant(1.0),
                var("y"),
                TokenKind::Constant(4.5),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            kinds("<= < >= > = =< => < ="),
            vec![
                TokenKind::Comparison(Comparison::Leq),
                TokenKind::Comparison(Comparison::Less),
                TokenKind::Comparison(Comparison::Geq),
                TokenKind::Comparison(Comparison::Greater),
                TokenKind::Comparison(Comparison::Equal),
                TokenKind::Comparison(Comparison::Leq),
                TokenKind::Comparison(Comparison::Geq),
                TokenKind::Comparison(Comparison::Less),
                TokenKind::Comparison(Comparison::Equal),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_quadratic_structure() {
        assert_eq!(
            kinds("[ 2 x^2 + x * y ]/2"),
            vec![
                TokenKind::BracketOpen,
                TokenKind::Constant(2.0),
                var("x"),
                TokenKind::Hat,
                TokenKind::Constant(2.0),
                TokenKind::Constant(1.0),
                var("x"),
                TokenKind::Asterisk,
                var("y"),
                TokenKind::BracketClose,
                TokenKind::Slash,
                TokenKind::Constant(2.0),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_lone_colon_is_tokenize_error() {
        let err = process("x + : y").unwrap_err();
        match err {
            ParseError::Tokenize { line, found, .. } => {
                assert_eq!(line, 1);
                assert_eq!(found, "':'");
            }
            other => panic!("expected tokenize error, got {other:?}"),
        }
    }

    #[test]
    fn test_colons_skipped_in_sos() {
        assert_eq!(
            kinds("sos\ns1: S1:: x:1\nend"),
            vec![
                TokenKind::Section(Section::Sos),
                TokenKind::ConstraintId("s1".to_string()),
                TokenKind::ConstraintId("S1".to_string()),
                TokenKind::ConstraintId("x".to_string()),
                TokenKind::Constant(1.0),
                TokenKind::Section(Section::End),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_spans_cover_grouped_tokens() {
        let raw = Lexer::tokenize("a\nsubject to", &ReaderOptions::default()).unwrap();
        let tokens = TokenProcessor::process(&raw).unwrap();
        assert_eq!(tokens[1].span, Span::new(2, 2, 12));
    }
}
