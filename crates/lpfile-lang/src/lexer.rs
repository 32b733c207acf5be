use std::fmt;

use crate::error::ParseError;
use crate::options::ReaderOptions;

/// Location of a token: 1-based line and byte offsets into the source.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self { line, start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            line: self.line.min(other.line),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawTokenKind {
    /// Bare run of identifier characters
    Str(String),
    /// Unsigned numeric literal
    Cons(f64),
    Less,
    Greater,
    Equal,
    Colon,
    BracketOpen,
    BracketClose,
    Plus,
    Minus,
    Hat,
    Slash,
    Asterisk,
    Whitespace,
    LineEnd,
    FileEnd,
}

impl fmt::Display for RawTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTokenKind::Str(text) => write!(f, "identifier '{text}'"),
            RawTokenKind::Cons(value) => write!(f, "number {value}"),
            RawTokenKind::Less => write!(f, "'<'"),
            RawTokenKind::Greater => write!(f, "'>'"),
            RawTokenKind::Equal => write!(f, "'='"),
            RawTokenKind::Colon => write!(f, "':'"),
            RawTokenKind::BracketOpen => write!(f, "'['"),
            RawTokenKind::BracketClose => write!(f, "']'"),
            RawTokenKind::Plus => write!(f, "'+'"),
            RawTokenKind::Minus => write!(f, "'-'"),
            RawTokenKind::Hat => write!(f, "'^'"),
            RawTokenKind::Slash => write!(f, "'/'"),
            RawTokenKind::Asterisk => write!(f, "'*'"),
            RawTokenKind::Whitespace => write!(f, "whitespace"),
            RawTokenKind::LineEnd => write!(f, "end of line"),
            RawTokenKind::FileEnd => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    pub kind: RawTokenKind,
    pub span: Span,
}

impl RawToken {
    pub fn new(kind: RawTokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Characters that end an identifier run.
fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\r' | '\n' | '\\' | ':' | '+' | '<' | '>' | '^' | '=' | '/' | '-' | '[' | ']'
    )
}

fn single_char_token(c: char) -> Option<RawTokenKind> {
    let kind = match c {
        '[' => RawTokenKind::BracketOpen,
        ']' => RawTokenKind::BracketClose,
        '<' => RawTokenKind::Less,
        '>' => RawTokenKind::Greater,
        '=' => RawTokenKind::Equal,
        ':' => RawTokenKind::Colon,
        '+' => RawTokenKind::Plus,
        '-' => RawTokenKind::Minus,
        '^' => RawTokenKind::Hat,
        '/' => RawTokenKind::Slash,
        '*' => RawTokenKind::Asterisk,
        ' ' | '\t' | '\r' => RawTokenKind::Whitespace,
        _ => return None,
    };
    Some(kind)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Byte length of the unsigned numeric literal at the start of `text`:
/// `digits[.digits][(e|E)[+-]digits]`, where either side of the point may be
/// empty but not both. The exponent is only taken when it has digits.
fn scan_number(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut len = count_digits(bytes);
    let mut digits = len;
    if bytes.get(len) == Some(&b'.') {
        let fraction = count_digits(&bytes[len + 1..]);
        digits += fraction;
        if digits > 0 {
            len += 1 + fraction;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp = len + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = count_digits(&bytes[exp.min(bytes.len())..]);
        if exp_digits > 0 {
            len = exp + exp_digits;
        }
    }
    Some(len)
}

/// Byte length of the identifier run at the start of `text`.
fn scan_name(text: &str) -> usize {
    text.char_indices()
        .find(|&(_, c)| is_delimiter(c) || c.is_control())
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Splits LP source into raw tokens, one line at a time.
pub struct Lexer<'a> {
    options: &'a ReaderOptions,
    tokens: Vec<RawToken>,
}

impl<'a> Lexer<'a> {
    pub fn new(options: &'a ReaderOptions) -> Self {
        Self {
            options,
            tokens: Vec::new(),
        }
    }

    /// Lex the whole source. The result always ends in exactly one
    /// [`RawTokenKind::FileEnd`].
    pub fn tokenize(source: &str, options: &ReaderOptions) -> Result<Vec<RawToken>, ParseError> {
        let mut lexer = Lexer::new(options);
        let mut offset = 0;
        let mut line = 1;
        for text in source.split_inclusive('\n') {
            lexer.lex_line(line, offset, text)?;
            offset += text.len();
            if text.ends_with('\n') {
                line += 1;
            }
        }
        lexer.push(RawTokenKind::FileEnd, Span::new(line, offset, offset));
        tracing::debug!(
            component = "lexer",
            operation = "tokenize",
            status = "success",
            lines = line,
            tokens = lexer.tokens.len(),
            "Lexed raw tokens"
        );
        Ok(lexer.tokens)
    }

    fn push(&mut self, kind: RawTokenKind, span: Span) {
        self.tokens.push(RawToken::new(kind, span));
    }

    fn lex_line(&mut self, line: usize, offset: usize, text: &str) -> Result<(), ParseError> {
        let (content, terminated) = match text.strip_suffix('\n') {
            Some(content) => (content.strip_suffix('\r').unwrap_or(content), true),
            None => (text, false),
        };

        let length = content.chars().count();
        if length > self.options.max_line_length {
            return Err(ParseError::LineTooLong {
                line,
                length,
                max: self.options.max_line_length,
            });
        }

        let mut pos = 0;
        while let Some(c) = content[pos..].chars().next() {
            let start = offset + pos;

            // comment runs to the end of the line
            if c == '\\' {
                self.push(RawTokenKind::LineEnd, Span::new(line, start, offset + text.len()));
                return Ok(());
            }

            if let Some(kind) = single_char_token(c) {
                pos += c.len_utf8();
                self.push(kind, Span::new(line, start, offset + pos));
                continue;
            }

            let rest = &content[pos..];
            if let Some(len) = scan_number(rest) {
                let value: f64 = rest[..len].parse().map_err(|_| ParseError::Lex {
                    line,
                    column: content[..pos].chars().count() + 1,
                    found: c,
                })?;
                pos += len;
                self.push(RawTokenKind::Cons(value), Span::new(line, start, offset + pos));
                continue;
            }

            if c.is_control() {
                return Err(ParseError::Lex {
                    line,
                    column: content[..pos].chars().count() + 1,
                    found: c,
                });
            }

            let len = scan_name(rest);
            let name = &rest[..len];
            let name_length = name.chars().count();
            if name_length > self.options.max_name_length {
                return Err(ParseError::NameTooLong {
                    line,
                    length: name_length,
                    max: self.options.max_name_length,
                });
            }
            pos += len;
            self.push(
                RawTokenKind::Str(name.to_string()),
                Span::new(line, start, offset + pos),
            );
        }

        if terminated {
            let end = offset + text.len();
            self.push(RawTokenKind::LineEnd, Span::new(line, end - 1, end));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<RawTokenKind> {
        Lexer::tokenize(source, &ReaderOptions::default())
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn significant(source: &str) -> Vec<RawTokenKind> {
        kinds(source)
            .into_iter()
            .filter(|k| *k != RawTokenKind::Whitespace)
            .collect()
    }

    fn s(text: &str) -> RawTokenKind {
        RawTokenKind::Str(text.to_string())
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("[]<>=:+-^/*"),
            vec![
                RawTokenKind::BracketOpen,
                RawTokenKind::BracketClose,
                RawTokenKind::Less,
                RawTokenKind::Greater,
                RawTokenKind::Equal,
                RawTokenKind::Colon,
                RawTokenKind::Plus,
                RawTokenKind::Minus,
                RawTokenKind::Hat,
                RawTokenKind::Slash,
                RawTokenKind::Asterisk,
                RawTokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            significant("100 8.5 .25 3. 1e3 2.5E-2"),
            vec![
                RawTokenKind::Cons(100.0),
                RawTokenKind::Cons(8.5),
                RawTokenKind::Cons(0.25),
                RawTokenKind::Cons(3.0),
                RawTokenKind::Cons(1000.0),
                RawTokenKind::Cons(0.025),
                RawTokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_signs_are_separate_tokens() {
        assert_eq!(
            kinds("-3"),
            vec![RawTokenKind::Minus, RawTokenKind::Cons(3.0), RawTokenKind::FileEnd]
        );
    }

    #[test]
    fn test_number_identifier_boundary() {
        assert_eq!(
            kinds("2x"),
            vec![RawTokenKind::Cons(2.0), s("x"), RawTokenKind::FileEnd]
        );
        assert_eq!(kinds("x2"), vec![s("x2"), RawTokenKind::FileEnd]);
        assert_eq!(
            kinds("3e"),
            vec![RawTokenKind::Cons(3.0), s("e"), RawTokenKind::FileEnd]
        );
        assert_eq!(kinds("e5"), vec![s("e5"), RawTokenKind::FileEnd]);
        assert_eq!(kinds(".x"), vec![s(".x"), RawTokenKind::FileEnd]);
    }

    #[test]
    fn test_identifier_runs() {
        assert_eq!(
            significant("s.t. x_1#a x*y c1:"),
            vec![
                s("s.t."),
                s("x_1#a"),
                s("x*y"),
                s("c1"),
                RawTokenKind::Colon,
                RawTokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("x \\ comment + 3\ny"),
            vec![
                s("x"),
                RawTokenKind::Whitespace,
                RawTokenKind::LineEnd,
                s("y"),
                RawTokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(
            kinds("x\r\ny\n"),
            vec![
                s("x"),
                RawTokenKind::LineEnd,
                s("y"),
                RawTokenKind::LineEnd,
                RawTokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn test_file_end_exactly_once() {
        for source in ["", "\n", "x", "x\n", "\\ only a comment"] {
            let tokens = kinds(source);
            let ends = tokens
                .iter()
                .filter(|k| **k == RawTokenKind::FileEnd)
                .count();
            assert_eq!(ends, 1, "source {source:?}");
            assert_eq!(tokens.last(), Some(&RawTokenKind::FileEnd));
        }
    }

    #[test]
    fn test_spans_track_lines() {
        let tokens = Lexer::tokenize("a\n  b", &ReaderOptions::default()).unwrap();
        let b = tokens.iter().find(|t| t.kind == s("b")).unwrap();
        assert_eq!(b.span, Span::new(2, 4, 5));
    }

    #[test]
    fn test_line_too_long() {
        let options = ReaderOptions::default().with_max_line_length(10);
        assert!(Lexer::tokenize("0123456789\nx", &options).is_ok());
        let err = Lexer::tokenize("x\n0123456789a", &options).unwrap_err();
        assert!(matches!(
            err,
            ParseError::LineTooLong {
                line: 2,
                length: 11,
                max: 10
            }
        ));
    }

    #[test]
    fn test_name_too_long() {
        let options = ReaderOptions::default().with_max_name_length(4);
        assert!(Lexer::tokenize("abcd", &options).is_ok());
        let err = Lexer::tokenize("abcde", &options).unwrap_err();
        assert!(matches!(err, ParseError::NameTooLong { length: 5, .. }));
    }

    #[test]
    fn test_control_character_is_lex_error() {
        let err = Lexer::tokenize("x + \u{1}y", &ReaderOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Lex {
                line: 1,
                column: 5,
                found: '\u{1}'
            }
        ));
    }
}
