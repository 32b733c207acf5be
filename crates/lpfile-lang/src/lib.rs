pub mod error;
pub mod io;
pub mod keywords;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod tokens;
pub mod writer;

pub use error::{ParseError, WriteError};
pub use io::{
    parse, parse_with, read, read_file, read_file_with, read_with, render, render_to_string,
    render_to_string_with, render_with, write_file, write_file_with,
};
pub use keywords::Section;
pub use lexer::{Lexer, RawToken, RawTokenKind, Span};
pub use options::{ReaderOptions, WriterOptions};
pub use parser::Parser;
pub use tokens::{Comparison, Token, TokenKind, TokenProcessor};
pub use writer::{Writer, format_number};
