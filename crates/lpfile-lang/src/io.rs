//! Boundary functions between LP text sources/sinks and [`Model`].

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use lpfile_model::Model;

use crate::error::{ParseError, WriteError};
use crate::options::{ReaderOptions, WriterOptions};
use crate::parser::Parser;
use crate::writer::Writer;

pub fn parse(source: &str) -> Result<Model, ParseError> {
    Parser::parse(source)
}

pub fn parse_with(source: &str, options: &ReaderOptions) -> Result<Model, ParseError> {
    Parser::parse_with(source, options)
}

/// Read the whole of `source` and parse it. Input that is not UTF-8 is
/// rejected as an invalid file.
pub fn read<R: Read>(source: R) -> Result<Model, ParseError> {
    read_with(source, &ReaderOptions::default())
}

pub fn read_with<R: Read>(mut source: R, options: &ReaderOptions) -> Result<Model, ParseError> {
    let mut bytes = Vec::new();
    source.read_to_end(&mut bytes)?;
    let text = String::from_utf8(bytes).map_err(|err| {
        ParseError::InvalidArgument(format!(
            "input is not valid UTF-8 (byte {})",
            err.utf8_error().valid_up_to()
        ))
    })?;
    parse_with(&text, options)
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Model, ParseError> {
    read_file_with(path, &ReaderOptions::default())
}

pub fn read_file_with(
    path: impl AsRef<Path>,
    options: &ReaderOptions,
) -> Result<Model, ParseError> {
    let path = path.as_ref();
    tracing::debug!(
        component = "io",
        operation = "read_file",
        path = %path.display(),
        "Reading LP file"
    );
    read_with(File::open(path)?, options)
}

pub fn render<W: Write>(model: &Model, sink: W) -> Result<(), WriteError> {
    render_with(model, sink, &WriterOptions::default())
}

pub fn render_with<W: Write>(
    model: &Model,
    sink: W,
    options: &WriterOptions,
) -> Result<(), WriteError> {
    Writer::new(sink, options.clone()).write(model)
}

pub fn render_to_string(model: &Model) -> Result<String, WriteError> {
    render_to_string_with(model, &WriterOptions::default())
}

pub fn render_to_string_with(model: &Model, options: &WriterOptions) -> Result<String, WriteError> {
    let mut buffer = Vec::new();
    render_with(model, &mut buffer, options)?;
    // every piece written is a &str
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn write_file(model: &Model, path: impl AsRef<Path>) -> Result<(), WriteError> {
    write_file_with(model, path, &WriterOptions::default())
}

pub fn write_file_with(
    model: &Model,
    path: impl AsRef<Path>,
    options: &WriterOptions,
) -> Result<(), WriteError> {
    let file = File::create(path)?;
    render_with(model, BufWriter::new(file), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rejects_non_utf8() {
        let bytes: &[u8] = b"min\n x\xff\nend\n";
        let err = read(bytes).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_read_from_reader() {
        let bytes: &[u8] = b"max\n 2 x\nst\n c: x <= 4\nend\n";
        let model = read(bytes).unwrap();
        assert_eq!(model.num_constraints(), 1);
    }

    #[test]
    fn test_read_file_missing() {
        let err = read_file("/nonexistent/dir/model.lp").unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_file_roundtrip() {
        let model = parse("min\n obj: x + 2 y\nst\n c1: x + y >= 1\nend\n").unwrap();
        let path = std::env::temp_dir().join(format!("lpfile-io-test-{}.lp", std::process::id()));
        write_file(&model, &path).unwrap();
        let reread = read_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(reread, model);
    }

    #[test]
    fn test_render_to_string_with_width() {
        let model = parse("min\n x + y\nend\n").unwrap();
        let options = WriterOptions::default().with_max_line_width(8).with_header(None);
        let text = render_to_string_with(&model, &options).unwrap();
        assert!(text.starts_with("minimize\n+1 x +1\ny\n"));
    }
}
