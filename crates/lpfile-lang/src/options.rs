/// Longest accepted input line, in characters, excluding the line ending.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 560;
/// Longest accepted identifier, in characters.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 255;
/// Column at which the writer starts a new output line.
pub const DEFAULT_MAX_LINE_WIDTH: usize = 560;

pub const DEFAULT_HEADER: &str = "File written by lpfile";

/// Limits applied while reading an LP file. Exceeding any of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub max_line_length: usize,
    pub max_name_length: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
        }
    }
}

impl ReaderOptions {
    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn with_max_name_length(mut self, max_name_length: usize) -> Self {
        self.max_name_length = max_name_length;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Soft limit on output line width; a token that would cross it starts a
    /// new line instead of being cut.
    pub max_line_width: usize,
    /// Text of the leading `\` comment line, none when `None`.
    pub header: Option<String>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_line_width: DEFAULT_MAX_LINE_WIDTH,
            header: Some(DEFAULT_HEADER.to_string()),
        }
    }
}

impl WriterOptions {
    pub fn with_max_line_width(mut self, max_line_width: usize) -> Self {
        self.max_line_width = max_line_width;
        self
    }

    pub fn with_header(mut self, header: Option<String>) -> Self {
        self.header = header;
        self
    }
}
