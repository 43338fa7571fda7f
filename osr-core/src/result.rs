use std::fmt;

/// The result returned by many methods within the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error coming from one of the external collaborators (projection engine,
/// authority database, url fetcher).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Where in an input string a parse failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    /// byte offset into the input
    pub offset: usize,
    /// 1-based
    pub line: usize,
    /// 1-based, counted in chars
    pub column: usize,
}

impl TextPosition {
    pub fn locate(text: &str, offset: usize) -> TextPosition {
        let offset = offset.min(text.len());
        let mut line = 1;
        let mut column = 1;
        for (i, c) in text.char_indices() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        TextPosition {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}, column {} (offset {})",
            self.line, self.column, self.offset
        )
    }
}

fn at(position: &Option<TextPosition>) -> String {
    match position {
        Some(p) => format!(" at {}", p),
        None => String::new(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error parsing {format} input{}: {message}", at(.position))]
    ParseError {
        format: &'static str,
        message: String,
        position: Option<TextPosition>,
    },
    #[error("Error exporting to {format}: {message}")]
    ExportError {
        format: &'static str,
        message: String,
    },
    #[error("{format} parameter array must hold exactly {expected} values, got {found}")]
    ArrayLengthError {
        format: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Invalid coordinate reference system: {0}")]
    InvalidCRSError(String),
    #[error("No transformation between the coordinate systems: {0}")]
    IncompatibleCRSError(String),
    #[error("Unknown unit \"{0}\"")]
    UnitUnknownError(String),
    #[error("Required {0} node is missing")]
    MissingNodeError(&'static str),
    #[error("Invalid node path \"{0}\"")]
    PathError(String),
    #[error("Unsupported value: {0}")]
    UnsupportedError(String),
    #[error("Authority lookup failed: {0}")]
    AuthorityError(String),
    #[error("Error when accessing the authority database")]
    DatabaseError(#[source] BoxError),
    #[error("Error fetching \"{url}\"")]
    FetchError {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("Projection engine failed")]
    EngineError(#[source] BoxError),
}

/// The error classes callers typically switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Export,
    InvalidCRS,
    IncompatibleCRS,
    UnitUnknown,
    External,
}

impl Error {
    pub fn parse(format: &'static str, message: impl Into<String>) -> Error {
        Error::ParseError {
            format,
            message: message.into(),
            position: None,
        }
    }

    pub fn parse_at(
        format: &'static str,
        message: impl Into<String>,
        text: &str,
        offset: usize,
    ) -> Error {
        Error::ParseError {
            format,
            message: message.into(),
            position: Some(TextPosition::locate(text, offset)),
        }
    }

    pub fn export(format: &'static str, message: impl Into<String>) -> Error {
        Error::ExportError {
            format,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ParseError { .. } => ErrorKind::Parse,
            Error::ExportError { .. } | Error::ArrayLengthError { .. } => ErrorKind::Export,
            Error::InvalidCRSError(_)
            | Error::MissingNodeError(_)
            | Error::PathError(_)
            | Error::UnsupportedError(_) => ErrorKind::InvalidCRS,
            Error::IncompatibleCRSError(_) => ErrorKind::IncompatibleCRS,
            Error::UnitUnknownError(_) => ErrorKind::UnitUnknown,
            Error::AuthorityError(_)
            | Error::DatabaseError(_)
            | Error::FetchError { .. }
            | Error::EngineError(_) => ErrorKind::External,
        }
    }

    /// Byte offset of a parse failure, when it is known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::ParseError {
                position: Some(p), ..
            } => Some(p.offset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_counts_lines_and_columns() {
        let text = "GEOGCS[\n  \"x\",\n  bad";
        let pos = TextPosition::locate(text, text.find("bad").unwrap());
        assert_eq!(pos.line, 3);
        assert_eq!(pos.column, 3);
    }

    #[test]
    fn parse_error_message_includes_position() {
        let err = Error::parse_at("WKT", "unexpected end of input", "GEOGCS[", 7);
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.offset(), Some(7));
        assert!(err.to_string().contains("column 8"));
    }
}
