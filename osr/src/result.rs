pub use osr_core::result::{BoxError, Error, ErrorKind, Result, TextPosition};

/// Wraps a SQLite failure from the authority database.
pub(crate) fn sqlite(err: rusqlite::Error) -> Error {
    Error::DatabaseError(Box::new(err))
}
