//! Crate-wide error type.
//!
//! Grounded in `spielhuus-recad_core`'s `parser::Error`: a flat
//! `thiserror` enum with `From<std::io::Error>`, never a panic, for every
//! fallible path that touches a document on disk.

#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    #[error("bad grammar in {0}: {1}")]
    BadGrammar(String, String),

    #[error("symbol not found: {0}:{1}{2}")]
    SymbolNotFound(String, String, String),

    #[error("no instance found for reference {0}")]
    InstanceNotFound(String),

    #[error("ambiguous reference {0}: {1} instances matched")]
    AmbiguousReference(String, usize),

    #[error("bad coordinate: {0}")]
    BadCoordinate(String),

    #[error("external check failed with exit code {0}: {1}")]
    CheckFailed(i32, String),

    #[error("io error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
