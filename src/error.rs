//! Error taxonomy shared by the viewer session and the batch commands.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A page-range token that is not a number. Numeric tokens that are
    /// merely out of range are dropped silently instead.
    #[error("invalid page range token: '{0}'")]
    InvalidRangeSpec(String),

    /// Deleting this page would leave the document empty.
    #[error("cannot delete the last page")]
    LastPageDeletionRefused,

    /// Failure reported by the PDF engine or another external component,
    /// underlying message preserved verbatim.
    #[error("engine: {0}")]
    Engine(String),

    /// An optional external dependency was not found. Detected before any
    /// work starts, so no partial output exists.
    #[error("{0} is not available")]
    DependencyUnavailable(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn engine(msg: impl Into<String>) -> Self {
        Error::Engine(msg.into())
    }
}
