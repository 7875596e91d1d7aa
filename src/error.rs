use std::path::PathBuf;

use thiserror::Error;

use crate::config::Direction;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required column or metadata key is missing or an input file is
    /// structurally malformed. Raised before any row is processed.
    #[error("schema error in {path}: {message}")]
    Schema { path: PathBuf, message: String },

    /// A gene identifier could not be reduced to canonical form.
    #[error("cannot normalize gene identifier {raw:?}")]
    IdentifierNormalization { raw: String },

    /// A joined profile contained no genes for one direction. The signature
    /// has no defined RGES; callers must report the marker, not a zero.
    #[error("signature {signature}: no {direction}-regulated genes overlap the signature")]
    EmptyProfile {
        signature: String,
        direction: Direction,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("malformed checkpoint {path}: {source}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn schema(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Schema {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
