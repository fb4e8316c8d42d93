use std::path::PathBuf;

use thiserror::Error;
use ticktrack_api::ApiError;

/// Errors surfaced by the tracking layer.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Propagated from the REST client; already carries a readable message.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// An operation that needs a logged-in user ran without one.
    #[error("not logged in")]
    NotLoggedIn,

    /// The task is not present on the local board.
    #[error("task {0} is not loaded")]
    UnknownTask(String),

    /// The session file could not be read or written.
    #[error("session file {path}: {source}")]
    SessionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session encoding: {0}")]
    SessionEncoding(#[from] serde_json::Error),
}
