//! Errors surfaced by the commandline tool

use std::path::PathBuf;

use crate::import::ImportError;

#[derive(Debug, thiserror::Error)]
pub enum PrismError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("failed to write scene buffers to {}: {source}", .dir.display())]
    WriteBuffers {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `--transform` names a model that was never loaded
    #[error("cannot transform model {index}: only {loaded} models were loaded")]
    UnknownModel { index: usize, loaded: usize },
}
