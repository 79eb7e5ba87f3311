use std::path::PathBuf;
use thiserror::Error;

use crate::model::ImageId;

/// The main error type for vgenome operations.
///
/// Dangling references and missing upstream records are not errors: the
/// former are counted in a [`NormalizeReport`](crate::normalize::NormalizeReport)
/// and the latter come back as [`Lookup::NotFound`](crate::model::Lookup).
#[derive(Debug, Error)]
pub enum VgError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed record in {context}: {source}")]
    MalformedRecord {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed page for request '{request}': {message}")]
    MalformedPage { request: String, message: String },

    #[error("HTTP request '{request}' failed: {message}")]
    Http { request: String, message: String },

    #[error("Sense '{name}' is not in the sense dictionary")]
    UnresolvedSense { name: String },

    #[error("Image {id} referenced by the data source does not exist")]
    ImageNotFound { id: ImageId },

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write JSON output: {0}")]
    JsonWrite(#[source] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
