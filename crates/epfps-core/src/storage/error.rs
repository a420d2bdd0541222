use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Persistent storage is unavailable")]
    Unavailable,

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode document for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
