//! Error types for kv-collections
//!
//! Two layers, each with its own `Result` alias:
//! - [`ClientError`] for anything raised by a [`KvClient`](crate::client::KvClient)
//! - [`CollectionError`] for the adapters, which wraps client errors unchanged

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a key-value client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Connection could not be established or was dropped
    #[error("Connection error: {0}")]
    Connection(String),

    /// The store answered with an error reply (e.g. `ERR index out of range`)
    #[error("Response error: {0}")]
    Response(String),

    /// The reply had a different shape than the command produces
    #[error("Unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        expected: &'static str,
        got: &'static str,
    },

    /// Reply payload could not be interpreted
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No reply within the configured response timeout
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error from the redis driver
    #[error("Redis error: {0}")]
    Redis(redis::RedisError),
}

impl ClientError {
    /// True when the store rejected an index as out of range for a list
    pub fn is_out_of_range(&self) -> bool {
        match self {
            ClientError::Response(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("index out of range") || msg.contains("no such key")
            }
            _ => false,
        }
    }
}

impl From<redis::RedisError> for ClientError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            ClientError::Connection(err.to_string())
        } else if err.kind() == redis::ErrorKind::ResponseError
            || err.kind() == redis::ErrorKind::ExtensionError
            || err.kind() == redis::ErrorKind::TypeError
        {
            ClientError::Response(err.to_string())
        } else {
            ClientError::Redis(err)
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Errors raised by the collection adapters
#[derive(Error, Debug)]
pub enum CollectionError {
    /// No usable client was supplied
    #[error("Invalid client: {0}")]
    InvalidClient(String),

    /// Storage key was empty
    #[error("Invalid key: storage key must be a non-empty string")]
    InvalidKey,

    /// `set_element_at` was called past the end of the list
    #[error("Index {index} out of range for list '{key}'")]
    IndexOutOfRange { key: String, index: i64 },

    /// A stored value was not valid JSON under the JSON codec
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A watched key changed before an atomic composite could commit
    #[error("Transaction aborted: '{key}' was modified concurrently")]
    TransactionAborted { key: String },

    /// Error propagated from the client unchanged
    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type CollectionResult<T> = Result<T, CollectionError>;
