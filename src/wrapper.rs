//! Wrapper base shared by the collection adapters
//!
//! Holds the client handle, the storage key and the codec chosen from the
//! serialization flag. Adapters issue every remote call through
//! [`Wrapper::dispatch`], which binds the stored key as the first argument.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::client::{Command, KvClient, Reply};
use crate::codec::{codec_for, ValueCodec};
use crate::error::{CollectionError, CollectionResult};

/// Client + key + codec
#[derive(Clone)]
pub struct Wrapper {
    client: Arc<dyn KvClient>,
    key: String,
    codec: Arc<dyn ValueCodec>,
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("key", &self.key)
            .field("codec", &self.codec)
            .finish()
    }
}

impl Wrapper {
    /// Bind a client to a key
    ///
    /// Fails with `InvalidKey` when the key is empty.
    pub fn new(
        client: Arc<dyn KvClient>,
        key: impl Into<String>,
        use_json: bool,
    ) -> CollectionResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(CollectionError::InvalidKey);
        }
        Ok(Self {
            client,
            key,
            codec: codec_for(use_json),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn uses_json(&self) -> bool {
        self.codec.is_json()
    }

    pub(crate) fn codec(&self) -> &dyn ValueCodec {
        self.codec.as_ref()
    }

    pub(crate) fn client(&self) -> &Arc<dyn KvClient> {
        &self.client
    }

    /// Send one command built against the stored key
    ///
    /// `build` receives the key and returns the command, so a bare
    /// constructor such as `Command::llen` can be passed directly. Errors
    /// from the client propagate unchanged.
    pub async fn dispatch<F>(&self, build: F) -> CollectionResult<Reply>
    where
        F: FnOnce(&str) -> Command,
    {
        let command = build(&self.key);
        Ok(self.client.execute(command).await?)
    }

    /// Delete the whole remote collection; returns 0 or 1
    pub async fn remove_key(&self) -> CollectionResult<u64> {
        Ok(self.dispatch(Command::del).await?.into_count()?)
    }

    /// Whether the remote collection currently exists
    pub async fn exists(&self) -> CollectionResult<bool> {
        Ok(self.dispatch(Command::exists).await?.into_bool()?)
    }

    /// Set a time-to-live on the remote collection
    pub async fn expire(&self, seconds: u64) -> CollectionResult<bool> {
        Ok(self
            .dispatch(|key| Command::expire(key, seconds))
            .await?
            .into_bool()?)
    }

    pub(crate) fn encode(&self, value: Value) -> String {
        self.codec.encode(&value)
    }

    pub(crate) fn encode_all<I, V>(&self, values: I) -> Vec<String>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        values.into_iter().map(|v| self.encode(v.into())).collect()
    }
}
