//! Binding helper: adapters pre-bound to one client
//!
//! ```rust
//! use kv_collections::{Collections, MemoryClient};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> kv_collections::CollectionResult<()> {
//! let collections = Collections::new(Arc::new(MemoryClient::new()));
//!
//! let queue = collections.list("jobs", true)?;
//! queue.push([serde_json::json!({"id": 1})]).await?;
//!
//! let tags = collections.set("tags")?;
//! tags.add(["rust", "async"]).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::client::KvClient;
use crate::error::{CollectionError, CollectionResult};
use crate::hash::RedisHash;
use crate::list::RedisList;
use crate::set::RedisSet;

/// Factory for adapters sharing one client
#[derive(Clone)]
pub struct Collections {
    client: Arc<dyn KvClient>,
}

impl Collections {
    pub fn new(client: Arc<dyn KvClient>) -> Self {
        Self { client }
    }

    pub fn builder() -> CollectionsBuilder {
        CollectionsBuilder::default()
    }

    pub fn client(&self) -> &Arc<dyn KvClient> {
        &self.client
    }

    pub fn list(&self, key: impl Into<String>, use_json: bool) -> CollectionResult<RedisList> {
        RedisList::new(Arc::clone(&self.client), key, use_json)
    }

    pub fn hash(&self, key: impl Into<String>, use_json: bool) -> CollectionResult<RedisHash> {
        RedisHash::new(Arc::clone(&self.client), key, use_json)
    }

    pub fn set(&self, key: impl Into<String>) -> CollectionResult<RedisSet> {
        RedisSet::new(Arc::clone(&self.client), key)
    }
}

/// Builder for [`Collections`] when the client is wired in later
#[derive(Default)]
pub struct CollectionsBuilder {
    client: Option<Arc<dyn KvClient>>,
}

impl CollectionsBuilder {
    pub fn client(mut self, client: Arc<dyn KvClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Fails with `InvalidClient` when no client was supplied
    pub fn build(self) -> CollectionResult<Collections> {
        self.client
            .map(Collections::new)
            .ok_or_else(|| CollectionError::InvalidClient("no client supplied".to_string()))
    }
}
