//! Hash adapter: Map-style methods over a remote hash

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::{Command, KvClient};
use crate::error::CollectionResult;
use crate::wrapper::Wrapper;

/// Handle on a remote hash
#[derive(Debug, Clone)]
pub struct RedisHash {
    base: Wrapper,
}

impl RedisHash {
    pub fn new(
        client: Arc<dyn KvClient>,
        key: impl Into<String>,
        use_json: bool,
    ) -> CollectionResult<Self> {
        Ok(Self {
            base: Wrapper::new(client, key, use_json)?,
        })
    }

    pub fn base(&self) -> &Wrapper {
        &self.base
    }

    pub fn key(&self) -> &str {
        self.base.key()
    }

    pub async fn remove_key(&self) -> CollectionResult<u64> {
        self.base.remove_key().await
    }

    /// Number of fields
    pub async fn size(&self) -> CollectionResult<u64> {
        Ok(self.base.dispatch(Command::hlen).await?.into_count()?)
    }

    /// Field names, in no particular order
    pub async fn keys(&self) -> CollectionResult<Vec<String>> {
        Ok(self.base.dispatch(Command::hkeys).await?.into_strings()?)
    }

    /// Field values, in no particular order
    pub async fn values(&self) -> CollectionResult<Vec<Value>> {
        let texts = self.base.dispatch(Command::hvals).await?.into_strings()?;
        self.base.codec().decode_each(texts)
    }

    pub async fn has(&self, field: impl Into<String>) -> CollectionResult<bool> {
        let field = field.into();
        Ok(self
            .base
            .dispatch(|key| Command::hexists(key, field))
            .await?
            .into_bool()?)
    }

    /// Upsert one field; returns `true` when the field was created
    pub async fn set(&self, field: impl Into<String>, value: impl Into<Value>) -> CollectionResult<bool> {
        let entry = (field.into(), self.base.encode(value.into()));
        Ok(self
            .base
            .dispatch(|key| Command::hset(key, vec![entry]))
            .await?
            .into_bool()?)
    }

    /// Set a field only if it does not exist yet
    pub async fn set_if_absent(
        &self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> CollectionResult<bool> {
        let field = field.into();
        let value = self.base.encode(value.into());
        Ok(self
            .base
            .dispatch(|key| Command::hsetnx(key, field, value))
            .await?
            .into_bool()?)
    }

    pub async fn get(&self, field: impl Into<String>) -> CollectionResult<Option<Value>> {
        let field = field.into();
        let text = self
            .base
            .dispatch(|key| Command::hget(key, field))
            .await?
            .into_optional_string()?;
        self.base.codec().decode_optional(text)
    }

    /// Remove one field; returns the number removed
    pub async fn delete(&self, field: impl Into<String>) -> CollectionResult<u64> {
        let field = field.into();
        Ok(self
            .base
            .dispatch(|key| Command::hdel(key, vec![field]))
            .await?
            .into_count()?)
    }

    /// Values aligned with `fields`, `None` for each missing field
    pub async fn get_mul<I, S>(&self, fields: I) -> CollectionResult<Vec<Option<Value>>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let texts = self
            .base
            .dispatch(|key| Command::hmget(key, fields))
            .await?
            .into_optional_strings()?;
        self.base.codec().decode_each_optional(texts)
    }

    /// Upsert every entry; returns the number of fields created
    pub async fn set_mul<I, K, V>(&self, mapping: I) -> CollectionResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mapping: HashMap<String, Value> = mapping
            .into_iter()
            .map(|(field, value)| (field.into(), value.into()))
            .collect();
        if mapping.is_empty() {
            return Ok(0);
        }
        let entries: Vec<(String, String)> =
            self.base.codec().encode_mapping_values(&mapping).into_iter().collect();
        Ok(self
            .base
            .dispatch(|key| Command::hset(key, entries))
            .await?
            .into_count()?)
    }

    /// Full field → value mapping; empty when the hash is absent
    pub async fn get_all(&self) -> CollectionResult<HashMap<String, Value>> {
        let mapping = self.base.dispatch(Command::hgetall).await?.into_map()?;
        self.base.codec().decode_mapping_values(mapping)
    }

    /// `get_all` as `(field, value)` pairs
    pub async fn entries(&self) -> CollectionResult<Vec<(String, Value)>> {
        Ok(self.get_all().await?.into_iter().collect())
    }

    /// Add `delta` to an integer field, creating it at 0 first
    pub async fn incr_by(&self, field: impl Into<String>, delta: i64) -> CollectionResult<i64> {
        let field = field.into();
        Ok(self
            .base
            .dispatch(|key| Command::hincrby(key, field, delta))
            .await?
            .into_integer()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryClient;
    use crate::error::{ClientError, CollectionError};
    use serde_json::json;

    fn hash(use_json: bool) -> RedisHash {
        RedisHash::new(Arc::new(MemoryClient::new()), "hash", use_json).unwrap()
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let hash = hash(false);
        assert!(hash.set("name", "ada").await.unwrap());
        assert!(!hash.set("name", "grace").await.unwrap());
        assert_eq!(hash.get("name").await.unwrap(), Some(json!("grace")));
        assert_eq!(hash.delete("name").await.unwrap(), 1);
        assert_eq!(hash.delete("name").await.unwrap(), 0);
        assert_eq!(hash.get("name").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_has_is_boolean() {
        let hash = hash(false);
        assert!(!hash.has("missing").await.unwrap());
        hash.set("present", "1").await.unwrap();
        assert!(hash.has("present").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_mul_aligns_with_fields() {
        let hash = hash(true);
        hash.set_mul([("a", json!(1)), ("c", json!({"x": true}))]).await.unwrap();
        let values = hash.get_mul(["a", "b", "c"]).await.unwrap();
        assert_eq!(values, vec![Some(json!(1)), None, Some(json!({"x": true}))]);
    }

    #[tokio::test]
    async fn test_keys_values_size() {
        let hash = hash(false);
        hash.set_mul([("a", "1"), ("b", "2")]).await.unwrap();
        assert_eq!(hash.size().await.unwrap(), 2);

        let mut keys = hash.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);

        let mut values: Vec<String> = hash
            .values()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        values.sort();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_entries_on_absent_hash() {
        let hash = hash(true);
        assert!(hash.entries().await.unwrap().is_empty());
        assert!(hash.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_if_absent() {
        let hash = hash(false);
        assert!(hash.set_if_absent("lock", "a").await.unwrap());
        assert!(!hash.set_if_absent("lock", "b").await.unwrap());
        assert_eq!(hash.get("lock").await.unwrap(), Some(json!("a")));
    }

    #[tokio::test]
    async fn test_incr_by() {
        let hash = hash(false);
        assert_eq!(hash.incr_by("hits", 5).await.unwrap(), 5);
        assert_eq!(hash.incr_by("hits", -2).await.unwrap(), 3);

        hash.set("name", "ada").await.unwrap();
        let result = hash.incr_by("name", 1).await;
        assert!(matches!(result, Err(CollectionError::Client(ClientError::Response(_)))));
    }

    #[tokio::test]
    async fn test_decode_error_on_raw_data() {
        let client: Arc<dyn KvClient> = Arc::new(MemoryClient::new());
        let raw = RedisHash::new(Arc::clone(&client), "h", false).unwrap();
        let json = RedisHash::new(client, "h", true).unwrap();

        raw.set("f", "not json").await.unwrap();
        assert!(matches!(json.get("f").await, Err(CollectionError::Decode(_))));
    }
}
