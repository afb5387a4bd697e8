//! Set adapter: Set-style methods over a remote set
//!
//! Members are plain strings; this adapter never transcodes.

use std::sync::Arc;

use crate::client::{Command, KvClient};
use crate::error::CollectionResult;
use crate::wrapper::Wrapper;

/// Handle on a remote set
#[derive(Debug, Clone)]
pub struct RedisSet {
    base: Wrapper,
}

impl RedisSet {
    pub fn new(client: Arc<dyn KvClient>, key: impl Into<String>) -> CollectionResult<Self> {
        Ok(Self {
            base: Wrapper::new(client, key, false)?,
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

    /// Insert members; returns how many were not already present
    pub async fn add<I, S>(&self, members: I) -> CollectionResult<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return Ok(0);
        }
        Ok(self
            .base
            .dispatch(|key| Command::sadd(key, members))
            .await?
            .into_count()?)
    }

    /// Cardinality
    pub async fn size(&self) -> CollectionResult<u64> {
        Ok(self.base.dispatch(Command::scard).await?.into_count()?)
    }

    pub async fn has(&self, member: impl Into<String>) -> CollectionResult<bool> {
        let member = member.into();
        Ok(self
            .base
            .dispatch(|key| Command::sismember(key, member))
            .await?
            .into_bool()?)
    }

    /// All members, in no particular order
    pub async fn values(&self) -> CollectionResult<Vec<String>> {
        Ok(self.base.dispatch(Command::smembers).await?.into_strings()?)
    }

    /// Remove and return up to `count` random members
    pub async fn pop(&self, count: u64) -> CollectionResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .base
            .dispatch(|key| Command::spop(key, count))
            .await?
            .into_strings()?)
    }

    /// Remove and return one random member
    pub async fn pop_one(&self) -> CollectionResult<Option<String>> {
        Ok(self.pop(1).await?.into_iter().next())
    }

    /// Remove members; returns how many were present
    pub async fn delete<I, S>(&self, members: I) -> CollectionResult<u64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return Ok(0);
        }
        Ok(self
            .base
            .dispatch(|key| Command::srem(key, members))
            .await?
            .into_count()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryClient;

    fn set() -> RedisSet {
        RedisSet::new(Arc::new(MemoryClient::new()), "set").unwrap()
    }

    #[tokio::test]
    async fn test_add_counts_new_members() {
        let set = set();
        assert_eq!(set.add(["a", "b", "a"]).await.unwrap(), 2);
        assert_eq!(set.add(["b", "c"]).await.unwrap(), 1);
        assert_eq!(set.size().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_has_and_values() {
        let set = set();
        set.add(["x", "y"]).await.unwrap();
        assert!(set.has("x").await.unwrap());
        assert!(!set.has("z").await.unwrap());

        let mut values = set.values().await.unwrap();
        values.sort();
        assert_eq!(values, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_pop_removes_members() {
        let set = set();
        set.add(["a", "b", "c"]).await.unwrap();

        let popped = set.pop(2).await.unwrap();
        assert_eq!(popped.len(), 2);
        assert_eq!(set.size().await.unwrap(), 1);
        for member in &popped {
            assert!(!set.has(member.as_str()).await.unwrap());
        }

        assert!(set.pop_one().await.unwrap().is_some());
        assert_eq!(set.pop_one().await.unwrap(), None);
        assert!(set.pop(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_counts() {
        let set = set();
        set.add(["a", "b"]).await.unwrap();
        assert_eq!(set.delete(["a", "missing"]).await.unwrap(), 1);
        assert_eq!(set.delete(["a"]).await.unwrap(), 0);
        assert_eq!(set.delete(Vec::<String>::new()).await.unwrap(), 0);
    }
}
