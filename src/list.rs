//! List adapter: Array-style methods over a remote list
//!
//! | Method | Command |
//! |--------|---------|
//! | `length()` | `LLEN` |
//! | `shift()` / `pop()` | `LPOP` / `RPOP` |
//! | `push(els)` | `RPUSH` |
//! | `unshift(els)` | `LPUSH` with the arguments reversed |
//! | `slice(begin, end)` | `LRANGE begin end-1` |
//! | `insert_before` / `insert_after` | `LINSERT` |
//! | `get_element_at` / `set_element_at` | `LINDEX` / `LSET` |
//! | `trim(begin, end)` | `LTRIM` |
//! | `remove(value, count)` | `LREM` |
//! | `splice(start, count, items)` | WATCH + MULTI/EXEC |

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::{Command, InsertPosition, KvClient};
use crate::error::{ClientError, CollectionError, CollectionResult};
use crate::wrapper::Wrapper;

fn tombstone() -> String {
    format!("__kv_collections_tombstone:{}", Uuid::new_v4())
}

/// Clamp a splice start the way `Array.prototype.splice` does
fn splice_start(start: i64, len: i64) -> i64 {
    if start < 0 {
        (len + start).max(0)
    } else {
        start.min(len)
    }
}

/// Handle on a remote list
#[derive(Debug, Clone)]
pub struct RedisList {
    base: Wrapper,
}

impl RedisList {
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

    /// Element count
    pub async fn length(&self) -> CollectionResult<u64> {
        Ok(self.base.dispatch(Command::llen).await?.into_count()?)
    }

    /// Remove and return the first element
    pub async fn shift(&self) -> CollectionResult<Option<Value>> {
        let text = self.base.dispatch(Command::lpop).await?.into_optional_string()?;
        self.base.codec().decode_optional(text)
    }

    /// Remove and return the last element
    pub async fn pop(&self) -> CollectionResult<Option<Value>> {
        let text = self.base.dispatch(Command::rpop).await?.into_optional_string()?;
        self.base.codec().decode_optional(text)
    }

    /// Append elements at the tail in call order; returns the new length
    pub async fn push<I, V>(&self, elements: I) -> CollectionResult<u64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let elements = self.base.encode_all(elements);
        if elements.is_empty() {
            return self.length().await;
        }
        Ok(self
            .base
            .dispatch(|key| Command::rpush(key, elements))
            .await?
            .into_count()?)
    }

    /// Prepend elements keeping their call order at the head
    ///
    /// `unshift([a, b])` leaves `[a, b, ...]`. LPUSH prepends one argument
    /// at a time, so the arguments are sent reversed.
    pub async fn unshift<I, V>(&self, elements: I) -> CollectionResult<u64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut elements = self.base.encode_all(elements);
        if elements.is_empty() {
            return self.length().await;
        }
        elements.reverse();
        Ok(self
            .base
            .dispatch(|key| Command::lpush(key, elements))
            .await?
            .into_count()?)
    }

    /// Half-open `[begin, end)` sub-sequence; negative indices count from the tail
    ///
    /// `end = None` runs to the tail.
    pub async fn slice(&self, begin: i64, end: Option<i64>) -> CollectionResult<Vec<Value>> {
        let stop = match end {
            None => -1,
            // LRANGE would read `0 - 1` as the tail
            Some(0) => return Ok(Vec::new()),
            Some(end) => match end.checked_sub(1) {
                Some(stop) => stop,
                None => return Ok(Vec::new()),
            },
        };
        let texts = self
            .base
            .dispatch(|key| Command::lrange(key, begin, stop))
            .await?
            .into_strings()?;
        self.base.codec().decode_each(texts)
    }

    /// Every element, head to tail
    pub async fn to_vec(&self) -> CollectionResult<Vec<Value>> {
        self.slice(0, None).await
    }

    async fn insert(
        &self,
        position: InsertPosition,
        pivot: Value,
        element: Value,
    ) -> CollectionResult<Option<u64>> {
        let pivot = self.base.encode(pivot);
        let element = self.base.encode(element);
        let len = self
            .base
            .dispatch(|key| Command::linsert(key, position, pivot, element))
            .await?
            .into_integer()?;
        Ok(u64::try_from(len).ok().filter(|n| *n > 0))
    }

    /// Insert after the first element equal to `pivot`
    ///
    /// Returns the new length, or `None` when no element matches.
    pub async fn insert_after(
        &self,
        pivot: impl Into<Value>,
        element: impl Into<Value>,
    ) -> CollectionResult<Option<u64>> {
        self.insert(InsertPosition::After, pivot.into(), element.into()).await
    }

    /// Insert before the first element equal to `pivot`
    ///
    /// Returns the new length, or `None` when no element matches.
    pub async fn insert_before(
        &self,
        pivot: impl Into<Value>,
        element: impl Into<Value>,
    ) -> CollectionResult<Option<u64>> {
        self.insert(InsertPosition::Before, pivot.into(), element.into()).await
    }

    /// Element at `index`, `None` when out of range
    pub async fn get_element_at(&self, index: i64) -> CollectionResult<Option<Value>> {
        let text = self
            .base
            .dispatch(|key| Command::lindex(key, index))
            .await?
            .into_optional_string()?;
        self.base.codec().decode_optional(text)
    }

    /// Overwrite the element at `index`
    ///
    /// Fails with `IndexOutOfRange` when `index` is past the end (or the
    /// list does not exist); the list is left unchanged.
    pub async fn set_element_at(&self, index: i64, value: impl Into<Value>) -> CollectionResult<()> {
        let element = self.base.encode(value.into());
        let reply = self
            .base
            .dispatch(|key| Command::lset(key, index, element))
            .await;
        match reply {
            Ok(reply) => Ok(reply.into_unit()?),
            Err(CollectionError::Client(err)) if err.is_out_of_range() => {
                Err(CollectionError::IndexOutOfRange {
                    key: self.key().to_string(),
                    index,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Keep only the closed range `[begin, end]`
    pub async fn trim(&self, begin: i64, end: i64) -> CollectionResult<()> {
        Ok(self
            .base
            .dispatch(|key| Command::ltrim(key, begin, end))
            .await?
            .into_unit()?)
    }

    /// Remove occurrences of `value`
    ///
    /// `count > 0` removes from the head, `count < 0` from the tail, `0` all.
    pub async fn remove(&self, value: impl Into<Value>, count: i64) -> CollectionResult<u64> {
        let element = self.base.encode(value.into());
        Ok(self
            .base
            .dispatch(|key| Command::lrem(key, count, element))
            .await?
            .into_count()?)
    }

    /// Remove `delete_count` elements at `start` and insert `items` there
    ///
    /// Follows `Array.prototype.splice`: a negative `start` counts from the
    /// tail, `delete_count = None` removes through the end, and the removed
    /// elements are returned. The whole operation runs in one optimistic
    /// transaction on the list's key; if another client modifies the list
    /// first, it fails with `TransactionAborted` and nothing is applied.
    pub async fn splice<I, V>(
        &self,
        start: i64,
        delete_count: Option<u64>,
        items: I,
    ) -> CollectionResult<Vec<Value>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items = self.base.encode_all(items);
        let key = self.key();

        let mut session = self.base.client().session().await?;
        session.watch(key).await?;

        let len = session.execute(Command::llen(key)).await?.into_integer()?;
        let start = splice_start(start, len);
        let available = len - start;
        let count = match delete_count {
            None => available,
            Some(n) => i64::try_from(n).unwrap_or(i64::MAX).min(available),
        };

        let mut commands = Vec::new();
        if count > 0 {
            commands.push(Command::lrange(key, start, start + count - 1));
            let token = tombstone();
            for index in start..start + count {
                commands.push(Command::lset(key, index, token.clone()));
            }
            commands.push(Command::lrem(key, 0, token));
        }

        if !items.is_empty() {
            let remaining = len - count;
            if start == 0 {
                commands.push(Command::lpush(key, items.into_iter().rev().collect()));
            } else if start >= remaining {
                commands.push(Command::rpush(key, items));
            } else {
                // The element before `start` is untouched by the removal; mark
                // it so LINSERT has a unique pivot, then restore it.
                let pivot_index = start - 1;
                let pivot = session
                    .execute(Command::lindex(key, pivot_index))
                    .await?
                    .into_optional_string()?;
                // LLEN said the index exists; a nil here means the list shrank
                // after WATCH, so EXEC would abort anyway
                let pivot = match pivot {
                    Some(pivot) => pivot,
                    None => {
                        warn!("splice '{}' aborted: list shrank before EXEC", key);
                        return Err(CollectionError::TransactionAborted {
                            key: key.to_string(),
                        });
                    }
                };
                let marker = tombstone();
                commands.push(Command::lset(key, pivot_index, marker.clone()));
                for item in items.into_iter().rev() {
                    commands.push(Command::linsert(key, InsertPosition::After, marker.clone(), item));
                }
                commands.push(Command::lset(key, pivot_index, pivot));
            }
        }

        if commands.is_empty() {
            return Ok(Vec::new());
        }

        debug!("splice '{}': start={} count={} ops={}", key, start, count, commands.len());
        let replies = match session.exec(commands).await? {
            Some(replies) => replies,
            None => {
                warn!("splice '{}' aborted by a concurrent write", key);
                return Err(CollectionError::TransactionAborted {
                    key: key.to_string(),
                });
            }
        };

        let mut replies = replies.into_iter();
        let removed = if count > 0 {
            replies
                .next()
                .ok_or_else(|| ClientError::Protocol("missing LRANGE reply".to_string()))?
                .into_strings()?
        } else {
            Vec::new()
        };
        for reply in replies {
            reply.into_result()?;
        }

        self.base.codec().decode_each(removed)
    }
}
