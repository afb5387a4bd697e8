//! MemoryClient: in-process key-value store
//!
//! Implements the list, hash and set commands with the store's reply
//! conventions (nil for missing elements, empty collections are removed,
//! WRONGTYPE on type mismatch). No network overhead; ideal for tests and
//! embedded applications.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::seq::IteratorRandom;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::client::{Command, InsertPosition, KvClient, Reply, Session};
use crate::error::ClientResult;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";
const NO_SUCH_KEY: &str = "ERR no such key";
const OUT_OF_RANGE: &str = "ERR index out of range";
const NOT_AN_INTEGER: &str = "ERR hash value is not an integer";

#[derive(Debug, Clone)]
enum Entry {
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
    Set(HashSet<String>),
}

impl Entry {
    fn is_empty(&self) -> bool {
        match self {
            Entry::List(items) => items.is_empty(),
            Entry::Hash(fields) => fields.is_empty(),
            Entry::Set(members) => members.is_empty(),
        }
    }
}

/// Resolve a closed `[start, stop]` range with negative indices into a
/// half-open slice range, or `None` when it selects nothing
fn range_bounds(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start >= len || start > stop {
        None
    } else {
        Some((start as usize, stop as usize + 1))
    }
}

fn element_index(len: usize, index: i64) -> Option<usize> {
    let idx = if index < 0 { len as i64 + index } else { index };
    if idx >= 0 && idx < len as i64 {
        Some(idx as usize)
    } else {
        None
    }
}

fn bulk_array(items: impl IntoIterator<Item = String>) -> Reply {
    Reply::Array(items.into_iter().map(Reply::Bulk).collect())
}

/// Reply plus whether the key was actually modified
type Applied = Result<(Reply, bool), String>;

fn observed(reply: Reply) -> Applied {
    Ok((reply, false))
}

fn written(reply: Reply, modified: bool) -> Applied {
    Ok((reply, modified))
}

/// WATCH bookkeeping
///
/// Every modification advances `sequence`. A key's stamp records the
/// sequence of its last modification and only exists while at least one
/// session watches the key.
#[derive(Debug, Default)]
struct Watches {
    sequence: u64,
    watchers: HashMap<String, usize>,
    stamps: HashMap<String, u64>,
}

impl Watches {
    /// Register a watcher; returns the sequence to compare against at EXEC
    fn watch(&mut self, key: &str) -> u64 {
        *self.watchers.entry(key.to_string()).or_insert(0) += 1;
        self.sequence
    }

    fn unwatch(&mut self, key: &str) {
        if let Some(count) = self.watchers.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.watchers.remove(key);
                self.stamps.remove(key);
            }
        }
    }

    fn touch(&mut self, key: &str) {
        self.sequence += 1;
        if self.watchers.contains_key(key) {
            self.stamps.insert(key.to_string(), self.sequence);
        }
    }

    fn changed_since(&self, key: &str, since: u64) -> bool {
        self.stamps.get(key).map(|stamp| *stamp > since).unwrap_or(false)
    }
}

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
    expirations: HashMap<String, Instant>,
    watches: Arc<Mutex<Watches>>,
}

impl Keyspace {
    fn drop_expired(&mut self, key: &str) {
        self.expirations.remove(key);
        if self.entries.remove(key).is_some() {
            self.watches.lock().touch(key);
        }
    }

    fn purge_if_expired(&mut self, key: &str) {
        let expired = self
            .expirations
            .get(key)
            .map(|deadline| *deadline <= Instant::now())
            .unwrap_or(false);
        if expired {
            self.drop_expired(key);
        }
    }

    /// Remove every key whose TTL has passed
    fn purge_expired(&mut self) {
        let now = Instant::now();
        let expired: Vec<String> = self
            .expirations
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.drop_expired(&key);
        }
    }

    fn remove(&mut self, key: &str) -> bool {
        self.expirations.remove(key);
        self.entries.remove(key).is_some()
    }

    fn list(&self, key: &str) -> Result<Option<&VecDeque<String>>, String> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::List(items)) => Ok(Some(items)),
            Some(_) => Err(WRONGTYPE.to_string()),
        }
    }

    fn list_mut(&mut self, key: &str) -> Result<Option<&mut VecDeque<String>>, String> {
        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Entry::List(items)) => Ok(Some(items)),
            Some(_) => Err(WRONGTYPE.to_string()),
        }
    }

    fn list_or_create(&mut self, key: &str) -> Result<&mut VecDeque<String>, String> {
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()))
        {
            Entry::List(items) => Ok(items),
            _ => Err(WRONGTYPE.to_string()),
        }
    }

    fn hash(&self, key: &str) -> Result<Option<&HashMap<String, String>>, String> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Hash(fields)) => Ok(Some(fields)),
            Some(_) => Err(WRONGTYPE.to_string()),
        }
    }

    fn hash_mut(&mut self, key: &str) -> Result<Option<&mut HashMap<String, String>>, String> {
        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Entry::Hash(fields)) => Ok(Some(fields)),
            Some(_) => Err(WRONGTYPE.to_string()),
        }
    }

    fn hash_or_create(&mut self, key: &str) -> Result<&mut HashMap<String, String>, String> {
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(HashMap::new()))
        {
            Entry::Hash(fields) => Ok(fields),
            _ => Err(WRONGTYPE.to_string()),
        }
    }

    fn set(&self, key: &str) -> Result<Option<&HashSet<String>>, String> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Entry::Set(members)) => Ok(Some(members)),
            Some(_) => Err(WRONGTYPE.to_string()),
        }
    }

    fn set_mut(&mut self, key: &str) -> Result<Option<&mut HashSet<String>>, String> {
        match self.entries.get_mut(key) {
            None => Ok(None),
            Some(Entry::Set(members)) => Ok(Some(members)),
            Some(_) => Err(WRONGTYPE.to_string()),
        }
    }

    fn set_or_create(&mut self, key: &str) -> Result<&mut HashSet<String>, String> {
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(HashSet::new()))
        {
            Entry::Set(members) => Ok(members),
            _ => Err(WRONGTYPE.to_string()),
        }
    }

    /// Apply one command; error replies are returned as `Reply::Error`
    ///
    /// Only commands that change the key mark it for watching sessions.
    fn apply(&mut self, command: Command) -> Reply {
        let key = command.key().to_string();
        let is_write = command.is_write();
        if is_write {
            self.purge_expired();
        } else {
            self.purge_if_expired(&key);
        }

        let (reply, modified) = match self.dispatch(command) {
            Ok(applied) => applied,
            Err(msg) => (Reply::Error(msg), false),
        };

        if is_write && self.entries.get(&key).map(Entry::is_empty).unwrap_or(false) {
            self.remove(&key);
        }
        if modified {
            self.watches.lock().touch(&key);
        }
        reply
    }

    fn dispatch(&mut self, command: Command) -> Applied {
        match command {
            Command::Del { key } => {
                let removed = self.remove(&key);
                written(Reply::Integer(removed as i64), removed)
            }
            Command::Exists { key } => {
                observed(Reply::Integer(self.entries.contains_key(&key) as i64))
            }
            Command::Expire { key, seconds } => {
                if !self.entries.contains_key(&key) {
                    return observed(Reply::Integer(0));
                }
                if seconds == 0 {
                    self.remove(&key);
                } else {
                    self.expirations
                        .insert(key, Instant::now() + Duration::from_secs(seconds));
                }
                written(Reply::Integer(1), true)
            }
            Command::LLen { key } => {
                observed(Reply::Integer(self.list(&key)?.map(|l| l.len()).unwrap_or(0) as i64))
            }
            Command::LPop { key } => {
                let popped = self.list_mut(&key)?.and_then(|l| l.pop_front());
                let modified = popped.is_some();
                written(popped.map(Reply::Bulk).unwrap_or(Reply::Nil), modified)
            }
            Command::RPop { key } => {
                let popped = self.list_mut(&key)?.and_then(|l| l.pop_back());
                let modified = popped.is_some();
                written(popped.map(Reply::Bulk).unwrap_or(Reply::Nil), modified)
            }
            Command::LPush { key, elements } => {
                let modified = !elements.is_empty();
                let list = self.list_or_create(&key)?;
                for element in elements {
                    list.push_front(element);
                }
                written(Reply::Integer(list.len() as i64), modified)
            }
            Command::RPush { key, elements } => {
                let modified = !elements.is_empty();
                let list = self.list_or_create(&key)?;
                list.extend(elements);
                written(Reply::Integer(list.len() as i64), modified)
            }
            Command::LRange { key, start, stop } => {
                let items = match self.list(&key)? {
                    Some(list) => match range_bounds(list.len(), start, stop) {
                        Some((from, to)) => list.range(from..to).cloned().collect(),
                        None => Vec::new(),
                    },
                    None => Vec::new(),
                };
                observed(bulk_array(items))
            }
            Command::LInsert {
                key,
                position,
                pivot,
                element,
            } => {
                let list = match self.list_mut(&key)? {
                    Some(list) => list,
                    None => return observed(Reply::Integer(0)),
                };
                match list.iter().position(|item| *item == pivot) {
                    Some(at) => {
                        let at = match position {
                            InsertPosition::Before => at,
                            InsertPosition::After => at + 1,
                        };
                        list.insert(at, element);
                        written(Reply::Integer(list.len() as i64), true)
                    }
                    None => observed(Reply::Integer(-1)),
                }
            }
            Command::LIndex { key, index } => observed(
                self.list(&key)?
                    .and_then(|list| element_index(list.len(), index).map(|i| list[i].clone()))
                    .map(Reply::Bulk)
                    .unwrap_or(Reply::Nil),
            ),
            Command::LSet { key, index, element } => {
                let list = self.list_mut(&key)?.ok_or_else(|| NO_SUCH_KEY.to_string())?;
                let at = element_index(list.len(), index).ok_or_else(|| OUT_OF_RANGE.to_string())?;
                list[at] = element;
                written(Reply::Okay, true)
            }
            Command::LTrim { key, start, stop } => {
                let mut modified = false;
                if let Some(list) = self.list_mut(&key)? {
                    let before = list.len();
                    match range_bounds(before, start, stop) {
                        Some((from, to)) => {
                            list.truncate(to);
                            list.drain(..from);
                        }
                        None => list.clear(),
                    }
                    modified = list.len() != before;
                }
                written(Reply::Okay, modified)
            }
            Command::LRem { key, count, element } => {
                let list = match self.list_mut(&key)? {
                    Some(list) => list,
                    None => return observed(Reply::Integer(0)),
                };
                let mut removed = 0i64;
                if count == 0 {
                    let before = list.len();
                    list.retain(|item| *item != element);
                    removed = (before - list.len()) as i64;
                } else if count > 0 {
                    let mut i = 0;
                    while i < list.len() && removed < count {
                        if list[i] == element {
                            list.remove(i);
                            removed += 1;
                        } else {
                            i += 1;
                        }
                    }
                } else {
                    let mut i = list.len();
                    while i > 0 && removed < -count {
                        i -= 1;
                        if list[i] == element {
                            list.remove(i);
                            removed += 1;
                        }
                    }
                }
                written(Reply::Integer(removed), removed > 0)
            }

            Command::HLen { key } => {
                observed(Reply::Integer(self.hash(&key)?.map(|h| h.len()).unwrap_or(0) as i64))
            }
            Command::HKeys { key } => observed(bulk_array(
                self.hash(&key)?.map(|h| h.keys().cloned().collect::<Vec<_>>()).unwrap_or_default(),
            )),
            Command::HVals { key } => observed(bulk_array(
                self.hash(&key)?.map(|h| h.values().cloned().collect::<Vec<_>>()).unwrap_or_default(),
            )),
            Command::HExists { key, field } => observed(Reply::Integer(
                self.hash(&key)?.map(|h| h.contains_key(&field)).unwrap_or(false) as i64,
            )),
            Command::HSet { key, entries } => {
                let modified = !entries.is_empty();
                let fields = self.hash_or_create(&key)?;
                let added = entries
                    .into_iter()
                    .filter(|(field, value)| fields.insert(field.clone(), value.clone()).is_none())
                    .count();
                written(Reply::Integer(added as i64), modified)
            }
            Command::HSetNx { key, field, value } => {
                let fields = self.hash_or_create(&key)?;
                if fields.contains_key(&field) {
                    observed(Reply::Integer(0))
                } else {
                    fields.insert(field, value);
                    written(Reply::Integer(1), true)
                }
            }
            Command::HGet { key, field } => observed(
                self.hash(&key)?
                    .and_then(|h| h.get(&field).cloned())
                    .map(Reply::Bulk)
                    .unwrap_or(Reply::Nil),
            ),
            Command::HDel { key, fields } => {
                let removed = match self.hash_mut(&key)? {
                    Some(hash) => fields.iter().filter(|f| hash.remove(*f).is_some()).count(),
                    None => 0,
                };
                written(Reply::Integer(removed as i64), removed > 0)
            }
            Command::HMGet { key, fields } => {
                let hash = self.hash(&key)?;
                observed(Reply::Array(
                    fields
                        .iter()
                        .map(|f| {
                            hash.and_then(|h| h.get(f).cloned())
                                .map(Reply::Bulk)
                                .unwrap_or(Reply::Nil)
                        })
                        .collect(),
                ))
            }
            Command::HGetAll { key } => {
                let flat = self
                    .hash(&key)?
                    .map(|h| {
                        h.iter()
                            .flat_map(|(f, v)| [f.clone(), v.clone()])
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                observed(bulk_array(flat))
            }
            Command::HIncrBy { key, field, delta } => {
                let fields = self.hash_or_create(&key)?;
                let current = match fields.get(&field) {
                    Some(v) => v.parse::<i64>().map_err(|_| NOT_AN_INTEGER.to_string())?,
                    None => 0,
                };
                let next = current
                    .checked_add(delta)
                    .ok_or_else(|| "ERR increment or decrement would overflow".to_string())?;
                fields.insert(field, next.to_string());
                written(Reply::Integer(next), true)
            }

            Command::SAdd { key, members } => {
                let set = self.set_or_create(&key)?;
                let added = members.into_iter().filter(|m| set.insert(m.clone())).count();
                written(Reply::Integer(added as i64), added > 0)
            }
            Command::SCard { key } => {
                observed(Reply::Integer(self.set(&key)?.map(|s| s.len()).unwrap_or(0) as i64))
            }
            Command::SIsMember { key, member } => observed(Reply::Integer(
                self.set(&key)?.map(|s| s.contains(&member)).unwrap_or(false) as i64,
            )),
            Command::SMembers { key } => observed(bulk_array(
                self.set(&key)?.map(|s| s.iter().cloned().collect::<Vec<_>>()).unwrap_or_default(),
            )),
            Command::SPop { key, count } => {
                let popped = match self.set_mut(&key)? {
                    Some(set) => {
                        let picked: Vec<String> = set
                            .iter()
                            .cloned()
                            .choose_multiple(&mut rand::thread_rng(), count as usize);
                        for member in &picked {
                            set.remove(member);
                        }
                        picked
                    }
                    None => Vec::new(),
                };
                let modified = !popped.is_empty();
                written(bulk_array(popped), modified)
            }
            Command::SRem { key, members } => {
                let removed = match self.set_mut(&key)? {
                    Some(set) => members.iter().filter(|m| set.remove(*m)).count(),
                    None => 0,
                };
                written(Reply::Integer(removed as i64), removed > 0)
            }
        }
    }
}

/// In-process client backed by a shared keyspace.
///
/// Clones share the same keyspace, so several handles behave like several
/// connections to one server.
#[derive(Clone, Default)]
pub struct MemoryClient {
    keyspace: Arc<RwLock<Keyspace>>,
}

impl MemoryClient {
    /// Create a client over a fresh, empty keyspace
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys; expired keys are swept first
    pub async fn key_count(&self) -> usize {
        let mut keyspace = self.keyspace.write().await;
        keyspace.purge_expired();
        keyspace.entries.len()
    }
}

#[async_trait]
impl KvClient for MemoryClient {
    async fn execute(&self, command: Command) -> ClientResult<Reply> {
        debug!("Executing {} on '{}'", command.name(), command.key());
        let mut keyspace = self.keyspace.write().await;
        keyspace.apply(command).into_result()
    }

    async fn session(&self) -> ClientResult<Box<dyn Session>> {
        let watches = Arc::clone(&self.keyspace.read().await.watches);
        Ok(Box::new(MemorySession {
            keyspace: Arc::clone(&self.keyspace),
            watches,
            watched: Vec::new(),
        }))
    }
}

struct MemorySession {
    keyspace: Arc<RwLock<Keyspace>>,
    watches: Arc<Mutex<Watches>>,
    // (key, sequence at WATCH time)
    watched: Vec<(String, u64)>,
}

#[async_trait]
impl Session for MemorySession {
    async fn watch(&mut self, key: &str) -> ClientResult<()> {
        // Held so no write is half applied while the sequence is read
        let _keyspace = self.keyspace.read().await;
        let since = self.watches.lock().watch(key);
        debug!("WATCH '{}' at sequence {}", key, since);
        self.watched.push((key.to_string(), since));
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> ClientResult<Reply> {
        debug!("Executing {} on '{}' (session)", command.name(), command.key());
        let mut keyspace = self.keyspace.write().await;
        keyspace.apply(command).into_result()
    }

    async fn exec(&mut self, commands: Vec<Command>) -> ClientResult<Option<Vec<Reply>>> {
        let mut keyspace = self.keyspace.write().await;
        let watched = std::mem::take(&mut self.watched);

        let conflict = {
            let mut watches = self.watches.lock();
            let conflict = watched
                .iter()
                .find(|(key, since)| watches.changed_since(key, *since))
                .map(|(key, _)| key.clone());
            for (key, _) in &watched {
                watches.unwatch(key);
            }
            conflict
        };

        if let Some(key) = conflict {
            warn!("EXEC aborted: watched key '{}' changed", key);
            return Ok(None);
        }

        debug!("EXEC {} queued commands", commands.len());
        Ok(Some(commands.into_iter().map(|c| keyspace.apply(c)).collect()))
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if self.watched.is_empty() {
            return;
        }
        let mut watches = self.watches.lock();
        for (key, _) in self.watched.drain(..) {
            watches.unwatch(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_range_bounds() {
        assert_eq!(range_bounds(5, 0, -1), Some((0, 5)));
        assert_eq!(range_bounds(5, 1, 2), Some((1, 3)));
        assert_eq!(range_bounds(5, -2, -1), Some((3, 5)));
        assert_eq!(range_bounds(5, 3, 100), Some((3, 5)));
        assert_eq!(range_bounds(5, -100, 0), Some((0, 1)));
        assert_eq!(range_bounds(5, 4, 2), None);
        assert_eq!(range_bounds(5, 5, -1), None);
        assert_eq!(range_bounds(0, 0, -1), None);
    }

    #[test]
    fn test_element_index() {
        assert_eq!(element_index(3, 0), Some(0));
        assert_eq!(element_index(3, -1), Some(2));
        assert_eq!(element_index(3, 3), None);
        assert_eq!(element_index(3, -4), None);
    }

    #[tokio::test]
    async fn test_lpush_prepends_one_at_a_time() {
        let client = MemoryClient::new();
        client.execute(Command::lpush("l", strings(&["a", "b"]))).await.unwrap();
        let items = client
            .execute(Command::lrange("l", 0, -1))
            .await
            .unwrap()
            .into_strings()
            .unwrap();
        assert_eq!(items, strings(&["b", "a"]));
    }

    #[tokio::test]
    async fn test_lset_errors() {
        let client = MemoryClient::new();
        let missing = client.execute(Command::lset("l", 0, "x".to_string())).await;
        assert!(matches!(missing, Err(ClientError::Response(ref m)) if m == NO_SUCH_KEY));

        client.execute(Command::rpush("l", strings(&["a"]))).await.unwrap();
        let out_of_range = client.execute(Command::lset("l", 1, "x".to_string())).await;
        assert!(matches!(out_of_range, Err(ClientError::Response(ref m)) if m == OUT_OF_RANGE));
    }

    #[tokio::test]
    async fn test_empty_collections_are_removed() {
        let client = MemoryClient::new();
        client.execute(Command::rpush("l", strings(&["a"]))).await.unwrap();
        assert_eq!(client.key_count().await, 1);
        client.execute(Command::rpop("l")).await.unwrap();
        assert_eq!(client.key_count().await, 0);
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let client = MemoryClient::new();
        client.execute(Command::sadd("k", strings(&["a"]))).await.unwrap();
        let result = client.execute(Command::llen("k")).await;
        assert!(matches!(result, Err(ClientError::Response(ref m)) if m.starts_with("WRONGTYPE")));
    }

    #[tokio::test]
    async fn test_lrem_directions() {
        let client = MemoryClient::new();
        client
            .execute(Command::rpush("l", strings(&["x", "a", "x", "b", "x"])))
            .await
            .unwrap();
        let removed = client
            .execute(Command::lrem("l", -2, "x".to_string()))
            .await
            .unwrap()
            .into_integer()
            .unwrap();
        assert_eq!(removed, 2);
        let items = client
            .execute(Command::lrange("l", 0, -1))
            .await
            .unwrap()
            .into_strings()
            .unwrap();
        assert_eq!(items, strings(&["x", "a", "b"]));
    }

    #[tokio::test]
    async fn test_expire_zero_deletes() {
        let client = MemoryClient::new();
        client.execute(Command::sadd("s", strings(&["a"]))).await.unwrap();
        let applied = client.execute(Command::expire("s", 0)).await.unwrap().into_bool().unwrap();
        assert!(applied);
        assert_eq!(client.key_count().await, 0);
    }

    #[tokio::test]
    async fn test_watch_aborts_on_concurrent_write() {
        let client = MemoryClient::new();
        client.execute(Command::rpush("l", strings(&["a"]))).await.unwrap();

        let mut session = client.session().await.unwrap();
        session.watch("l").await.unwrap();

        // Another handle writes between WATCH and EXEC
        client.execute(Command::rpush("l", strings(&["b"]))).await.unwrap();

        let result = session.exec(vec![Command::del("l")]).await.unwrap();
        assert!(result.is_none());
        assert_eq!(client.key_count().await, 1);
    }

    #[tokio::test]
    async fn test_exec_commits_when_untouched() {
        let client = MemoryClient::new();
        let mut session = client.session().await.unwrap();
        session.watch("l").await.unwrap();

        let replies = session
            .exec(vec![
                Command::rpush("l", strings(&["a", "b"])),
                Command::lset("l", 5, "x".to_string()),
                Command::llen("l"),
            ])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replies[0], Reply::Integer(2));
        assert_eq!(replies[1], Reply::Error(OUT_OF_RANGE.to_string()));
        assert_eq!(replies[2], Reply::Integer(2));
    }

    #[tokio::test]
    async fn test_failed_and_noop_writes_keep_watch() {
        let client = MemoryClient::new();
        client.execute(Command::rpush("l", strings(&["a"]))).await.unwrap();

        let mut session = client.session().await.unwrap();
        session.watch("l").await.unwrap();
        session.watch("nokey").await.unwrap();

        assert!(client.execute(Command::lset("l", 9, "x".to_string())).await.is_err());
        assert!(client.execute(Command::sadd("l", strings(&["x"]))).await.is_err());
        client.execute(Command::lrem("l", 0, "zzz".to_string())).await.unwrap();
        client.execute(Command::ltrim("l", 0, -1)).await.unwrap();
        client.execute(Command::del("nokey")).await.unwrap();
        client.execute(Command::expire("nokey", 10)).await.unwrap();
        client.execute(Command::srem("nokey", strings(&["a"]))).await.unwrap();

        let replies = session
            .exec(vec![Command::rpush("l", strings(&["b"]))])
            .await
            .unwrap();
        assert_eq!(replies, Some(vec![Reply::Integer(2)]));
    }

    #[tokio::test]
    async fn test_watch_sees_deletion() {
        let client = MemoryClient::new();
        client.execute(Command::sadd("s", strings(&["a"]))).await.unwrap();

        let mut session = client.session().await.unwrap();
        session.watch("s").await.unwrap();
        client.execute(Command::del("s")).await.unwrap();

        assert!(session.exec(vec![Command::scard("s")]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unwatched_writes_leave_no_stamps() {
        let client = MemoryClient::new();
        for i in 0..1000 {
            let key = format!("k{}", i);
            client.execute(Command::sadd(&key, strings(&["a"]))).await.unwrap();
            client.execute(Command::del(&key)).await.unwrap();
        }

        let watches = Arc::clone(&client.keyspace.read().await.watches);
        assert!(watches.lock().stamps.is_empty());
        assert_eq!(client.key_count().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_release_watches() {
        let client = MemoryClient::new();
        let watches = Arc::clone(&client.keyspace.read().await.watches);

        let mut committed = client.session().await.unwrap();
        committed.watch("l").await.unwrap();
        client.execute(Command::rpush("l", strings(&["a"]))).await.unwrap();
        assert_eq!(watches.lock().stamps.len(), 1);
        assert!(committed.exec(vec![Command::llen("l")]).await.unwrap().is_none());
        assert!(watches.lock().watchers.is_empty());
        assert!(watches.lock().stamps.is_empty());

        let mut abandoned = client.session().await.unwrap();
        abandoned.watch("l").await.unwrap();
        client.execute(Command::rpush("l", strings(&["b"]))).await.unwrap();
        drop(abandoned);
        assert!(watches.lock().watchers.is_empty());
        assert!(watches.lock().stamps.is_empty());
    }

    #[tokio::test]
    async fn test_expired_keys_are_swept() {
        let client = MemoryClient::new();
        client.execute(Command::sadd("old", strings(&["a"]))).await.unwrap();
        client.execute(Command::sadd("live", strings(&["a"]))).await.unwrap();
        client
            .keyspace
            .write()
            .await
            .expirations
            .insert("old".to_string(), Instant::now());

        assert_eq!(client.key_count().await, 1);
        assert!(client.keyspace.read().await.expirations.is_empty());
    }
}
