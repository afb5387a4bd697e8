//! Typed command vocabulary
//!
//! Every remote operation the adapters issue is one variant of [`Command`].
//! Constructors take the storage key first so an adapter can bind its key
//! and pass a constructor straight to [`Wrapper::dispatch`](crate::Wrapper::dispatch).

/// Where `LINSERT` places the new element relative to the pivot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Before,
    After,
}

impl InsertPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsertPosition::Before => "BEFORE",
            InsertPosition::After => "AFTER",
        }
    }
}

/// A single key-value store command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Keyspace
    Del { key: String },
    Exists { key: String },
    Expire { key: String, seconds: u64 },

    // Lists
    LLen { key: String },
    LPop { key: String },
    RPop { key: String },
    LPush { key: String, elements: Vec<String> },
    RPush { key: String, elements: Vec<String> },
    LRange { key: String, start: i64, stop: i64 },
    LInsert {
        key: String,
        position: InsertPosition,
        pivot: String,
        element: String,
    },
    LIndex { key: String, index: i64 },
    LSet { key: String, index: i64, element: String },
    LTrim { key: String, start: i64, stop: i64 },
    LRem { key: String, count: i64, element: String },

    // Hashes
    HLen { key: String },
    HKeys { key: String },
    HVals { key: String },
    HExists { key: String, field: String },
    HSet { key: String, entries: Vec<(String, String)> },
    HSetNx { key: String, field: String, value: String },
    HGet { key: String, field: String },
    HDel { key: String, fields: Vec<String> },
    HMGet { key: String, fields: Vec<String> },
    HGetAll { key: String },
    HIncrBy { key: String, field: String, delta: i64 },

    // Sets
    SAdd { key: String, members: Vec<String> },
    SCard { key: String },
    SIsMember { key: String, member: String },
    SMembers { key: String },
    SPop { key: String, count: u64 },
    SRem { key: String, members: Vec<String> },
}

impl Command {
    pub fn del(key: &str) -> Self {
        Command::Del { key: key.to_string() }
    }

    pub fn exists(key: &str) -> Self {
        Command::Exists { key: key.to_string() }
    }

    pub fn expire(key: &str, seconds: u64) -> Self {
        Command::Expire { key: key.to_string(), seconds }
    }

    pub fn llen(key: &str) -> Self {
        Command::LLen { key: key.to_string() }
    }

    pub fn lpop(key: &str) -> Self {
        Command::LPop { key: key.to_string() }
    }

    pub fn rpop(key: &str) -> Self {
        Command::RPop { key: key.to_string() }
    }

    pub fn lpush(key: &str, elements: Vec<String>) -> Self {
        Command::LPush { key: key.to_string(), elements }
    }

    pub fn rpush(key: &str, elements: Vec<String>) -> Self {
        Command::RPush { key: key.to_string(), elements }
    }

    pub fn lrange(key: &str, start: i64, stop: i64) -> Self {
        Command::LRange { key: key.to_string(), start, stop }
    }

    pub fn linsert(key: &str, position: InsertPosition, pivot: String, element: String) -> Self {
        Command::LInsert {
            key: key.to_string(),
            position,
            pivot,
            element,
        }
    }

    pub fn lindex(key: &str, index: i64) -> Self {
        Command::LIndex { key: key.to_string(), index }
    }

    pub fn lset(key: &str, index: i64, element: String) -> Self {
        Command::LSet { key: key.to_string(), index, element }
    }

    pub fn ltrim(key: &str, start: i64, stop: i64) -> Self {
        Command::LTrim { key: key.to_string(), start, stop }
    }

    pub fn lrem(key: &str, count: i64, element: String) -> Self {
        Command::LRem { key: key.to_string(), count, element }
    }

    pub fn hlen(key: &str) -> Self {
        Command::HLen { key: key.to_string() }
    }

    pub fn hkeys(key: &str) -> Self {
        Command::HKeys { key: key.to_string() }
    }

    pub fn hvals(key: &str) -> Self {
        Command::HVals { key: key.to_string() }
    }

    pub fn hexists(key: &str, field: String) -> Self {
        Command::HExists { key: key.to_string(), field }
    }

    pub fn hset(key: &str, entries: Vec<(String, String)>) -> Self {
        Command::HSet { key: key.to_string(), entries }
    }

    pub fn hsetnx(key: &str, field: String, value: String) -> Self {
        Command::HSetNx { key: key.to_string(), field, value }
    }

    pub fn hget(key: &str, field: String) -> Self {
        Command::HGet { key: key.to_string(), field }
    }

    pub fn hdel(key: &str, fields: Vec<String>) -> Self {
        Command::HDel { key: key.to_string(), fields }
    }

    pub fn hmget(key: &str, fields: Vec<String>) -> Self {
        Command::HMGet { key: key.to_string(), fields }
    }

    pub fn hgetall(key: &str) -> Self {
        Command::HGetAll { key: key.to_string() }
    }

    pub fn hincrby(key: &str, field: String, delta: i64) -> Self {
        Command::HIncrBy { key: key.to_string(), field, delta }
    }

    pub fn sadd(key: &str, members: Vec<String>) -> Self {
        Command::SAdd { key: key.to_string(), members }
    }

    pub fn scard(key: &str) -> Self {
        Command::SCard { key: key.to_string() }
    }

    pub fn sismember(key: &str, member: String) -> Self {
        Command::SIsMember { key: key.to_string(), member }
    }

    pub fn smembers(key: &str) -> Self {
        Command::SMembers { key: key.to_string() }
    }

    pub fn spop(key: &str, count: u64) -> Self {
        Command::SPop { key: key.to_string(), count }
    }

    pub fn srem(key: &str, members: Vec<String>) -> Self {
        Command::SRem { key: key.to_string(), members }
    }

    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Command::Del { .. } => "DEL",
            Command::Exists { .. } => "EXISTS",
            Command::Expire { .. } => "EXPIRE",
            Command::LLen { .. } => "LLEN",
            Command::LPop { .. } => "LPOP",
            Command::RPop { .. } => "RPOP",
            Command::LPush { .. } => "LPUSH",
            Command::RPush { .. } => "RPUSH",
            Command::LRange { .. } => "LRANGE",
            Command::LInsert { .. } => "LINSERT",
            Command::LIndex { .. } => "LINDEX",
            Command::LSet { .. } => "LSET",
            Command::LTrim { .. } => "LTRIM",
            Command::LRem { .. } => "LREM",
            Command::HLen { .. } => "HLEN",
            Command::HKeys { .. } => "HKEYS",
            Command::HVals { .. } => "HVALS",
            Command::HExists { .. } => "HEXISTS",
            Command::HSet { .. } => "HSET",
            Command::HSetNx { .. } => "HSETNX",
            Command::HGet { .. } => "HGET",
            Command::HDel { .. } => "HDEL",
            Command::HMGet { .. } => "HMGET",
            Command::HGetAll { .. } => "HGETALL",
            Command::HIncrBy { .. } => "HINCRBY",
            Command::SAdd { .. } => "SADD",
            Command::SCard { .. } => "SCARD",
            Command::SIsMember { .. } => "SISMEMBER",
            Command::SMembers { .. } => "SMEMBERS",
            Command::SPop { .. } => "SPOP",
            Command::SRem { .. } => "SREM",
        }
    }

    /// Storage key the command targets
    pub fn key(&self) -> &str {
        match self {
            Command::Del { key }
            | Command::Exists { key }
            | Command::Expire { key, .. }
            | Command::LLen { key }
            | Command::LPop { key }
            | Command::RPop { key }
            | Command::LPush { key, .. }
            | Command::RPush { key, .. }
            | Command::LRange { key, .. }
            | Command::LInsert { key, .. }
            | Command::LIndex { key, .. }
            | Command::LSet { key, .. }
            | Command::LTrim { key, .. }
            | Command::LRem { key, .. }
            | Command::HLen { key }
            | Command::HKeys { key }
            | Command::HVals { key }
            | Command::HExists { key, .. }
            | Command::HSet { key, .. }
            | Command::HSetNx { key, .. }
            | Command::HGet { key, .. }
            | Command::HDel { key, .. }
            | Command::HMGet { key, .. }
            | Command::HGetAll { key }
            | Command::HIncrBy { key, .. }
            | Command::SAdd { key, .. }
            | Command::SCard { key }
            | Command::SIsMember { key, .. }
            | Command::SMembers { key }
            | Command::SPop { key, .. }
            | Command::SRem { key, .. } => key,
        }
    }

    /// Whether the command can modify the keyspace
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Command::Del { .. }
                | Command::Expire { .. }
                | Command::LPop { .. }
                | Command::RPop { .. }
                | Command::LPush { .. }
                | Command::RPush { .. }
                | Command::LInsert { .. }
                | Command::LSet { .. }
                | Command::LTrim { .. }
                | Command::LRem { .. }
                | Command::HSet { .. }
                | Command::HSetNx { .. }
                | Command::HDel { .. }
                | Command::HIncrBy { .. }
                | Command::SAdd { .. }
                | Command::SPop { .. }
                | Command::SRem { .. }
        )
    }

    /// Arguments after the command name, key first
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.key().to_string()];
        match self {
            Command::Del { .. }
            | Command::Exists { .. }
            | Command::LLen { .. }
            | Command::LPop { .. }
            | Command::RPop { .. }
            | Command::HLen { .. }
            | Command::HKeys { .. }
            | Command::HVals { .. }
            | Command::HGetAll { .. }
            | Command::SCard { .. }
            | Command::SMembers { .. } => {}
            Command::Expire { seconds, .. } => args.push(seconds.to_string()),
            Command::LPush { elements, .. } | Command::RPush { elements, .. } => {
                args.extend(elements.iter().cloned());
            }
            Command::LRange { start, stop, .. } | Command::LTrim { start, stop, .. } => {
                args.push(start.to_string());
                args.push(stop.to_string());
            }
            Command::LInsert {
                position,
                pivot,
                element,
                ..
            } => {
                args.push(position.as_str().to_string());
                args.push(pivot.clone());
                args.push(element.clone());
            }
            Command::LIndex { index, .. } => args.push(index.to_string()),
            Command::LSet { index, element, .. } => {
                args.push(index.to_string());
                args.push(element.clone());
            }
            Command::LRem { count, element, .. } => {
                args.push(count.to_string());
                args.push(element.clone());
            }
            Command::HExists { field, .. } | Command::HGet { field, .. } => args.push(field.clone()),
            Command::HSet { entries, .. } => {
                for (field, value) in entries {
                    args.push(field.clone());
                    args.push(value.clone());
                }
            }
            Command::HSetNx { field, value, .. } => {
                args.push(field.clone());
                args.push(value.clone());
            }
            Command::HDel { fields, .. } | Command::HMGet { fields, .. } => {
                args.extend(fields.iter().cloned());
            }
            Command::HIncrBy { field, delta, .. } => {
                args.push(field.clone());
                args.push(delta.to_string());
            }
            Command::SAdd { members, .. } | Command::SRem { members, .. } => {
                args.extend(members.iter().cloned());
            }
            Command::SIsMember { member, .. } => args.push(member.clone()),
            Command::SPop { count, .. } => args.push(count.to_string()),
        }
        args
    }
}
