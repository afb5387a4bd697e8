//! Key-value client contract
//!
//! The adapters only ever talk to a [`KvClient`]. Two implementations ship
//! with the crate:
//!
//! - **`MemoryClient`**: in-process keyspace, no network. Used by the tests
//!   and for embedded use.
//! - **`RedisClient`**: a real server through the `redis` crate.
//!
//! Atomic composites pin a [`Session`] (one connection) so that
//! WATCH / MULTI / EXEC apply to the same connection.

pub mod command;
pub mod memory;
pub mod remote;
pub mod reply;

use async_trait::async_trait;

use crate::error::ClientResult;

pub use command::{Command, InsertPosition};
pub use memory::MemoryClient;
pub use remote::RedisClient;
pub use reply::Reply;

/// Unified interface to the key-value store
#[async_trait]
pub trait KvClient: Send + Sync {
    /// Run one command; error replies come back as `ClientError::Response`
    async fn execute(&self, command: Command) -> ClientResult<Reply>;

    /// Open a session pinned to a single connection
    async fn session(&self) -> ClientResult<Box<dyn Session>>;
}

/// A connection-scoped conversation used for optimistic transactions
#[async_trait]
pub trait Session: Send {
    /// WATCH a key; a later `exec` aborts if it changes in between
    async fn watch(&mut self, key: &str) -> ClientResult<()>;

    /// Run one command on this session's connection
    async fn execute(&mut self, command: Command) -> ClientResult<Reply>;

    /// MULTI / EXEC the commands
    ///
    /// Returns `None` when a watched key was modified and nothing was applied.
    /// Per-command failures inside a committed transaction are returned as
    /// `Reply::Error` entries.
    async fn exec(&mut self, commands: Vec<Command>) -> ClientResult<Option<Vec<Reply>>>;
}
