//! kv-collections
//!
//! Array, Map and Set style handles over a key-value store's native list,
//! hash and set commands, with optional JSON transcoding of values.
//!
//! # Architecture
//!
//! - **`client`**: the [`KvClient`] contract, the typed [`Command`] set and
//!   two clients: [`MemoryClient`] (in-process) and [`RedisClient`] (network)
//! - **`codec`**: [`ValueCodec`] strategy chosen once from the serialization flag
//! - **`wrapper`**: [`Wrapper`] base holding client, key and codec
//! - **`list`**, **`hash`**, **`set`**: the collection adapters
//! - **`binding`**: [`Collections`] factory bound to one client
//!
//! Every adapter method forwards to exactly one store command. The two
//! composites are `RedisList::splice` (atomic, WATCH/MULTI/EXEC) and
//! `RedisHash::entries` (a reshaped `get_all`).
//!
//! Handles hold no cached data. Two handles on the same key must agree on
//! the serialization flag; mixing them is not detected.
//!
//! ## Example Usage
//!
//! ```rust
//! use kv_collections::{MemoryClient, RedisList};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> kv_collections::CollectionResult<()> {
//! let list = RedisList::new(Arc::new(MemoryClient::new()), "letters", false)?;
//! list.push(["a", "b", "c", "d", "e"]).await?;
//!
//! assert_eq!(list.slice(1, Some(3)).await?, vec![json!("b"), json!("c")]);
//! assert_eq!(list.slice(-2, None).await?, vec![json!("d"), json!("e")]);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod binding;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod hash;
pub mod list;
pub mod set;
pub mod wrapper;

// Re-export main types for convenience
pub use binding::{Collections, CollectionsBuilder};
pub use client::{Command, InsertPosition, KvClient, MemoryClient, RedisClient, Reply, Session};
pub use codec::{codec_for, JsonCodec, RawCodec, ValueCodec};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, CollectionError, CollectionResult};
pub use hash::RedisHash;
pub use list::RedisList;
pub use set::RedisSet;
pub use wrapper::Wrapper;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
