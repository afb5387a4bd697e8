//! RedisClient: network client for a running Redis-compatible server
//!
//! Regular commands share one multiplexed connection. Sessions open a
//! dedicated connection so WATCH state belongs to that session alone.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::client::{Command, KvClient, Reply, Session};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

fn to_redis_cmd(command: &Command) -> redis::Cmd {
    let mut cmd = redis::cmd(command.name());
    for arg in command.args() {
        cmd.arg(arg);
    }
    cmd
}

async fn with_timeout<T, F>(timeout: Duration, fut: F) -> ClientResult<T>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(ClientError::from),
        Err(_) => Err(ClientError::Timeout(timeout)),
    }
}

async fn open_connection(
    client: &redis::Client,
    config: &ClientConfig,
) -> ClientResult<MultiplexedConnection> {
    let timeout = config.response_timeout();
    let mut connection = with_timeout(timeout, client.get_multiplexed_async_connection()).await?;
    if config.database != 0 {
        let _: () = with_timeout(
            timeout,
            redis::cmd("SELECT").arg(config.database).query_async(&mut connection),
        )
        .await?;
    }
    Ok(connection)
}

/// Network client that connects to a running Redis-compatible server.
///
/// # Example
/// ```no_run
/// # async fn demo() -> kv_collections::ClientResult<()> {
/// use kv_collections::{ClientConfig, RedisClient};
///
/// let client = RedisClient::connect(&ClientConfig::new("redis://127.0.0.1:6379")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
    connection: MultiplexedConnection,
    config: ClientConfig,
}

impl RedisClient {
    /// Connect using the given configuration
    pub async fn connect(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| ClientError::Config(e.to_string()))?;
        let connection = open_connection(&client, config).await?;
        info!("Connected to {} (db {})", config.url, config.database);

        Ok(Self {
            client,
            connection,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl KvClient for RedisClient {
    async fn execute(&self, command: Command) -> ClientResult<Reply> {
        debug!("Executing {} on '{}'", command.name(), command.key());
        let mut connection = self.connection.clone();
        let value: redis::Value = with_timeout(
            self.config.response_timeout(),
            to_redis_cmd(&command).query_async(&mut connection),
        )
        .await?;
        Reply::try_from(value)
    }

    /// Opens a new connection per session; it is never shared or cloned,
    /// so WATCH state stays private to the session
    async fn session(&self) -> ClientResult<Box<dyn Session>> {
        let connection = open_connection(&self.client, &self.config).await?;
        Ok(Box::new(RedisSession {
            connection,
            timeout: self.config.response_timeout(),
        }))
    }
}

/// Owns its connection exclusively; the server keeps WATCH state per connection
struct RedisSession {
    connection: MultiplexedConnection,
    timeout: Duration,
}

#[async_trait]
impl Session for RedisSession {
    async fn watch(&mut self, key: &str) -> ClientResult<()> {
        debug!("WATCH '{}'", key);
        let _: () = with_timeout(
            self.timeout,
            redis::cmd("WATCH").arg(key).query_async(&mut self.connection),
        )
        .await?;
        Ok(())
    }

    async fn execute(&mut self, command: Command) -> ClientResult<Reply> {
        debug!("Executing {} on '{}' (session)", command.name(), command.key());
        let value: redis::Value = with_timeout(
            self.timeout,
            to_redis_cmd(&command).query_async(&mut self.connection),
        )
        .await?;
        Reply::try_from(value)
    }

    async fn exec(&mut self, commands: Vec<Command>) -> ClientResult<Option<Vec<Reply>>> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for command in &commands {
            pipe.add_command(to_redis_cmd(command));
        }

        debug!("EXEC {} queued commands", commands.len());
        let values: Option<Vec<redis::Value>> =
            with_timeout(self.timeout, pipe.query_async(&mut self.connection)).await?;

        match values {
            Some(values) => values
                .into_iter()
                .map(Reply::try_from)
                .collect::<ClientResult<Vec<_>>>()
                .map(Some),
            None => {
                warn!("EXEC aborted: a watched key changed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_redis_cmd_packs_args() {
        let cmd = to_redis_cmd(&Command::lrange("queue", 0, -1));
        let packed = String::from_utf8(cmd.get_packed_command()).unwrap();
        assert_eq!(
            packed,
            "*4\r\n$6\r\nLRANGE\r\n$5\r\nqueue\r\n$1\r\n0\r\n$2\r\n-1\r\n"
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let config = ClientConfig {
            response_timeout_ms: 0,
            ..ClientConfig::default()
        };
        let result = RedisClient::connect(&config).await;
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
