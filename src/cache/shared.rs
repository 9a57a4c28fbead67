use std::sync::Arc;
use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use redis::Client;
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;

use super::{CacheKey, CacheTier};
use crate::error::{AppError, AppResult};
use crate::models::{CacheEntry, STALE_TTL_SECS};

/// Upper bound on a single Redis read, connection included
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Upper bound on a single queued Redis write, connection included
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Expiry applied to every Redis entry, in seconds
const ENTRY_TTL: u64 = STALE_TTL_SECS as u64;

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// One Redis connection shared by readers and the writer task
///
/// Connects on first use. A failed attempt leaves it unconnected so the next
/// operation retries; once up, the manager reconnects by itself.
struct SharedConnection {
    client: Client,
    manager: OnceCell<ConnectionManager>,
}

impl SharedConnection {
    fn new(client: Client) -> Self {
        Self {
            client,
            manager: OnceCell::new(),
        }
    }

    async fn get(&self) -> AppResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(1)
                    .set_connection_timeout(READ_TIMEOUT)
                    .set_response_timeout(WRITE_TIMEOUT);
                self.client.get_connection_manager_with_config(config).await
            })
            .await?;
        Ok(manager.clone())
    }
}

/// Shared cache tier backed by Redis
///
/// Reads go straight to Redis; writes are queued to a background task so a
/// request never waits on Redis to respond.
#[derive(Clone)]
pub struct RedisCache {
    connection: Arc<SharedConnection>,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Asks the writer task to flush queued writes and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

impl RedisCache {
    /// Creates a new RedisCache and spawns its background writer task
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let connection = Arc::new(SharedConnection::new(redis_client));
        let writer_connection = connection.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(writer_connection, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            connection,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    /// Background task that applies queued writes until shutdown
    ///
    /// On shutdown the queue is closed and whatever is still buffered is
    /// written before the task returns.
    async fn cache_writer_task(
        connection: Arc<SharedConnection>,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    let key = msg.key.clone();
                    if let Err(e) = Self::write_to_redis(&connection, msg).await {
                        tracing::warn!(key = %key, error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&connection, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }

                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis, giving up after [`WRITE_TIMEOUT`]
    async fn write_to_redis(connection: &SharedConnection, msg: CacheWriteMessage) -> AppResult<()> {
        let write = async {
            let mut conn = connection.get().await?;
            let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
            Ok::<(), AppError>(())
        };

        tokio::time::timeout(WRITE_TIMEOUT, write)
            .await
            .map_err(|_| AppError::Internal("Redis write timed out".to_string()))?
    }

    async fn read_from_redis(&self, key: &CacheKey) -> AppResult<Option<CacheEntry>> {
        let mut conn = self.connection.get().await?;
        let cached: Option<String> = conn.get(key.as_str()).await?;

        match cached {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl CacheTier for RedisCache {
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match tokio::time::timeout(READ_TIMEOUT, self.read_from_redis(key)).await {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => {
                tracing::debug!(key = %key, error = %e, "Redis cache read failed");
                None
            }
            Err(_) => {
                tracing::debug!(key = %key, "Redis cache read timed out");
                None
            }
        }
    }

    async fn try_write(&self, key: &CacheKey, entry: &CacheEntry) -> AppResult<()> {
        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: serde_json::to_string(entry)?,
            ttl: ENTRY_TTL,
        };

        self.write_tx
            .send(msg)
            .map_err(|e| AppError::Internal(format!("Cache writer unavailable: {}", e)))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// Stand-in for the shared tier when no Redis is configured
///
/// Every read misses and every write succeeds without doing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait::async_trait]
impl CacheTier for DisabledCache {
    async fn get(&self, _key: &CacheKey) -> Option<CacheEntry> {
        None
    }

    async fn try_write(&self, _key: &CacheKey, _entry: &CacheEntry) -> AppResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// Builds the shared tier from an optional connection string
///
/// No URL, or one Redis rejects, yields a [`DisabledCache`]. The client
/// connects lazily, so an unreachable server only shows up as read misses
/// and logged write failures.
pub fn shared_tier(redis_url: Option<&str>) -> (Arc<dyn CacheTier>, Option<CacheWriterHandle>) {
    let Some(url) = redis_url else {
        tracing::info!("No Redis URL configured, shared cache disabled");
        return (Arc::new(DisabledCache), None);
    };

    match Client::open(url) {
        Ok(client) => {
            let (cache, handle) = RedisCache::new(client);
            tracing::info!("Shared Redis cache enabled");
            (Arc::new(cache), Some(handle))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invalid Redis URL, shared cache disabled");
            (Arc::new(DisabledCache), None)
        }
    }
}
