//! Redis-backed group store
//!
//! Groups are stored as JSON strings under `mnm:group:<id>` with a PX
//! expiry. Compare-and-set runs as a Lua script so the revision check and
//! the write are atomic on the server. Expirations come from keyspace
//! notifications (`notify-keyspace-events` must include `Ex`; the store
//! tries to enable it on connect).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use mnm_common::Group;
use redis::aio::MultiplexedConnection;
use redis::{Client, RedisError, Script};
use tracing::{info, warn};

use super::{decode_group, encode_group, ExpirationStream, GroupStore, StoreError, StoreResult};

const KEY_PREFIX: &str = "mnm:group:";

/// KEYS[1] group key; ARGV[1] expected revision; ARGV[2] new JSON; ARGV[3] ttl ms
const COMPARE_AND_SET: &str = r#"
local current = redis.call('GET', KEYS[1])
if not current then
    return 0
end
local decoded = cjson.decode(current)
if tonumber(decoded['revision'] or 0) ~= tonumber(ARGV[1]) then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'PX', ARGV[3])
return 1
"#;

fn group_key(group_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, group_id)
}

fn ttl_millis(ttl: Duration) -> u64 {
    (ttl.as_millis() as u64).max(1)
}

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

pub struct RedisGroupStore {
    client: Client,
    connection: MultiplexedConnection,
    db: i64,
}

impl RedisGroupStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = Client::open(url)?;
        let mut connection = client.get_multiplexed_async_connection().await?;
        let db = client.get_connection_info().redis.db;

        let enabled: Result<(), RedisError> = redis::cmd("CONFIG")
            .arg("SET")
            .arg("notify-keyspace-events")
            .arg("Ex")
            .query_async(&mut connection)
            .await;
        if let Err(e) = enabled {
            warn!(
                "Could not enable keyspace expiry notifications ({}); \
                 session expiry will not be announced unless the server has them on",
                e
            );
        }

        info!("Connected to Redis group store (db {})", db);
        Ok(Self {
            client,
            connection,
            db,
        })
    }
}

#[async_trait]
impl GroupStore for RedisGroupStore {
    async fn get(&self, group_id: &str) -> StoreResult<Group> {
        let mut con = self.connection.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(group_key(group_id))
            .query_async(&mut con)
            .await?;
        match raw {
            Some(raw) => decode_group(&raw),
            None => Err(StoreError::NotFound(group_id.to_string())),
        }
    }

    async fn insert(&self, group: &Group, ttl: Duration) -> StoreResult<()> {
        let mut con = self.connection.clone();
        let created: Option<String> = redis::cmd("SET")
            .arg(group_key(&group.id))
            .arg(encode_group(group)?)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut con)
            .await?;
        match created {
            Some(_) => Ok(()),
            None => Err(StoreError::AlreadyExists(group.id.clone())),
        }
    }

    async fn set_with_ttl(&self, group: &Group, ttl: Duration) -> StoreResult<()> {
        let mut con = self.connection.clone();
        let _: () = redis::cmd("SET")
            .arg(group_key(&group.id))
            .arg(encode_group(group)?)
            .arg("PX")
            .arg(ttl_millis(ttl))
            .query_async(&mut con)
            .await?;
        Ok(())
    }

    async fn compare_and_set(
        &self,
        group: &Group,
        expected_revision: u64,
        ttl: Duration,
    ) -> StoreResult<bool> {
        let mut con = self.connection.clone();
        let swapped: i32 = Script::new(COMPARE_AND_SET)
            .key(group_key(&group.id))
            .arg(expected_revision)
            .arg(encode_group(group)?)
            .arg(ttl_millis(ttl))
            .invoke_async(&mut con)
            .await?;
        Ok(swapped == 1)
    }

    async fn subscribe_expirations(&self) -> StoreResult<ExpirationStream> {
        let channel = format!("__keyevent@{}__:expired", self.db);
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&channel).await?;
        info!("Subscribed to {}", channel);

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let key: String = match msg.get_payload() {
                Ok(key) => key,
                Err(e) => {
                    warn!("Unreadable expiry notification: {}", e);
                    return None;
                }
            };
            // Other applications may share the database
            key.strip_prefix(KEY_PREFIX).map(str::to_string)
        });
        Ok(stream.boxed())
    }
}
