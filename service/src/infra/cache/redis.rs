//! [Redis] [`Cache`] implementation.
//!
//! [Redis]: https://redis.io

use ::redis::{aio::ConnectionManager, AsyncCommands as _, Client};
use common::operations::{By, Delete, Insert, Select};
use serde::{de::DeserializeOwned, Serialize};
use tracerr::Traced;

use super::{Cache, Entry, Error, Key, Pattern};

/// [Redis] [`Cache`] client.
///
/// Cheap to clone, as all the clones share the same multiplexed connection,
/// which is re-established automatically once lost.
///
/// [Redis]: https://redis.io
#[derive(Clone)]
pub struct Redis(ConnectionManager);

impl std::fmt::Debug for Redis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Redis").finish_non_exhaustive()
    }
}

impl Redis {
    /// Connects to the [Redis] server by the provided `url`.
    ///
    /// # Errors
    ///
    /// If the `url` is invalid or the server is unreachable.
    ///
    /// [Redis]: https://redis.io
    pub async fn new(url: &str) -> Result<Self, Traced<Error>> {
        let client =
            Client::open(url).map_err(tracerr::from_and_wrap!(=> Error))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self(manager))
    }
}

impl<T> Cache<Select<By<Option<T>, Key>>> for Redis
where
    T: DeserializeOwned,
{
    type Ok = Option<T>;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<T>, Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();

        let raw: Option<String> = self
            .0
            .clone()
            .get(key.as_ref())
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> Error))
    }
}

impl<T> Cache<Insert<Entry<T>>> for Redis
where
    T: Serialize,
{
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<Entry<T>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Entry { key, value, ttl } = entry;

        let json = serde_json::to_string(&value)
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        self.0
            .clone()
            .set_ex::<_, _, ()>(key.as_ref(), json, ttl.as_secs().max(1))
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
    }
}

impl Cache<Delete<Key>> for Redis {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        self.0
            .clone()
            .del::<_, ()>(key.as_ref())
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
    }
}

/// Deletes all the [`Key`]s matching the [`Pattern`].
///
/// Uses `SCAN` rather than `KEYS`, so the server isn't blocked. Keys added
/// while scanning may survive.
impl Cache<Delete<Pattern>> for Redis {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Delete(pattern): Delete<Pattern>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut conn = self.0.clone();
        let mut keys = Vec::<String>::new();
        {
            let mut iter = conn
                .scan_match::<_, String>(pattern.as_ref())
                .await
                .map_err(tracerr::from_and_wrap!(=> Error))?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Ok(());
        }

        conn.del::<_, ()>(keys)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
    }
}
