//! In-memory [`Cache`] implementation.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Instant,
};

use common::operations::{By, Delete, Insert, Select};
use derive_more::{Display, Error as StdError};
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use tracerr::Traced;

use super::{Cache, Entry, Key, Pattern};

/// In-memory [`Cache`].
///
/// Can be switched into an unavailable mode, failing every operation, to
/// imitate a broken connection.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored JSON values along with the moments they expire at.
    entries: Arc<Mutex<HashMap<Key, (Instant, String)>>>,

    /// Indicator whether this [`Memory`] cache fails every operation.
    unavailable: Arc<AtomicBool>,
}

impl Memory {
    /// Creates a new empty [`Memory`] cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches this [`Memory`] cache into (or out of) the unavailable mode.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Indicates whether a non-expired value is stored under the [`Key`].
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.entries()
            .get(key)
            .is_some_and(|(exp, _)| *exp > Instant::now())
    }

    /// Locks the stored entries.
    fn entries(&self) -> MutexGuard<'_, HashMap<Key, (Instant, String)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fails if this [`Memory`] cache is in the unavailable mode.
    fn check_available(&self) -> Result<(), Traced<super::Error>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(tracerr::new!(super::Error::from(Error::Unavailable)));
        }
        Ok(())
    }
}

impl<T> Cache<Select<By<Option<T>, Key>>> for Memory
where
    T: DeserializeOwned,
{
    type Ok = Option<T>;
    type Err = Traced<super::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<T>, Key>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();
        self.check_available().map_err(tracerr::wrap!())?;

        let raw = {
            let mut entries = self.entries();
            match entries.get(&key) {
                Some((exp, json)) if *exp > Instant::now() => Some(json.clone()),
                Some(_) => {
                    drop(entries.remove(&key));
                    None
                }
                None => None,
            }
        };
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> super::Error))
    }
}

impl<T> Cache<Insert<Entry<T>>> for Memory
where
    T: Serialize,
{
    type Ok = ();
    type Err = Traced<super::Error>;

    async fn execute(
        &self,
        Insert(entry): Insert<Entry<T>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Entry { key, value, ttl } = entry;
        self.check_available().map_err(tracerr::wrap!())?;

        let json = serde_json::to_string(&value)
            .map_err(tracerr::from_and_wrap!(=> super::Error))?;
        drop(self.entries().insert(key, (Instant::now() + ttl, json)));
        Ok(())
    }
}

impl Cache<Delete<Key>> for Memory {
    type Ok = ();
    type Err = Traced<super::Error>;

    async fn execute(
        &self,
        Delete(key): Delete<Key>,
    ) -> Result<Self::Ok, Self::Err> {
        self.check_available().map_err(tracerr::wrap!())?;

        drop(self.entries().remove(&key));
        Ok(())
    }
}

impl Cache<Delete<Pattern>> for Memory {
    type Ok = ();
    type Err = Traced<super::Error>;

    async fn execute(
        &self,
        Delete(pattern): Delete<Pattern>,
    ) -> Result<Self::Ok, Self::Err> {
        self.check_available().map_err(tracerr::wrap!())?;

        let regex = glob_to_regex(&pattern)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        self.entries().retain(|key, _| !regex.is_match(key.as_ref()));
        Ok(())
    }
}

/// Compiles the provided glob-style [`Pattern`] into a [`Regex`].
fn glob_to_regex(pattern: &Pattern) -> Result<Regex, regex::Error> {
    let escaped = pattern
        .as_ref()
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{escaped}$"))
}

/// [`Memory`] cache error.
#[derive(Debug, Display, StdError)]
pub enum Error {
    /// [`Memory`] cache is switched into the unavailable mode.
    #[display("Cache is unavailable")]
    Unavailable,

    /// Provided [`Pattern`] cannot be compiled.
    #[display("Invalid pattern: {_0}")]
    InvalidPattern(regex::Error),
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Self::InvalidPattern(e)
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::operations::{By, Delete, Insert, Select};

    use crate::{domain::product, infra::Cache};

    use super::{super::Entry, Key, Memory, Pattern};

    fn entry(key: Key, value: &str, ttl: Duration) -> Insert<Entry<String>> {
        Insert(Entry {
            key,
            value: value.into(),
            ttl,
        })
    }

    #[tokio::test]
    async fn stores_and_expires_values() {
        let cache = Memory::new();
        let key = Key::active_sales();

        cache
            .execute(entry(key.clone(), "cached", Duration::from_secs(30)))
            .await
            .unwrap();
        let got: Option<String> =
            cache.execute(Select(By::new(key.clone()))).await.unwrap();
        assert_eq!(got.as_deref(), Some("cached"));

        cache
            .execute(entry(key.clone(), "stale", Duration::ZERO))
            .await
            .unwrap();
        let got: Option<String> =
            cache.execute(Select(By::new(key.clone()))).await.unwrap();
        assert_eq!(got, None);
        assert!(!cache.contains(&key));
    }

    #[tokio::test]
    async fn deletes_by_pattern() {
        let cache = Memory::new();
        let ttl = Duration::from_secs(30);
        let product = Key::sale_for_product(product::Id::new(), None);
        let active = Key::active_sales();

        cache.execute(entry(product.clone(), "a", ttl)).await.unwrap();
        cache.execute(entry(active.clone(), "b", ttl)).await.unwrap();

        cache
            .execute(Delete(Pattern::sales_for_products()))
            .await
            .unwrap();

        assert!(!cache.contains(&product));
        assert!(cache.contains(&active));
    }

    #[tokio::test]
    async fn fails_when_unavailable() {
        let cache = Memory::new();
        cache.set_unavailable(true);

        let res: Result<Option<String>, _> =
            cache.execute(Select(By::new(Key::active_sales()))).await;
        assert!(res.is_err());
        assert!(cache.execute(Delete(Key::active_sales())).await.is_err());

        cache.set_unavailable(false);
        assert!(cache.execute(Delete(Key::active_sales())).await.is_ok());
    }
}
