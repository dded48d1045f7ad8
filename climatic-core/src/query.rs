//! Read-through query cache with an invalidation bus.
//!
//! A [`QueryCache`] keeps one value per [`QueryKey`]. Concurrent fetches for
//! the same key share a single in-flight request. Mutations elsewhere publish
//! the affected key on a [`QueryClient`]. Caches subscribed to that client drop
//! the entry, and the next read goes back to the source.

use parking_lot::Mutex;
use std::{collections::HashMap, fmt, future::Future, sync::Arc, time::Duration};
use tokio::{
    sync::{OnceCell, broadcast},
    time::Instant,
};

use crate::{error::WeatherApiError, model::Coordinates};

const BUS_CAPACITY: usize = 64;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Stable cache key made of ordered segments, e.g. `weather/48.8566/2.3522`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn weather(coord: Coordinates) -> Self {
        Self::for_coordinates("weather", coord)
    }

    pub fn forecast(coord: Coordinates) -> Self {
        Self::for_coordinates("forecast", coord)
    }

    pub fn reverse_geocode(coord: Coordinates) -> Self {
        Self::for_coordinates("location", coord)
    }

    pub fn location_search(query: &str) -> Self {
        Self::new(["location-search", query])
    }

    pub fn favourites() -> Self {
        Self::new(["favourites"])
    }

    pub fn search_history() -> Self {
        Self::new(["search-history"])
    }

    fn for_coordinates(kind: &str, coord: Coordinates) -> Self {
        Self::new([kind.to_string(), coord.lat.to_string(), coord.lon.to_string()])
    }

    /// True when `prefix` names this key or one of its parents.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// Invalidation bus. Clones share the same channel.
#[derive(Debug, Clone)]
pub struct QueryClient {
    events: broadcast::Sender<QueryKey>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(BUS_CAPACITY);
        Self { events }
    }

    /// Publish `key` (and everything below it) as out of date.
    pub fn invalidate(&self, key: &QueryKey) {
        tracing::debug!(%key, "Invalidating query");
        // No subscribers is fine: nothing is cached yet.
        let _ = self.events.send(key.clone());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.events.subscribe()
    }
}

/// Backoff for transport failures. Other failures are returned immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt)
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Exponential backoff: initial_delay * 2^attempt, capped at max_delay.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

#[derive(Debug)]
struct Fetched<V> {
    value: V,
    fetched_at: Instant,
}

type Slot<V> = Arc<OnceCell<Fetched<V>>>;

/// Per-value-type cache. See the module docs.
#[derive(Debug)]
pub struct QueryCache<V> {
    slots: Mutex<HashMap<QueryKey, Slot<V>>>,
    stale_after: Option<Duration>,
    retry: RetryConfig,
    invalidations: Option<Mutex<broadcast::Receiver<QueryKey>>>,
}

impl<V: Clone> QueryCache<V> {
    /// `stale_after = None` keeps values until they are invalidated.
    pub fn new(stale_after: Option<Duration>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            stale_after,
            retry: RetryConfig::default(),
            invalidations: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Drop entries whenever `client` publishes a matching key.
    pub fn listen(mut self, client: &QueryClient) -> Self {
        self.invalidations = Some(Mutex::new(client.subscribe()));
        self
    }

    /// Drop `key` and every key below it.
    pub fn invalidate(&self, key: &QueryKey) {
        self.slots.lock().retain(|cached, _| !cached.starts_with(key));
    }

    /// Cached value for `key`, if present and fresh.
    pub fn peek(&self, key: &QueryKey) -> Option<V> {
        self.drain_invalidations();
        let slots = self.slots.lock();
        slots
            .get(key)
            .and_then(|slot| slot.get())
            .filter(|fetched| !self.is_stale(fetched))
            .map(|fetched| fetched.value.clone())
    }

    /// Synchronous read-through: return the cached value or cache `load()`.
    pub fn read(&self, key: &QueryKey, load: impl FnOnce() -> V) -> V {
        if let Some(value) = self.peek(key) {
            return value;
        }

        let value = load();
        let slot = Arc::new(OnceCell::new());
        let _ = slot.set(Fetched {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        self.slots.lock().insert(key.clone(), slot);
        value
    }

    /// Async read-through with request sharing and retry.
    ///
    /// Callers that arrive while a fetch for `key` is in flight wait for that
    /// fetch instead of starting their own. Errors are never cached.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<V, WeatherApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, WeatherApiError>>,
    {
        self.drain_invalidations();

        let slot = {
            let mut slots = self.slots.lock();
            let reusable = slots
                .get(key)
                .filter(|slot| !slot.get().is_some_and(|f| self.is_stale(f)))
                .cloned();
            match reusable {
                Some(slot) => slot,
                None => {
                    let slot: Slot<V> = Arc::new(OnceCell::new());
                    slots.insert(key.clone(), slot.clone());
                    slot
                }
            }
        };

        if slot.initialized() {
            tracing::debug!(%key, "Query cache hit");
        }

        let fetched = slot
            .get_or_try_init(|| self.fetch_with_retry(key, &fetcher))
            .await?;

        Ok(fetched.value.clone())
    }

    async fn fetch_with_retry<F, Fut>(
        &self,
        key: &QueryKey,
        fetcher: &F,
    ) -> Result<Fetched<V>, WeatherApiError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V, WeatherApiError>>,
    {
        let mut attempt = 0;
        loop {
            match fetcher().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(%key, attempt, "Query succeeded after retries");
                    }
                    return Ok(Fetched {
                        value,
                        fetched_at: Instant::now(),
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(%key, attempt = attempt + 1, ?delay, error = %e, "Query failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn is_stale(&self, fetched: &Fetched<V>) -> bool {
        self.stale_after
            .is_some_and(|window| fetched.fetched_at.elapsed() >= window)
    }

    fn drain_invalidations(&self) {
        let Some(rx) = &self.invalidations else {
            return;
        };

        let mut rx = rx.lock();
        loop {
            match rx.try_recv() {
                Ok(key) => self.invalidate(&key),
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    // Missed events: anything may be out of date.
                    self.slots.lock().clear();
                }
                Err(_) => break,
            }
        }
    }
}
