use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::api::ApiError;

/// Cached payloads are type-erased; `observe` and `peek` downcast back to
/// the concrete collection type.
type SharedData = Arc<dyn Any + Send + Sync>;

/// Re-runnable fetch registered by the most recent observation of a key.
/// Invalidation uses it to refetch entries that still have subscribers.
type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<SharedData, ApiError>> + Send + Sync>;

type SubscriberCallback = Arc<dyn Fn(&QueryKey, QueryStatus) + Send + Sync>;

/// Resource families used for predicate invalidation. Per-employee
/// attendance views belong to the attendance family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Employees,
    Attendance,
}

/// Cache key: resource kind plus filter parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Employees,
    Attendance { date: Option<String> },
    EmployeeAttendance { employee_id: String },
}

impl QueryKey {
    pub fn kind(&self) -> ResourceKind {
        match self {
            QueryKey::Employees => ResourceKind::Employees,
            QueryKey::Attendance { .. } | QueryKey::EmployeeAttendance { .. } => {
                ResourceKind::Attendance
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of a cache entry handed to consumers.
///
/// During a refetch-triggered reload, `data` holds the last-known-good
/// collection so consumers need not flicker; a first-ever load has no data.
#[derive(Debug, Clone)]
pub struct QueryHandle<T> {
    pub data: Option<Arc<T>>,
    pub status: QueryStatus,
    pub error: Option<Arc<ApiError>>,
}

struct Entry {
    data: Option<SharedData>,
    error: Option<Arc<ApiError>>,
    status: QueryStatus,
    fetched_at: Option<DateTime<Utc>>,
    stale: bool,
    /// Present exactly while a fetch is in flight; joiners await it.
    inflight: Option<watch::Receiver<bool>>,
    fetcher: Option<Fetcher>,
}

impl Entry {
    fn idle() -> Self {
        Self {
            data: None,
            error: None,
            status: QueryStatus::Idle,
            fetched_at: None,
            stale: false,
            inflight: None,
            fetcher: None,
        }
    }

    /// A zero window means "always refetch on observation".
    fn is_fresh(&self, stale_time: Duration) -> bool {
        if self.status != QueryStatus::Success || self.stale || stale_time.is_zero() {
            return false;
        }
        let window = chrono::Duration::from_std(stale_time).unwrap_or(chrono::Duration::MAX);
        match self.fetched_at {
            Some(at) => Utc::now() - at <= window,
            None => false,
        }
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::idle()
    }
}

struct Subscriber {
    id: u64,
    callback: SubscriberCallback,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    subscribers: HashMap<QueryKey, Vec<Subscriber>>,
    next_subscriber_id: u64,
}

/// Keyed cache of remote collections.
///
/// One instance is constructed at application start and shared by all
/// consumers. At most one fetch is in flight per key: concurrent observers
/// of the same missing or stale entry share the initiating observer's
/// fetch. In-flight fetches are never cancelled; results populate the
/// cache even if no observer remains.
#[derive(Clone, Default)]
pub struct QueryCache {
    state: Arc<Mutex<CacheState>>,
}

enum Observation {
    /// Entry is fresh; serve the snapshot as-is.
    Ready,
    /// A fetch is already in flight; wait for it to land.
    Join(watch::Receiver<bool>),
    /// This observer initiates the fetch and owns the completion signal.
    Fetch(watch::Sender<bool>),
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a cache entry, fetching if it is missing or
    /// older than `stale_time`.
    ///
    /// The entry transitions `idle -> loading -> success` or `-> error`;
    /// previous data is retained across reloads and failed refetches.
    pub async fn observe<T, F, Fut>(
        &self,
        key: QueryKey,
        stale_time: Duration,
        fetch: F,
    ) -> QueryHandle<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let fetch = Arc::new(fetch);
        let fetcher: Fetcher = Arc::new(move || {
            let fetch = Arc::clone(&fetch);
            Box::pin(async move { fetch().await.map(|data| Arc::new(data) as SharedData) })
        });

        let observation = {
            let mut state = self.state.lock().await;
            let entry = state.entries.entry(key.clone()).or_default();
            // Latest observation wins; invalidation refetches with this.
            entry.fetcher = Some(Arc::clone(&fetcher));

            match (entry.status, entry.inflight.clone()) {
                (QueryStatus::Loading, Some(rx)) => Observation::Join(rx),
                _ if entry.is_fresh(stale_time) => Observation::Ready,
                _ => {
                    let (tx, rx) = watch::channel(false);
                    entry.status = QueryStatus::Loading;
                    entry.stale = false;
                    entry.inflight = Some(rx);
                    Observation::Fetch(tx)
                }
            }
        };

        match observation {
            Observation::Ready => {
                debug!(key = ?key, "cache hit");
            }
            Observation::Join(mut rx) => {
                debug!(key = ?key, "joining in-flight fetch");
                let _ = rx.changed().await;
            }
            Observation::Fetch(tx) => {
                debug!(key = ?key, "fetching");
                self.notify(&key, QueryStatus::Loading).await;
                let result = fetcher().await;
                self.complete(&key, result).await;
                let _ = tx.send(true);
            }
        }

        self.snapshot(&key).await
    }

    /// Read the cached collection for `key` without triggering a fetch.
    pub async fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let state = self.state.lock().await;
        state
            .entries
            .get(key)
            .and_then(|e| e.data.clone())
            .and_then(|d| d.downcast::<T>().ok())
    }

    /// Current snapshot of an entry, `Idle` when never observed.
    pub async fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryHandle<T> {
        let state = self.state.lock().await;
        match state.entries.get(key) {
            Some(entry) => QueryHandle {
                data: entry.data.clone().and_then(|d| d.downcast::<T>().ok()),
                status: entry.status,
                error: entry.error.clone(),
            },
            None => QueryHandle {
                data: None,
                status: QueryStatus::Idle,
                error: None,
            },
        }
    }

    /// Mark every entry matching the predicate stale.
    ///
    /// Entries with live subscribers refetch immediately on a spawned task
    /// using the last registered fetch; unobserved entries refetch lazily on
    /// their next observation. Entries already loading are only marked:
    /// the in-flight result lands normally and the entry stays stale, so
    /// the next observation catches up.
    pub async fn invalidate(&self, matches: impl Fn(&QueryKey) -> bool) {
        let mut refetches: Vec<(QueryKey, Fetcher, watch::Sender<bool>)> = Vec::new();
        {
            let mut state = self.state.lock().await;
            let state = &mut *state;
            let keys: Vec<QueryKey> = state.entries.keys().filter(|k| matches(k)).cloned().collect();
            for key in keys {
                let has_subscribers = state
                    .subscribers
                    .get(&key)
                    .is_some_and(|subs| !subs.is_empty());
                if let Some(entry) = state.entries.get_mut(&key) {
                    entry.stale = true;
                    if has_subscribers && entry.status != QueryStatus::Loading {
                        if let Some(fetcher) = entry.fetcher.clone() {
                            let (tx, rx) = watch::channel(false);
                            entry.status = QueryStatus::Loading;
                            entry.stale = false;
                            entry.inflight = Some(rx);
                            refetches.push((key, fetcher, tx));
                        }
                    }
                }
            }
        }

        for (key, fetcher, tx) in refetches {
            debug!(key = ?key, "invalidated, refetching for subscribers");
            self.notify(&key, QueryStatus::Loading).await;
            let cache = self.clone();
            tokio::spawn(async move {
                let result = fetcher().await;
                cache.complete(&key, result).await;
                let _ = tx.send(true);
            });
        }
    }

    /// Invalidate every entry in a resource family.
    pub async fn invalidate_kind(&self, kind: ResourceKind) {
        self.invalidate(move |key| key.kind() == kind).await;
    }

    /// Register a callback invoked on every status transition of `key`.
    pub async fn subscribe<F>(&self, key: QueryKey, callback: F) -> SubscriptionHandle
    where
        F: Fn(&QueryKey, QueryStatus) + Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;
        let id = state.next_subscriber_id;
        state.next_subscriber_id += 1;
        state.subscribers.entry(key.clone()).or_default().push(Subscriber {
            id,
            callback: Arc::new(callback),
        });
        SubscriptionHandle {
            state: Arc::clone(&self.state),
            key,
            id,
        }
    }

    /// Record a fetch outcome and notify subscribers. A failed fetch keeps
    /// the previous data (last-known-good) alongside the error.
    async fn complete(&self, key: &QueryKey, result: Result<SharedData, ApiError>) {
        let status = {
            let mut state = self.state.lock().await;
            let entry = state.entries.entry(key.clone()).or_default();
            entry.inflight = None;
            entry.fetched_at = Some(Utc::now());
            match result {
                Ok(data) => {
                    entry.data = Some(data);
                    entry.error = None;
                    entry.status = QueryStatus::Success;
                }
                Err(err) => {
                    entry.error = Some(Arc::new(err));
                    entry.status = QueryStatus::Error;
                }
            }
            entry.status
        };
        self.notify(key, status).await;
    }

    /// Invoke subscriber callbacks outside the state lock.
    async fn notify(&self, key: &QueryKey, status: QueryStatus) {
        let callbacks: Vec<SubscriberCallback> = {
            let state = self.state.lock().await;
            state
                .subscribers
                .get(key)
                .map(|subs| subs.iter().map(|s| Arc::clone(&s.callback)).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(key, status);
        }
    }
}

/// Handle returned by `subscribe`; dropping it without calling
/// `unsubscribe` leaves the subscription active.
pub struct SubscriptionHandle {
    state: Arc<Mutex<CacheState>>,
    key: QueryKey,
    id: u64,
}

impl SubscriptionHandle {
    pub async fn unsubscribe(self) {
        let mut state = self.state.lock().await;
        if let Some(subs) = state.subscribers.get_mut(&self.key) {
            subs.retain(|s| s.id != self.id);
            if subs.is_empty() {
                state.subscribers.remove(&self.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counted_fetch(
        counter: &Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn() -> BoxFuture<'static, Result<Vec<i32>, ApiError>> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let fut: BoxFuture<'static, Result<Vec<i32>, ApiError>> = Box::pin(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(vec![1, 2, 3])
            });
            fut
        }
    }

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn test_concurrent_observers_share_one_fetch() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                Duration::ZERO,
                counted_fetch(&count, Duration::from_millis(50)),
            ),
            cache.observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                Duration::ZERO,
                counted_fetch(&count, Duration::from_millis(50)),
            ),
        );

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(a.status, QueryStatus::Success);
        assert_eq!(b.status, QueryStatus::Success);
        assert_eq!(*a.data.unwrap(), vec![1, 2, 3]);
        assert_eq!(*b.data.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_zero_stale_time_refetches_every_observation() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            cache
                .observe::<Vec<i32>, _, _>(
                    QueryKey::Employees,
                    Duration::ZERO,
                    counted_fetch(&count, Duration::ZERO),
                )
                .await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fresh_entry_within_window_is_not_refetched() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            cache
                .observe::<Vec<i32>, _, _>(
                    QueryKey::Employees,
                    FIVE_MINUTES,
                    counted_fetch(&count, Duration::ZERO),
                )
                .await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_defeats_stale_window() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        cache
            .observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                FIVE_MINUTES,
                counted_fetch(&count, Duration::ZERO),
            )
            .await;
        cache.invalidate_kind(ResourceKind::Employees).await;
        cache
            .observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                FIVE_MINUTES,
                counted_fetch(&count, Duration::ZERO),
            )
            .await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidation_only_touches_matching_kind() {
        let cache = QueryCache::new();
        let employees = Arc::new(AtomicUsize::new(0));
        let attendance = Arc::new(AtomicUsize::new(0));
        let attendance_key = QueryKey::Attendance {
            date: Some("2024-01-01".to_string()),
        };

        cache
            .observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                FIVE_MINUTES,
                counted_fetch(&employees, Duration::ZERO),
            )
            .await;
        cache
            .observe::<Vec<i32>, _, _>(
                attendance_key.clone(),
                FIVE_MINUTES,
                counted_fetch(&attendance, Duration::ZERO),
            )
            .await;

        cache.invalidate_kind(ResourceKind::Attendance).await;

        cache
            .observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                FIVE_MINUTES,
                counted_fetch(&employees, Duration::ZERO),
            )
            .await;
        cache
            .observe::<Vec<i32>, _, _>(
                attendance_key,
                FIVE_MINUTES,
                counted_fetch(&attendance, Duration::ZERO),
            )
            .await;

        assert_eq!(employees.load(Ordering::SeqCst), 1);
        assert_eq!(attendance.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_subscriber_triggers_immediate_refetch_on_invalidation() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));
        let transitions = Arc::new(std::sync::Mutex::new(Vec::new()));

        let seen = Arc::clone(&transitions);
        let handle = cache
            .subscribe(QueryKey::Employees, move |_, status| {
                seen.lock().unwrap().push(status);
            })
            .await;

        cache
            .observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                FIVE_MINUTES,
                counted_fetch(&count, Duration::ZERO),
            )
            .await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        cache.invalidate_kind(ResourceKind::Employees).await;

        // The refetch runs on a spawned task; wait for its transitions to land.
        for _ in 0..100 {
            if transitions.lock().unwrap().len() >= 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(
            transitions.lock().unwrap().clone(),
            vec![
                QueryStatus::Loading,
                QueryStatus::Success,
                QueryStatus::Loading,
                QueryStatus::Success,
            ]
        );
        handle.unsubscribe().await;
    }

    #[tokio::test]
    async fn test_no_subscriber_means_lazy_refetch_only() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        cache
            .observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                FIVE_MINUTES,
                counted_fetch(&count, Duration::ZERO),
            )
            .await;
        cache.invalidate_kind(ResourceKind::Employees).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // No eager refetch without subscribers.
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribed_callback_not_invoked() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let seen = Arc::clone(&calls);
        let handle = cache
            .subscribe(QueryKey::Employees, move |_, _| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        handle.unsubscribe().await;

        let count = Arc::new(AtomicUsize::new(0));
        cache
            .observe::<Vec<i32>, _, _>(
                QueryKey::Employees,
                Duration::ZERO,
                counted_fetch(&count, Duration::ZERO),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_surfaces_without_retry() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let handle = cache
            .observe::<Vec<i32>, _, _>(QueryKey::Employees, Duration::ZERO, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(ApiError::transport("Failed to fetch employees")) }
            })
            .await;

        assert_eq!(handle.status, QueryStatus::Error);
        assert_eq!(
            handle.error.unwrap().to_string(),
            "Failed to fetch employees"
        );
        assert!(handle.data.is_none());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refetch_retains_last_known_good_data() {
        let cache = QueryCache::new();

        cache
            .observe::<Vec<i32>, _, _>(QueryKey::Employees, Duration::ZERO, || async {
                Ok(vec![1, 2, 3])
            })
            .await;

        let handle = cache
            .observe::<Vec<i32>, _, _>(QueryKey::Employees, Duration::ZERO, || async {
                Err(ApiError::transport("Failed to fetch employees"))
            })
            .await;

        assert_eq!(handle.status, QueryStatus::Error);
        assert_eq!(*handle.data.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_reload_retains_previous_data_while_loading() {
        let cache = QueryCache::new();

        cache
            .observe::<Vec<i32>, _, _>(QueryKey::Employees, Duration::ZERO, || async {
                Ok(vec![1])
            })
            .await;

        // Kick off a slow reload and look at the entry mid-flight.
        let reloading = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .observe::<Vec<i32>, _, _>(QueryKey::Employees, Duration::ZERO, || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(vec![1, 2])
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mid = cache.snapshot::<Vec<i32>>(&QueryKey::Employees).await;
        assert_eq!(mid.status, QueryStatus::Loading);
        assert_eq!(*mid.data.unwrap(), vec![1]);

        let done = reloading.await.unwrap();
        assert_eq!(done.status, QueryStatus::Success);
        assert_eq!(*done.data.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_peek_never_fetches() {
        let cache = QueryCache::new();
        assert!(cache.peek::<Vec<i32>>(&QueryKey::Employees).await.is_none());

        cache
            .observe::<Vec<i32>, _, _>(QueryKey::Employees, Duration::ZERO, || async {
                Ok(vec![7])
            })
            .await;

        let peeked = cache.peek::<Vec<i32>>(&QueryKey::Employees).await;
        assert_eq!(*peeked.unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_distinct_filter_params_are_distinct_entries() {
        let cache = QueryCache::new();
        let count = Arc::new(AtomicUsize::new(0));

        for date in ["2024-01-01", "2024-01-02"] {
            cache
                .observe::<Vec<i32>, _, _>(
                    QueryKey::Attendance {
                        date: Some(date.to_string()),
                    },
                    FIVE_MINUTES,
                    counted_fetch(&count, Duration::ZERO),
                )
                .await;
        }

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
