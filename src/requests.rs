//! In-flight request coordination
//!
//! [`RequestDeduplicator`] lets concurrent callers asking for the same key share
//! one underlying future. [`RequestSequencer`] tags requests so that only the
//! newest one per context may apply its result.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::debug;

type InFlight<K, T> = Arc<Mutex<HashMap<K, Shared<BoxFuture<'static, T>>>>>;

/// Shares one pending future among all callers of the same key
///
/// The entry is dropped as soon as the future settles, successful or not, so the
/// next call after completion starts a fresh request.
pub struct RequestDeduplicator<K, T> {
    in_flight: InFlight<K, T>,
}

impl<K, T> Default for RequestDeduplicator<K, T> {
    fn default() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, T> RequestDeduplicator<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Await the in-flight request for `key`, starting it with `make` if none exists
    pub async fn run<F, Fut>(&self, key: K, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&key) {
                Some(existing) => {
                    debug!("Joining in-flight request for {:?}", key);
                    existing.clone()
                }
                None => {
                    let registry = Arc::clone(&self.in_flight);
                    let settled_key = key.clone();
                    let request = make();
                    let shared = async move {
                        let output = request.await;
                        registry.lock().await.remove(&settled_key);
                        output
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Number of keys with a request still pending
    pub async fn pending(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

/// Ticket identifying one request within a [`RequestSequencer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// Last-issued-wins guard against out-of-order responses
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier token
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }

    /// Run `apply` only when `token` is still the newest request
    pub fn apply_if_current<R>(&self, token: RequestToken, apply: impl FnOnce() -> R) -> Option<R> {
        if self.is_current(token) {
            Some(apply())
        } else {
            debug!("Discarding stale response for request {}", token.0);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_request() {
        let dedup: RequestDeduplicator<&'static str, usize> = RequestDeduplicator::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let make = |calls: Arc<AtomicUsize>| {
            move || async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                calls.fetch_add(1, Ordering::SeqCst) + 41
            }
        };

        let (a, b, c) = tokio::join!(
            dedup.run("prompts", make(Arc::clone(&calls))),
            dedup.run("prompts", make(Arc::clone(&calls))),
            dedup.run("prompts", make(Arc::clone(&calls))),
        );

        assert_eq!((a, b, c), (41, 41, 41));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dedup.pending().await, 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_separately() {
        let dedup: RequestDeduplicator<String, String> = RequestDeduplicator::new();
        let (a, b) = tokio::join!(
            dedup.run("a".to_string(), || async { "first".to_string() }),
            dedup.run("b".to_string(), || async { "second".to_string() }),
        );
        assert_eq!(a, "first");
        assert_eq!(b, "second");
    }

    #[tokio::test]
    async fn test_settled_request_is_not_reused() {
        let dedup: RequestDeduplicator<&'static str, Result<u32, String>> = RequestDeduplicator::new();

        let failed = dedup.run("k", || async { Err("boom".to_string()) }).await;
        assert!(failed.is_err());
        assert_eq!(dedup.pending().await, 0);

        let retried = dedup.run("k", || async { Ok(7) }).await;
        assert_eq!(retried, Ok(7));
    }

    #[test]
    fn test_sequencer_latest_wins() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();

        assert!(first < second);
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));
        assert_eq!(sequencer.apply_if_current(first, || "stale"), None);
        assert_eq!(sequencer.apply_if_current(second, || "fresh"), Some("fresh"));
    }
}
