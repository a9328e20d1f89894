use snaplink_core::{LinkCache, LinkStore, ShortCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, trace, warn};

/// Default interval between periodic flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Buffers click events in the cache and periodically merges them into the
/// store.
///
/// Redirect handlers call [`record`](Self::record), which is a single cache
/// increment; the store only sees one batched update per code per flush.
/// Flushes are serialized by the `flushing` flag: a manual flush that
/// overlaps the periodic one is skipped rather than run concurrently, so
/// the same delta can never be applied twice.
pub struct ClickAccumulator<S, C> {
    store: Arc<S>,
    cache: Arc<C>,
    flushing: AtomicBool,
}

impl<S: LinkStore, C: LinkCache> ClickAccumulator<S, C> {
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self {
            store,
            cache,
            flushing: AtomicBool::new(false),
        }
    }

    /// Buffers one click for a code.
    ///
    /// A cache failure is logged and swallowed: losing a buffered click
    /// must not fail the redirect that triggered it.
    pub async fn record(&self, code: &ShortCode) {
        match self.cache.incr_pending(code).await {
            Ok(pending) => trace!(code = %code, pending, "buffered click"),
            Err(e) => warn!(code = %code, error = %e, "failed to buffer click"),
        }
    }

    /// Merges all buffered click deltas into the store.
    ///
    /// Skipped if another flush is already running. Per code the order is
    /// read-delta, add to store, discharge the observed value from the
    /// cache: a crash between add and discharge at worst double-counts on
    /// the next run, and a store failure leaves the counter untouched for
    /// the next interval. Clicks are never silently dropped.
    pub async fn flush(&self) {
        if self.flushing.swap(true, Ordering::SeqCst) {
            debug!("click flush already in progress, skipping");
            return;
        }

        // Clears the flag even if this future is dropped mid-run, so a
        // cancelled flush cannot wedge the accumulator.
        let _guard = FlushGuard(&self.flushing);
        self.flush_inner().await;
    }

    async fn flush_inner(&self) {
        let codes = match self.cache.pending_codes().await {
            Ok(codes) => codes,
            Err(e) => {
                warn!(error = %e, "failed to scan pending clicks, leaving counters for next flush");
                return;
            }
        };

        if codes.is_empty() {
            trace!("no pending clicks to flush");
            return;
        }

        let mut merged: u64 = 0;
        let mut failed: u64 = 0;

        for raw in codes {
            let code = ShortCode::new_unchecked(raw);

            let delta = match self.cache.pending_delta(&code).await {
                Ok(delta) => delta,
                Err(e) => {
                    warn!(code = %code, error = %e, "failed to read pending clicks");
                    failed += 1;
                    continue;
                }
            };
            if delta <= 0 {
                continue;
            }

            if let Err(e) = self.store.add_clicks(&code, delta as u64).await {
                warn!(code = %code, error = %e, "failed to merge clicks, counter left for next flush");
                failed += 1;
                continue;
            }

            if let Err(e) = self.cache.discharge_pending(&code, delta).await {
                // Already merged; the undischarged remainder double-counts
                // on the next run rather than getting lost.
                warn!(code = %code, error = %e, "failed to discharge pending clicks");
                failed += 1;
                continue;
            }

            merged += delta as u64;
        }

        debug!(merged, failed, "click flush completed");
    }

    /// Starts the periodic flush task.
    ///
    /// The task flushes every `interval` and once more on shutdown so
    /// buffered clicks are not stranded. The returned handle stops the task
    /// gracefully via [`FlusherHandle::shutdown`] and aborts it on drop.
    pub fn spawn_flusher(self: Arc<Self>, interval: Duration) -> FlusherHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sleep(interval) => {
                        trace!("periodic click flush");
                        self.flush().await;
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("click flusher shutting down, running final flush");
                        self.flush().await;
                        break;
                    }
                }
            }
        });

        FlusherHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle bound to the lifetime of the periodic flush task.
pub struct FlusherHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FlusherHandle {
    /// Signals the task to stop, waits for its final flush to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        let _ = (&mut self.task).await;
    }
}

impl Drop for FlusherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use snaplink_core::NewLink;
    use snaplink_cache::MemoryCache;
    use snaplink_storage::InMemoryStore;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    async fn store_with_link(c: &ShortCode) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_if_absent(
                c,
                NewLink {
                    long_url: "https://example.com".to_string(),
                    created_at: Timestamp::now(),
                    expires_at: None,
                },
            )
            .await
            .unwrap();
        store
    }

    fn accumulator(
        store: Arc<InMemoryStore>,
        cache: Arc<MemoryCache>,
    ) -> ClickAccumulator<InMemoryStore, MemoryCache> {
        ClickAccumulator::new(store, cache)
    }

    #[tokio::test]
    async fn record_buffers_in_cache_without_touching_store() {
        let c = code("abc123");
        let store = store_with_link(&c).await;
        let cache = Arc::new(MemoryCache::new());
        let clicks = accumulator(Arc::clone(&store), Arc::clone(&cache));

        clicks.record(&c).await;
        clicks.record(&c).await;

        assert_eq!(cache.pending_delta(&c).await.unwrap(), 2);
        assert_eq!(store.get(&c).await.unwrap().unwrap().clicks, 0);
    }

    #[tokio::test]
    async fn flush_merges_deltas_and_clears_counters() {
        let c = code("abc123");
        let store = store_with_link(&c).await;
        let cache = Arc::new(MemoryCache::new());
        let clicks = accumulator(Arc::clone(&store), Arc::clone(&cache));

        for _ in 0..5 {
            clicks.record(&c).await;
        }
        clicks.flush().await;

        assert_eq!(store.get(&c).await.unwrap().unwrap().clicks, 5);
        assert_eq!(cache.pending_delta(&c).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn flush_adds_to_preexisting_store_count() {
        let c = code("abc123");
        let store = store_with_link(&c).await;
        store.add_clicks(&c, 10).await.unwrap();
        let cache = Arc::new(MemoryCache::new());
        let clicks = accumulator(Arc::clone(&store), Arc::clone(&cache));

        for _ in 0..3 {
            clicks.record(&c).await;
        }
        clicks.flush().await;

        assert_eq!(store.get(&c).await.unwrap().unwrap().clicks, 13);
    }

    #[tokio::test]
    async fn flush_with_nothing_pending_is_a_noop() {
        let c = code("abc123");
        let store = store_with_link(&c).await;
        let cache = Arc::new(MemoryCache::new());
        let clicks = accumulator(Arc::clone(&store), Arc::clone(&cache));

        clicks.flush().await;

        assert_eq!(store.get(&c).await.unwrap().unwrap().clicks, 0);
    }

    #[tokio::test]
    async fn flush_handles_multiple_codes() {
        let a = code("aaa111");
        let b = code("bbb222");
        let store = store_with_link(&a).await;
        store
            .insert_if_absent(
                &b,
                NewLink {
                    long_url: "https://other.com".to_string(),
                    created_at: Timestamp::now(),
                    expires_at: None,
                },
            )
            .await
            .unwrap();
        let cache = Arc::new(MemoryCache::new());
        let clicks = accumulator(Arc::clone(&store), Arc::clone(&cache));

        clicks.record(&a).await;
        clicks.record(&a).await;
        clicks.record(&b).await;
        clicks.flush().await;

        assert_eq!(store.get(&a).await.unwrap().unwrap().clicks, 2);
        assert_eq!(store.get(&b).await.unwrap().unwrap().clicks, 1);
    }

    #[tokio::test]
    async fn clicks_buffered_against_a_dead_row_flush_harmlessly() {
        let c = code("abc123");
        let store = store_with_link(&c).await;
        store.set_deleted(&c).await.unwrap();
        let cache = Arc::new(MemoryCache::new());
        let clicks = accumulator(Arc::clone(&store), Arc::clone(&cache));

        clicks.record(&c).await;
        clicks.flush().await;

        // The dead row absorbs the delta; the counter is drained.
        assert_eq!(store.get(&c).await.unwrap().unwrap().clicks, 1);
        assert_eq!(cache.pending_delta(&c).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn second_flush_has_nothing_left_to_apply() {
        let c = code("abc123");
        let store = store_with_link(&c).await;
        let cache = Arc::new(MemoryCache::new());
        let clicks = accumulator(Arc::clone(&store), Arc::clone(&cache));

        clicks.record(&c).await;
        clicks.flush().await;
        clicks.flush().await;

        assert_eq!(store.get(&c).await.unwrap().unwrap().clicks, 1);
    }

    #[tokio::test]
    async fn periodic_flusher_merges_on_interval() {
        let c = code("abc123");
        let store = store_with_link(&c).await;
        let cache = Arc::new(MemoryCache::new());
        let clicks = Arc::new(accumulator(Arc::clone(&store), Arc::clone(&cache)));

        clicks.record(&c).await;
        let handle = Arc::clone(&clicks).spawn_flusher(Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.shutdown().await;

        assert_eq!(store.get(&c).await.unwrap().unwrap().clicks, 1);
    }

    #[tokio::test]
    async fn shutdown_runs_a_final_flush() {
        let c = code("abc123");
        let store = store_with_link(&c).await;
        let cache = Arc::new(MemoryCache::new());
        let clicks = Arc::new(accumulator(Arc::clone(&store), Arc::clone(&cache)));

        // Interval far beyond the test's lifetime: only the shutdown flush
        // can merge this click.
        let handle = Arc::clone(&clicks).spawn_flusher(Duration::from_secs(3600));
        clicks.record(&c).await;
        handle.shutdown().await;

        assert_eq!(store.get(&c).await.unwrap().unwrap().clicks, 1);
    }
}
