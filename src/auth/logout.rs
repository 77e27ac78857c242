//! In-flight logout deduplication.
//!
//! A browser often fires several logouts at once (tabs, retries, a 401
//! handler racing the menu button). All logouts for the same token share one
//! upstream call; the call runs on its own task so a disconnecting client
//! cannot cancel it.

use std::future::Future;
use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use futures_util::future::{BoxFuture, FutureExt, Shared};

type Pending = Shared<BoxFuture<'static, ()>>;

#[derive(Default)]
pub struct LogoutGuard {
    inflight: Arc<DashMap<String, Pending>>,
}

impl LogoutGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `make()` for `token` unless a logout for it is already in flight,
    /// then wait for whichever call is running. Returns `true` for the caller
    /// that started the call.
    pub async fn run<F, Fut>(&self, token: &str, make: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (pending, leader) = match self.inflight.entry(token.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let inflight = Arc::clone(&self.inflight);
                let key = token.to_string();
                let work = make();
                let handle = tokio::spawn(async move {
                    work.await;
                    inflight.remove(&key);
                });
                let pending = handle.map(|_| ()).boxed().shared();
                entry.insert(pending.clone());
                (pending, true)
            }
        };
        pending.await;
        leader
    }

    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_logouts_share_one_call() {
        let guard = Arc::new(LogoutGuard::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..5 {
            let guard = Arc::clone(&guard);
            let calls = Arc::clone(&calls);
            tasks.push(tokio::spawn(async move {
                guard
                    .run("tok-1", move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    })
                    .await
            }));
        }

        let mut leaders = 0;
        for task in tasks {
            if task.await.unwrap() {
                leaders += 1;
            }
        }
        assert_eq!(leaders, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(guard.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_different_tokens_and_sequential_logouts() {
        let guard = LogoutGuard::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for token in ["a", "b"] {
            let calls = Arc::clone(&calls);
            assert!(guard.run(token, move || async move { calls.fetch_add(1, Ordering::SeqCst); }).await);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        let c = Arc::clone(&calls);
        assert!(guard.run("a", move || async move { c.fetch_add(1, Ordering::SeqCst); }).await);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
