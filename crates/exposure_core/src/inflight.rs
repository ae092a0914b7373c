//! Registry of coordinator work that is still running.

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

use parking_lot::Mutex;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Tracks spawned tasks by id. A task removes its own entry when it finishes;
/// whatever is left at teardown is aborted.
#[derive(Debug, Default)]
pub struct InflightRegistry {
    next_id: AtomicU64,
    handles: Arc<Mutex<HashMap<RequestId, JoinHandle<()>>>>,
}

impl InflightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, fut: F) -> RequestId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.spawn_with_completion(fut, |()| {})
    }

    /// Runs `work` on a spawned task, then hands its output to `completion`.
    ///
    /// The task claims its entry under the registry lock before running
    /// `completion`. If [`cancel_all`](Self::cancel_all) drained the entry
    /// first, `completion` is skipped even when the task was mid-poll on
    /// another worker.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn_with_completion<W, T, C>(&self, work: W, completion: C) -> RequestId
    where
        W: Future<Output = T> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handles = Arc::downgrade(&self.handles);

        // Held across spawn so the task cannot remove its entry before it exists.
        let mut guard = self.handles.lock();
        let handle = tokio::spawn(async move {
            // Removes the entry on every exit path: completion, panic, abort.
            let registration = Deregister { id, handles };
            let output = work.await;
            if registration.claim() {
                completion(output);
            }
        });
        guard.insert(id, handle);
        id
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.handles.lock().contains_key(&id)
    }

    /// Aborts every task still registered and returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.handles.lock().drain().collect();
        for (_, handle) in &drained {
            handle.abort();
        }
        drained.len()
    }
}

struct Deregister {
    id: RequestId,
    handles: Weak<Mutex<HashMap<RequestId, JoinHandle<()>>>>,
}

impl Deregister {
    /// Removes the entry and reports whether it was still registered.
    fn claim(&self) -> bool {
        let Some(handles) = self.handles.upgrade() else {
            return false;
        };
        let removed = handles.lock().remove(&self.id).is_some();
        removed
    }
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.claim();
    }
}

impl Drop for InflightRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn finished_task_removes_its_entry() {
        let registry = InflightRegistry::new();
        let (tx, rx) = oneshot::channel::<()>();

        let id = registry.spawn(async move {
            let _ = rx.await;
        });
        assert!(registry.contains(id));

        tx.send(()).expect("task waiting");
        tokio::time::timeout(Duration::from_secs(1), async {
            while registry.contains(id) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("entry removed");
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn cancel_all_aborts_pending_tasks() {
        let registry = InflightRegistry::new();
        let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel::<()>();

        for _ in 0..3 {
            let done_tx = done_tx.clone();
            registry.spawn(async move {
                futures::future::pending::<()>().await;
                let _ = done_tx.send(());
            });
        }
        drop(done_tx);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.cancel_all(), 3);
        assert!(registry.is_empty());
        // Every sender lived inside an aborted task, so the channel closes empty.
        assert!(done_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn panicking_task_still_removes_its_entry() {
        let registry = InflightRegistry::new();
        let id = registry.spawn(async {
            panic!("task failed");
        });

        tokio::time::timeout(Duration::from_secs(1), async {
            while registry.contains(id) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("entry removed after panic");
    }

    #[tokio::test]
    async fn completion_is_skipped_when_cancelled_before_claim() {
        let registry = Arc::new(InflightRegistry::new());
        let fired = Arc::new(AtomicU64::new(0));
        let (cancelled_tx, cancelled_rx) = oneshot::channel();

        // The work itself tears the registry down right before it finishes,
        // the same interleaving as a shutdown from another worker.
        let work_registry = Arc::clone(&registry);
        let completion_fired = Arc::clone(&fired);
        registry.spawn_with_completion(
            async move {
                let _ = cancelled_tx.send(work_registry.cancel_all());
            },
            move |()| {
                completion_fired.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert_eq!(cancelled_rx.await.expect("work ran"), 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn request_ids_display_with_prefix() {
        assert_eq!(RequestId(7).to_string(), "req-7");
    }
}
