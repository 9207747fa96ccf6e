use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Trailing-edge debouncer for live-typing callers: collapses a burst of
/// calls into one invocation of the wrapped action, `delay` after the last
/// call. Fire-and-forget; callers observe completion through whatever state
/// the action itself updates.
///
/// A single busy flag makes the debounced path and the immediate
/// [`call_now`](Self::call_now) path mutually exclusive, so at most one net
/// request is outstanding per keystroke sequence.
pub struct Debouncer<F> {
    delay: Duration,
    action: Arc<F>,
    busy: Arc<AtomicBool>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<F, Fut> Debouncer<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    pub fn new(delay: Duration, action: F) -> Self {
        Self {
            delay,
            action: Arc::new(action),
            busy: Arc::new(AtomicBool::new(false)),
            pending: Mutex::new(None),
        }
    }

    /// Cancels any pending scheduled invocation and schedules a new one
    /// `delay` from now with these arguments.
    pub fn call(&self, prompt: impl Into<String>) {
        let prompt = prompt.into();
        let delay = self.delay;
        let action = Arc::clone(&self.action);
        let busy = Arc::clone(&self.busy);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            dispatch(action, busy, prompt).await;
        });

        if let Some(previous) = self.replace_pending(Some(task)) {
            previous.abort();
        }
    }

    /// Commit-now path (an Enter-key action): cancels the pending timer and
    /// dispatches immediately. The busy flag keeps this from double-firing
    /// against a dispatch already in flight.
    pub fn call_now(&self, prompt: impl Into<String>) {
        self.cancel_pending();

        let prompt = prompt.into();
        let action = Arc::clone(&self.action);
        let busy = Arc::clone(&self.busy);
        tokio::spawn(dispatch(action, busy, prompt));
    }

    /// Drops the pending scheduled invocation, if any. Does not abort a
    /// dispatch that already started.
    pub fn cancel_pending(&self) {
        if let Some(previous) = self.replace_pending(None) {
            previous.abort();
        }
    }

    /// True while a dispatched action is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn replace_pending(&self, task: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match task {
            Some(task) => pending.replace(task),
            None => pending.take(),
        }
    }
}

impl<F> Drop for Debouncer<F> {
    fn drop(&mut self) {
        if let Ok(pending) = self.pending.get_mut() {
            if let Some(task) = pending.take() {
                task.abort();
            }
        }
    }
}

async fn dispatch<F, Fut>(action: Arc<F>, busy: Arc<AtomicBool>, prompt: String)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if busy
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        tracing::debug!("generation already in flight, dropping dispatch");
        return;
    }
    action(prompt).await;
    busy.store(false, Ordering::SeqCst);
}

/// Supersession guard for callers that let a newer request start while an
/// older one is still in flight: stale completions are detected and their
/// results dropped instead of applied.
#[derive(Debug, Clone, Default)]
pub struct SequenceGate {
    latest: Arc<AtomicU64>,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket for a new request. Every earlier ticket becomes
    /// superseded.
    pub fn issue(&self) -> SequenceTicket {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        SequenceTicket {
            seq,
            latest: Arc::clone(&self.latest),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequenceTicket {
    seq: u64,
    latest: Arc<AtomicU64>,
}

impl SequenceTicket {
    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::SeqCst) > self.seq
    }
}
