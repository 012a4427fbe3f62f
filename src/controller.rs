//! Three-state lifecycle (`Loading` / `Ready` / `Error`) around one async
//! fetch at a time.
//!
//! Fetches run on the tokio runtime and report back through a channel that
//! the UI drains once per frame with [`FetchController::poll`]. Every request
//! gets a generation number; completions from an older generation are
//! dropped, so the latest parameters always win regardless of arrival order.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::{mpsc, Arc};

use tokio::runtime::Handle;

use crate::api::ApiError;
use crate::session::Session;

pub type Waker = Arc<dyn Fn() + Send + Sync>;

pub type BoxFetch<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Ready(T),
    Error(String),
}

impl<T> FetchState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchState::Ready(v) => Some(v),
            _ => None,
        }
    }
}

struct Completion<T> {
    generation: u64,
    result: Result<T, ApiError>,
}

pub struct FetchController<K, T> {
    handle: Handle,
    session: Arc<Session>,
    waker: Option<Waker>,
    generation: u64,
    key: Option<K>,
    state: FetchState<T>,
    tx: mpsc::Sender<Completion<T>>,
    rx: mpsc::Receiver<Completion<T>>,
}

impl<K, T> FetchController<K, T>
where
    K: Clone + PartialEq + Debug,
    T: Send + 'static,
{
    pub fn new(handle: Handle, session: Arc<Session>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            handle,
            session,
            waker: None,
            generation: 0,
            key: None,
            state: FetchState::Loading,
            tx,
            rx,
        }
    }

    /// Called after each completion lands in the channel (e.g. a repaint).
    pub fn with_waker(mut self, waker: Waker) -> Self {
        self.waker = Some(waker);
        self
    }

    pub fn state(&self) -> &FetchState<T> {
        &self.state
    }

    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, FetchState::Loading)
    }

    /// Schedules a fetch for `key` unless `key` is already the current one
    /// and did not fail. Returns whether a fetch was issued.
    pub fn request<F, Fut>(&mut self, key: K, fetch: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        if self.key.as_ref() == Some(&key) && !matches!(self.state, FetchState::Error(_)) {
            return false;
        }
        self.issue(key, fetch);
        true
    }

    /// Re-fetches `key` even if it is current.
    pub fn reload<F, Fut>(&mut self, key: K, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.issue(key, fetch);
    }

    fn issue<F, Fut>(&mut self, key: K, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.generation += 1;
        let generation = self.generation;
        tracing::debug!(?key, generation, "fetch issued");
        self.key = Some(key);
        self.state = FetchState::Loading;

        let fut = fetch();
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        self.handle.spawn(async move {
            let result = fut.await;
            let _ = tx.send(Completion { generation, result });
            if let Some(wake) = waker {
                wake();
            }
        });
    }

    /// Applies finished fetches. Returns how many completions were drained,
    /// stale ones included.
    pub fn poll(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(done) = self.rx.try_recv() {
            drained += 1;
            if done.generation != self.generation {
                tracing::debug!(
                    stale = done.generation,
                    current = self.generation,
                    "discarding stale response"
                );
                continue;
            }
            self.state = match done.result {
                Ok(value) => FetchState::Ready(value),
                Err(err) => {
                    if err.is_unauthorized() {
                        self.session.invalidate();
                    } else {
                        tracing::warn!(key = ?self.key, "fetch failed: {err}");
                    }
                    FetchState::Error(err.to_string())
                }
            };
        }
        drained
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Polls until `expected` completions have been drained.
    pub(crate) async fn settle<K, T>(ctrl: &mut FetchController<K, T>, expected: usize)
    where
        K: Clone + PartialEq + Debug,
        T: Send + 'static,
    {
        let mut seen = 0;
        for _ in 0..400 {
            seen += ctrl.poll();
            if seen >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("only {seen} of {expected} completions arrived");
    }

    fn controller(session: Arc<Session>) -> FetchController<u32, &'static str> {
        FetchController::new(Handle::current(), session)
    }

    #[tokio::test]
    async fn success_moves_to_ready() {
        let mut ctrl = controller(Arc::new(Session::in_memory(None)));
        assert!(ctrl.is_loading());
        assert!(ctrl.request(1, || async { Ok("page one") }));
        settle(&mut ctrl, 1).await;
        assert_eq!(ctrl.state(), &FetchState::Ready("page one"));
    }

    #[tokio::test]
    async fn same_key_is_not_refetched() {
        let mut ctrl = controller(Arc::new(Session::in_memory(None)));
        assert!(ctrl.request(1, || async { Ok("a") }));
        assert!(!ctrl.request(1, || async { Ok("b") }));
        settle(&mut ctrl, 1).await;
        assert_eq!(ctrl.state(), &FetchState::Ready("a"));

        ctrl.reload(1, || async { Ok("c") });
        assert!(ctrl.is_loading());
        settle(&mut ctrl, 1).await;
        assert_eq!(ctrl.state(), &FetchState::Ready("c"));
    }

    #[tokio::test]
    async fn failed_key_is_refetched_on_next_request() {
        let mut ctrl = controller(Arc::new(Session::in_memory(None)));
        assert!(ctrl.request(1, || async { Err(ApiError::Status(503)) }));
        settle(&mut ctrl, 1).await;
        assert!(matches!(ctrl.state(), FetchState::Error(_)));

        assert!(ctrl.request(1, || async { Ok("recovered") }));
        settle(&mut ctrl, 1).await;
        assert_eq!(ctrl.state(), &FetchState::Ready("recovered"));
        assert!(!ctrl.request(1, || async { Ok("again") }));
    }

    #[tokio::test]
    async fn late_response_for_old_key_is_ignored() {
        let mut ctrl = controller(Arc::new(Session::in_memory(None)));
        let (old_tx, old_rx) = oneshot::channel::<()>();
        let (new_tx, new_rx) = oneshot::channel::<()>();

        ctrl.request(1, move || async move {
            let _ = old_rx.await;
            Ok("old")
        });
        ctrl.request(2, move || async move {
            let _ = new_rx.await;
            Ok("new")
        });

        new_tx.send(()).unwrap();
        settle(&mut ctrl, 1).await;
        assert_eq!(ctrl.state(), &FetchState::Ready("new"));

        old_tx.send(()).unwrap();
        settle(&mut ctrl, 1).await;
        assert_eq!(ctrl.state(), &FetchState::Ready("new"));
        assert_eq!(ctrl.key(), Some(&2));
    }

    #[tokio::test]
    async fn unauthorized_clears_session_and_redirects_once() {
        let session = Arc::new(Session::in_memory(Some("tok".into())));
        let mut ctrl = controller(session.clone());
        ctrl.request(1, || async { Err(ApiError::Unauthorized) });
        settle(&mut ctrl, 1).await;

        assert!(matches!(ctrl.state(), FetchState::Error(_)));
        assert!(session.token().is_none());
        assert!(session.take_login_redirect());
        assert!(!session.take_login_redirect());
    }

    #[tokio::test]
    async fn other_errors_keep_the_session() {
        let session = Arc::new(Session::in_memory(Some("tok".into())));
        let mut ctrl = controller(session.clone());
        ctrl.request(1, || async { Err(ApiError::Status(500)) });
        settle(&mut ctrl, 1).await;

        assert_eq!(
            ctrl.state(),
            &FetchState::Error("server returned HTTP 500".to_string())
        );
        assert!(session.is_authenticated());
        assert!(!session.take_login_redirect());
    }

    #[tokio::test]
    async fn waker_runs_after_completion() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut ctrl = controller(Arc::new(Session::in_memory(None))).with_waker(Arc::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));
        ctrl.request(1, || async { Ok("x") });
        settle(&mut ctrl, 1).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
