#![forbid(unsafe_code)]

//! Off-thread layout with last-request-wins ordering.
//!
//! [`LayoutWorker`] owns a background thread that runs a [`LayoutEngine`]
//! over requests received on a channel. Requests carry a monotonically
//! increasing id; replies echo it. There is no cancellation: when several
//! requests are queued the worker skips straight to the newest one, and the
//! caller discards any reply whose id is not the latest it dispatched.
//!
//! [`LayoutScheduler`] is the caller side. Small trees are laid out inline;
//! trees above the node threshold go to the worker. If the worker cannot be
//! started or has died, the scheduler logs it and falls back to inline
//! layout, so a layout failure only ever delays a paint.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mindmap_core::node::Node;

use crate::config::LayoutConfig;
use crate::engine::{LayoutEngine, PositionMap};

/// A layout job.
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    pub id: u64,
    pub root: Option<Arc<Node>>,
    pub config: LayoutConfig,
}

/// A finished layout job.
#[derive(Debug, Clone)]
pub struct LayoutResponse {
    /// Id of the request this answers.
    pub id: u64,
    pub positions: PositionMap,
}

/// Worker channel failures.
#[derive(Debug)]
pub enum LayoutWorkerError {
    /// The worker thread could not be started.
    Spawn(std::io::Error),
    /// The worker thread is gone.
    Disconnected,
}

impl fmt::Display for LayoutWorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "failed to start layout worker: {e}"),
            Self::Disconnected => f.write_str("layout worker disconnected"),
        }
    }
}

impl std::error::Error for LayoutWorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(e) => Some(e),
            Self::Disconnected => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Background layout thread.
///
/// Dropping the worker closes its request channel. An idle thread is joined;
/// a thread still inside a layout is detached and exits once that layout
/// finishes, since its reply has nowhere to go.
#[derive(Debug)]
pub struct LayoutWorker {
    requests: Option<Sender<LayoutRequest>>,
    responses: Receiver<LayoutResponse>,
    handle: Option<JoinHandle<()>>,
}

impl LayoutWorker {
    /// Start the worker thread.
    pub fn spawn() -> Result<Self, LayoutWorkerError> {
        let (request_tx, request_rx) = mpsc::channel::<LayoutRequest>();
        let (response_tx, response_rx) = mpsc::channel::<LayoutResponse>();
        let handle = thread::Builder::new()
            .name("mindmap-layout".into())
            .spawn(move || worker_loop(&request_rx, &response_tx))
            .map_err(LayoutWorkerError::Spawn)?;
        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        })
    }

    /// Queue a request.
    pub fn submit(&self, request: LayoutRequest) -> Result<(), LayoutWorkerError> {
        self.requests
            .as_ref()
            .ok_or(LayoutWorkerError::Disconnected)?
            .send(request)
            .map_err(|_| LayoutWorkerError::Disconnected)
    }

    /// Next reply if one is ready.
    pub fn try_recv(&self) -> Result<Option<LayoutResponse>, LayoutWorkerError> {
        match self.responses.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(LayoutWorkerError::Disconnected),
        }
    }

    /// Wait up to `timeout` for the next reply.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<LayoutResponse>, LayoutWorkerError> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LayoutWorkerError::Disconnected),
        }
    }
}

impl Drop for LayoutWorker {
    fn drop(&mut self) {
        self.requests.take();
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            tracing::trace!(target: "mindmap.layout", "detaching busy layout worker");
        }
    }
}

fn worker_loop(requests: &Receiver<LayoutRequest>, responses: &Sender<LayoutResponse>) {
    let mut engine = LayoutEngine::default();
    while let Ok(mut request) = requests.recv() {
        // Skip to the newest queued request; older replies would be stale.
        while let Ok(newer) = requests.try_recv() {
            request = newer;
        }
        engine.set_config(request.config);
        let positions = engine.compute(request.root.as_deref());
        if responses
            .send(LayoutResponse {
                id: request.id,
                positions,
            })
            .is_err()
        {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Result of [`LayoutScheduler::schedule`].
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOutcome {
    /// Computed inline.
    Ready(PositionMap),
    /// Sent to the worker; poll for the reply.
    Pending { request_id: u64 },
}

/// Chooses inline or off-thread layout and filters stale replies.
#[derive(Debug)]
pub struct LayoutScheduler {
    engine: LayoutEngine,
    worker: Option<LayoutWorker>,
    async_threshold: usize,
    next_id: u64,
    latest_id: u64,
    pending: bool,
}

impl LayoutScheduler {
    /// Trees with more than `async_threshold` nodes are laid out off-thread.
    #[must_use]
    pub fn new(config: LayoutConfig, async_threshold: usize) -> Self {
        Self {
            engine: LayoutEngine::new(config),
            worker: None,
            async_threshold,
            next_id: 1,
            latest_id: 0,
            pending: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        self.engine.config()
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.engine.set_config(config);
    }

    #[must_use]
    pub fn async_threshold(&self) -> usize {
        self.async_threshold
    }

    pub fn set_async_threshold(&mut self, async_threshold: usize) {
        self.async_threshold = async_threshold;
    }

    /// Id of the most recently dispatched request (0 before the first).
    #[must_use]
    pub fn latest_id(&self) -> u64 {
        self.latest_id
    }

    /// Whether an off-thread request is still outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Lay out `root`, inline or on the worker depending on its size.
    ///
    /// Any request still in flight becomes stale.
    pub fn schedule(&mut self, root: Option<&Arc<Node>>) -> LayoutOutcome {
        let request_id = self.next_id;
        self.next_id += 1;
        self.latest_id = request_id;

        let node_count = root.map_or(0, |r| r.node_count());
        if node_count > self.async_threshold {
            match self.dispatch(request_id, root) {
                Ok(()) => {
                    tracing::debug!(
                        target: "mindmap.layout",
                        request_id,
                        node_count = node_count as u64,
                        "async layout dispatched"
                    );
                    self.pending = true;
                    return LayoutOutcome::Pending { request_id };
                }
                Err(err) => {
                    tracing::warn!(
                        target: "mindmap.layout",
                        request_id,
                        error = %err,
                        "layout worker unavailable, computing inline"
                    );
                    self.worker = None;
                }
            }
        }

        self.pending = false;
        LayoutOutcome::Ready(self.engine.compute(root.map(Arc::as_ref)))
    }

    fn dispatch(&mut self, id: u64, root: Option<&Arc<Node>>) -> Result<(), LayoutWorkerError> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => LayoutWorker::spawn()?,
        };
        let result = worker.submit(LayoutRequest {
            id,
            root: root.cloned(),
            config: self.engine.config().clone(),
        });
        if result.is_ok() {
            self.worker = Some(worker);
        }
        result
    }

    /// Drain ready replies, returning the positions of the latest request if
    /// it has arrived. Stale replies are discarded.
    pub fn poll(&mut self) -> Option<PositionMap> {
        let mut fresh = None;
        loop {
            let received = match self.worker.as_ref().map(LayoutWorker::try_recv) {
                Some(Ok(received)) => received,
                Some(Err(err)) => {
                    self.worker_lost(&err);
                    break;
                }
                None => break,
            };
            let Some(response) = received else {
                break;
            };
            if let Some(positions) = self.accept(response) {
                fresh = Some(positions);
            }
        }
        fresh
    }

    /// Block up to `timeout` for the latest request's reply.
    pub fn wait(&mut self, timeout: Duration) -> Option<PositionMap> {
        let deadline = web_time::Instant::now() + timeout;
        while self.pending {
            let remaining = deadline.saturating_duration_since(web_time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            let received = match self.worker.as_ref().map(|w| w.recv_timeout(remaining)) {
                Some(Ok(received)) => received,
                Some(Err(err)) => {
                    self.worker_lost(&err);
                    return None;
                }
                None => return None,
            };
            if let Some(positions) = received.and_then(|response| self.accept(response)) {
                return Some(positions);
            }
        }
        None
    }

    fn accept(&mut self, response: LayoutResponse) -> Option<PositionMap> {
        if response.id == self.latest_id {
            self.pending = false;
            Some(response.positions)
        } else {
            tracing::debug!(
                target: "mindmap.layout",
                request_id = response.id,
                latest_id = self.latest_id,
                "stale layout reply discarded"
            );
            None
        }
    }

    fn worker_lost(&mut self, err: &LayoutWorkerError) {
        tracing::warn!(target: "mindmap.layout", error = %err, "layout worker lost");
        self.worker = None;
        self.pending = false;
    }
}
