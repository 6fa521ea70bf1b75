//! Bounded single-writer queue
//!
//! SQLite permits one writer at a time. In queued mode every write goes
//! through one consumer task; submitters await the typed result.

use futures::future::BoxFuture;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::error::{PersistenceError, Result};
use crate::model::Backend;
use crate::operation::Operation;

pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

type WriteTask = Box<dyn FnOnce(Dispatcher) -> BoxFuture<'static, ()> + Send>;

/// Submission side of the write queue
#[derive(Clone)]
pub struct WriteQueue {
    sender: mpsc::Sender<WriteTask>,
    capacity: usize,
}

impl std::fmt::Debug for WriteQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteQueue")
            .field("capacity", &self.capacity)
            .field("pending", &self.pending())
            .finish()
    }
}

impl WriteQueue {
    /// Spawn the consumer task. It stops when `shutdown` fires and cancels
    /// everything still queued.
    pub fn start(
        dispatcher: Dispatcher,
        capacity: usize,
        mut shutdown: broadcast::Receiver<()>,
    ) -> (Self, JoinHandle<()>) {
        let capacity = capacity.max(1);
        let (sender, mut receiver) = mpsc::channel::<WriteTask>(capacity);

        let worker = tokio::spawn(async move {
            info!(capacity, "Write queue consumer started");
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => break,
                    task = receiver.recv() => match task {
                        Some(task) => task(dispatcher.clone()).await,
                        None => break,
                    },
                }
            }

            receiver.close();
            let mut cancelled = 0usize;
            while let Ok(task) = receiver.try_recv() {
                drop(task);
                cancelled += 1;
            }
            if cancelled > 0 {
                warn!(cancelled, "Write queue stopped with pending tasks");
            } else {
                info!("Write queue stopped");
            }
        });

        (Self { sender, capacity }, worker)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks waiting in the queue
    pub fn pending(&self) -> usize {
        self.capacity - self.sender.capacity()
    }

    /// Enqueue `op` and wait for the consumer to run it. Fails immediately
    /// with [`PersistenceError::Rejected`] when the queue is full.
    pub async fn submit<O: Operation>(&self, op: O) -> Result<O::Output> {
        let kind = O::kind();
        let (reply, result) = oneshot::channel();
        let task: WriteTask = Box::new(move |dispatcher: Dispatcher| -> BoxFuture<'static, ()> {
            Box::pin(async move {
                let outcome = dispatcher.execute(op).await;
                let _ = reply.send(outcome);
            })
        });

        match self.sender.try_send(task) {
            Ok(()) => debug!(%kind, "Write task queued"),
            Err(TrySendError::Full(_)) => {
                warn!(%kind, capacity = self.capacity, "Write queue full");
                return Err(PersistenceError::Rejected(kind));
            }
            Err(TrySendError::Closed(_)) => return Err(PersistenceError::Cancelled(kind)),
        }

        result
            .await
            .map_err(|_| PersistenceError::Cancelled(kind))?
    }
}

/// Write path for business code: direct dispatch, or through the queue when
/// the store allows only one writer.
#[derive(Clone, Debug)]
pub enum Writer {
    Direct(Dispatcher),
    Queued {
        queue: WriteQueue,
        dispatcher: Dispatcher,
    },
}

impl Writer {
    pub fn direct(dispatcher: Dispatcher) -> Self {
        Writer::Direct(dispatcher)
    }

    pub fn queued(queue: WriteQueue, dispatcher: Dispatcher) -> Self {
        Writer::Queued { queue, dispatcher }
    }

    pub fn backend(&self) -> Backend {
        self.dispatcher().backend()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        match self {
            Writer::Direct(dispatcher) => dispatcher,
            Writer::Queued { dispatcher, .. } => dispatcher,
        }
    }

    pub fn is_queued(&self) -> bool {
        matches!(self, Writer::Queued { .. })
    }

    /// Writes go through the queue in queued mode; reads never do.
    pub async fn submit<O: Operation>(&self, op: O) -> Result<O::Output> {
        match self {
            Writer::Queued { queue, .. } if O::VARIANT.is_write() => queue.submit(op).await,
            Writer::Queued { dispatcher, .. } | Writer::Direct(dispatcher) => {
                dispatcher.execute(op).await
            }
        }
    }
}
