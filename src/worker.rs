/// Background computation workers.
///
/// Each worker owns a private `OrbitalEngine` on a dedicated thread and
/// processes one request at a time, so responses come back in acceptance
/// order and none of the engine's caches need locking. The handle keeps the
/// pending-request table: correlation id to oneshot continuation. Killing a
/// worker resolves every outstanding continuation with a single
/// "worker terminated" failure; there are no timeouts.

use crate::engine::{EngineConfig, OrbitalEngine, Request, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// A response paired with the id of the request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: u64,
    pub response: Response,
}

enum WorkerMessage {
    Request { id: u64, request: Request },
    Shutdown,
}

type PendingTable = Arc<Mutex<HashMap<u64, oneshot::Sender<ResponseEnvelope>>>>;

pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<WorkerMessage>,
    pending: PendingTable,
    next_id: AtomicU64,
}

impl WorkerHandle {
    /// Spawn a computation thread with a fresh engine plus a router task
    /// that matches responses back to their continuations.
    pub fn spawn(config: EngineConfig) -> Self {
        let (req_tx, mut req_rx) = mpsc::unbounded_channel::<WorkerMessage>();
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel::<ResponseEnvelope>();

        std::thread::spawn(move || {
            let mut engine = OrbitalEngine::new(config);
            while let Some(message) = req_rx.blocking_recv() {
                match message {
                    WorkerMessage::Request { id, request } => {
                        let response = engine.handle(request);
                        if resp_tx.send(ResponseEnvelope { id, response }).is_err() {
                            break;
                        }
                    }
                    WorkerMessage::Shutdown => break,
                }
            }
        });

        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let router_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(envelope) = resp_rx.recv().await {
                let continuation = router_pending
                    .lock()
                    .ok()
                    .and_then(|mut table| table.remove(&envelope.id));
                if let Some(tx) = continuation {
                    let _ = tx.send(envelope);
                }
            }
            // Worker gone. Dropping the senders rejects every outstanding
            // continuation in one sweep.
            if let Ok(mut table) = router_pending.lock() {
                table.clear();
            }
        });

        WorkerHandle {
            tx: req_tx,
            pending,
            next_id: AtomicU64::new(1),
        }
    }

    /// Submit one request and await its response. Fails only when the worker
    /// has been terminated out from under the continuation.
    pub async fn request(&self, request: Request) -> Result<ResponseEnvelope, String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        self.pending
            .lock()
            .map_err(|_| "pending table poisoned".to_string())?
            .insert(id, tx);

        if self
            .tx
            .send(WorkerMessage::Request { id, request })
            .is_err()
        {
            if let Ok(mut table) = self.pending.lock() {
                table.remove(&id);
            }
            return Err("worker terminated".to_string());
        }

        rx.await.map_err(|_| "worker terminated".to_string())
    }

    /// Coarse cancellation: the worker stops after its current request and
    /// everything still queued or in flight is reported as terminated.
    pub fn terminate(&self) {
        let _ = self.tx.send(WorkerMessage::Shutdown);
    }

    /// Requests accepted but not yet resolved.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|table| table.len()).unwrap_or(0)
    }
}
