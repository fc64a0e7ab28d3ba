//! Audit store writer
//!
//! The writer owns the connection to the audit store for the lifetime of the
//! application. Writes are handed to a dedicated thread and the caller waits
//! at most the configured timeout for the acknowledgement; no answer in time
//! is reported as an audit write error.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::record::AuditRecord;
use super::store::AuditStore;
use crate::error::{SimulottoError, SimulottoResult};

/// Anything that can durably accept audit records
pub trait AuditWriter: Send + Sync {
    /// Persist one record; returns only once it is durable
    fn write(&self, record: &AuditRecord) -> SimulottoResult<()>;
}

impl AuditWriter for AuditStore {
    fn write(&self, record: &AuditRecord) -> SimulottoResult<()> {
        self.append(record)
    }
}

struct WriteRequest {
    record: AuditRecord,
    deadline: Instant,
    reply: mpsc::SyncSender<SimulottoResult<()>>,
}

/// Writes records through a background thread with a bounded wait
pub struct AuditStoreWriter {
    store: Arc<AuditStore>,
    timeout: Duration,
    sender: Mutex<Option<mpsc::Sender<WriteRequest>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AuditStoreWriter {
    /// Start the writer thread for an open store
    pub fn start(store: Arc<AuditStore>, timeout: Duration) -> SimulottoResult<Self> {
        let (sender, receiver) = mpsc::channel::<WriteRequest>();
        let worker_store = Arc::clone(&store);

        let worker = thread::Builder::new()
            .name("audit-writer".into())
            .spawn(move || {
                for request in receiver {
                    // Past the deadline the caller has given up and left its table unchanged
                    let result = if Instant::now() >= request.deadline {
                        Err(SimulottoError::AuditWrite(
                            "write deadline passed before the record reached the store".into(),
                        ))
                    } else {
                        worker_store.append(&request.record)
                    };
                    let _ = request.reply.send(result);
                }
            })
            .map_err(|e| {
                SimulottoError::AuditWrite(format!("Failed to start audit writer: {}", e))
            })?;

        info!(timeout_ms = timeout.as_millis() as u64, "audit writer started");

        Ok(Self {
            store,
            timeout,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// The store this writer appends to
    pub fn store(&self) -> &Arc<AuditStore> {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stop the writer thread and close the store
    ///
    /// Queued writes are drained before the thread exits.
    pub fn close(&self) -> SimulottoResult<()> {
        let sender = self
            .sender
            .lock()
            .map_err(|e| SimulottoError::AuditWrite(format!("Failed to acquire lock: {}", e)))?
            .take();
        drop(sender);

        let worker = self
            .worker
            .lock()
            .map_err(|e| SimulottoError::AuditWrite(format!("Failed to acquire lock: {}", e)))?
            .take();

        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!("audit writer thread panicked");
            }
        }

        self.store.close()
    }
}

impl AuditWriter for AuditStoreWriter {
    fn write(&self, record: &AuditRecord) -> SimulottoResult<()> {
        let sender = self
            .sender
            .lock()
            .map_err(|e| SimulottoError::AuditWrite(format!("Failed to acquire lock: {}", e)))?
            .clone()
            .ok_or_else(|| SimulottoError::AuditWrite("audit writer is closed".into()))?;

        let (reply, answer) = mpsc::sync_channel(1);
        let request = WriteRequest {
            record: record.clone(),
            deadline: Instant::now() + self.timeout,
            reply,
        };

        sender
            .send(request)
            .map_err(|_| SimulottoError::AuditWrite("audit writer has stopped".into()))?;

        match answer.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    record_id = %record.id().full(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "audit store did not acknowledge write in time"
                );
                Err(SimulottoError::AuditWrite(format!(
                    "audit store did not acknowledge within {:?}",
                    self.timeout
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(SimulottoError::AuditWrite("audit writer has stopped".into()))
            }
        }
    }
}

impl Drop for AuditStoreWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close audit writer cleanly");
        }
    }
}
