//! Registry of connected control clients and message fan-out.
//!
//! - `ClientHub`: tracks every connected client and its outbound queue
//! - `ClientGuard`: RAII guard that unregisters a client on drop
//!
//! Each client owns a bounded queue drained by its own session task.
//! Broadcasts never wait on a slow client: a full or closed queue gets that
//! client dropped from the hub and its session cancelled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use crate::protocol::ControlMessage;

/// Identifies one registered client.
pub type ClientId = u64;

struct ClientEntry {
    tx: mpsc::Sender<ControlMessage>,
    cancel: CancellationToken,
}

/// Manages all connected control clients.
pub struct ClientHub {
    clients: RwLock<HashMap<ClientId, ClientEntry>>,
    next_id: AtomicU64,
    /// Parent of every client token. Replaced after `close_all()`.
    global_cancel: RwLock<CancellationToken>,
    queue_capacity: usize,
}

impl ClientHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            global_cancel: RwLock::new(CancellationToken::new()),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Registers a new client.
    ///
    /// `initial` builds the initial-state messages. It runs while the hub is
    /// write-locked and its messages are queued before the client becomes
    /// visible to broadcasts, so they are always the first thing it receives.
    pub fn register<F>(self: &Arc<Self>, initial: F) -> (ClientGuard, mpsc::Receiver<ControlMessage>)
    where
        F: FnOnce() -> Vec<ControlMessage>,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = self.global_cancel.read().child_token();

        let mut clients = self.clients.write();
        let initial = initial();
        let (tx, rx) = mpsc::channel(self.queue_capacity.max(initial.len()));
        for msg in initial {
            // Capacity covers every initial message.
            let _ = tx.try_send(msg);
        }
        clients.insert(
            id,
            ClientEntry {
                tx,
                cancel: cancel.clone(),
            },
        );
        log::info!("[Hub] Client registered: {} (total: {})", id, clients.len());
        drop(clients);

        let guard = ClientGuard {
            id,
            hub: Arc::clone(self),
            cancel,
        };
        (guard, rx)
    }

    /// Removes a client. Unknown ids are ignored.
    pub fn unregister(&self, id: ClientId) {
        let removed = self.clients.write().remove(&id);
        if let Some(entry) = removed {
            entry.cancel.cancel();
            log::info!(
                "[Hub] Client unregistered: {} (remaining: {})",
                id,
                self.client_count()
            );
        }
    }

    /// Queues `msg` for every client, including the originator of the request.
    ///
    /// Returns the number of clients the message was queued for.
    pub fn broadcast(&self, msg: &ControlMessage) -> usize {
        self.fan_out(msg, None)
    }

    /// Queues `msg` for every client except `origin`.
    pub fn broadcast_except(&self, origin: ClientId, msg: &ControlMessage) -> usize {
        self.fan_out(msg, Some(origin))
    }

    /// Queues `msg` for a single client.
    ///
    /// Returns `false` if the client is gone or had to be dropped.
    pub fn send_to(&self, id: ClientId, msg: ControlMessage) -> bool {
        let result = match self.clients.read().get(&id) {
            Some(entry) => entry.tx.try_send(msg),
            None => return false,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                self.drop_client(id, &e);
                false
            }
        }
    }

    fn fan_out(&self, msg: &ControlMessage, skip: Option<ClientId>) -> usize {
        let mut delivered = 0;
        let mut failed = Vec::new();
        {
            let clients = self.clients.read();
            for (&id, entry) in clients.iter() {
                if Some(id) == skip {
                    continue;
                }
                match entry.tx.try_send(msg.clone()) {
                    Ok(()) => delivered += 1,
                    Err(e) => failed.push((id, e)),
                }
            }
        }
        for (id, e) in failed {
            self.drop_client(id, &e);
        }
        log::debug!(
            "[Hub] Broadcast '{}' to {} client(s)",
            msg.kind(),
            delivered
        );
        delivered
    }

    fn drop_client(&self, id: ClientId, reason: &TrySendError<ControlMessage>) {
        match reason {
            TrySendError::Full(_) => {
                log::warn!("[Hub] Client {} queue full, disconnecting", id)
            }
            TrySendError::Closed(_) => log::debug!("[Hub] Client {} queue closed", id),
        }
        self.unregister(id);
    }

    /// Returns the number of registered clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Force-closes all client sessions.
    ///
    /// Cancels the global token, which signals every session loop to
    /// terminate. A fresh token is installed so new clients can still
    /// connect afterwards.
    ///
    /// Returns the number of clients that were signaled to close.
    pub fn close_all(&self) -> usize {
        let count = self.client_count();
        if count > 0 {
            log::info!("[Hub] Force-closing {} client(s)", count);
        }
        let mut guard = self.global_cancel.write();
        guard.cancel();
        *guard = CancellationToken::new();
        count
    }
}

/// RAII guard that unregisters a client when dropped.
pub struct ClientGuard {
    id: ClientId,
    hub: Arc<ClientHub>,
    /// Cancelled on force-close or when the hub drops this client.
    cancel: CancellationToken,
}

impl ClientGuard {
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Use in `tokio::select!` to detect force-close requests.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn hub(&self) -> &Arc<ClientHub> {
        &self.hub
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.hub.unregister(self.id);
    }
}
