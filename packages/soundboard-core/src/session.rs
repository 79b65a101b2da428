//! Per-client control session.
//!
//! A session is one registered hub client plus the shared services. Inbound
//! messages are handled strictly in arrival order; replies to the sender go
//! through its own hub queue so they stay ordered with broadcasts.
//!
//! Volume and catalog changes are broadcast before the next change of the
//! same kind is applied, so every client ends on the level and list
//! actually in effect.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::catalog::Catalog;
use crate::error::PlaybackError;
use crate::hub::{ClientGuard, ClientHub, ClientId};
use crate::playback::PlaybackController;
use crate::protocol::ControlMessage;

/// One connected client's view of the soundboard.
pub struct ControlSession {
    guard: ClientGuard,
    catalog: Arc<Catalog>,
    playback: Arc<PlaybackController>,
}

impl ControlSession {
    /// Registers a new client with `hub`.
    ///
    /// The client's queue starts with the current catalog and volume. The
    /// returned receiver is the client's outbound queue.
    pub fn open(
        hub: &Arc<ClientHub>,
        catalog: Arc<Catalog>,
        playback: Arc<PlaybackController>,
    ) -> (Self, mpsc::Receiver<ControlMessage>) {
        let (guard, rx) = hub.register(|| {
            vec![
                ControlMessage::load(catalog.snapshot().to_vec()),
                ControlMessage::volume(playback.current_state().volume),
            ]
        });
        let session = Self {
            guard,
            catalog,
            playback,
        };
        (session, rx)
    }

    pub fn id(&self) -> ClientId {
        self.guard.id()
    }

    /// Fires when the hub drops this client or on force-close.
    pub fn cancel_token(&self) -> &CancellationToken {
        self.guard.cancel_token()
    }

    fn hub(&self) -> &Arc<ClientHub> {
        self.guard.hub()
    }

    /// Unregisters the client right away. A request still in progress may
    /// finish, but nothing more is queued for this client.
    pub fn leave(&self) {
        self.hub().unregister(self.id());
    }

    fn reply(&self, msg: ControlMessage) {
        self.hub().send_to(self.id(), msg);
    }

    /// Handles one inbound message to completion.
    pub async fn handle(&self, msg: ControlMessage) {
        match msg {
            ControlMessage::Play { sound_id, .. } => self.handle_play(sound_id).await,
            ControlMessage::Stop { .. } => {
                self.playback.stop();
            }
            ControlMessage::Volume { volume, .. } => {
                self.playback.set_volume_and(volume, |applied| {
                    self.hub()
                        .broadcast_except(self.id(), &ControlMessage::volume(applied));
                });
            }
            ControlMessage::Load { .. } => self.handle_reload().await,
            ControlMessage::Echo { msg } => self.reply(ControlMessage::Echo { msg }),
            ControlMessage::Error { msg, .. } => {
                log::warn!("[WS] Client {} reported error: {}", self.id(), msg);
            }
        }
    }

    async fn handle_play(&self, sound_id: i64) {
        let result = match self.catalog.get(sound_id) {
            Some(asset) => self.playback.play(&asset).await,
            None => Err(PlaybackError::UnknownAsset(sound_id)),
        };
        if let Err(e) = result {
            log::warn!("[WS] Client {} play #{} failed: {}", self.id(), sound_id, e);
            self.reply(ControlMessage::failure(&e));
        }
    }

    async fn handle_reload(&self) {
        let catalog = Arc::clone(&self.catalog);
        let hub = Arc::clone(self.hub());
        // The scan blocks, so the reload and its broadcast run off the runtime.
        let task = tokio::task::spawn_blocking(move || {
            catalog.reload_and(|assets| {
                hub.broadcast(&ControlMessage::load(assets.to_vec()));
            })
        });
        let reply = match task.await {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => {
                log::error!("[WS] Client {} reload failed: {}", self.id(), e);
                ControlMessage::failure(&e)
            }
            Err(e) => {
                log::error!("[WS] Client {} reload task failed: {}", self.id(), e);
                ControlMessage::error(format!("catalog reload task failed: {}", e))
            }
        };
        self.reply(reply);
    }
}
