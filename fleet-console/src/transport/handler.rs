//! Outbound frame sender

use fleet_protocol::ConsoleFrame;
use fleet_utils::{ConsoleError, Result};
use tokio::sync::{mpsc, watch};

use super::ConnectionState;

/// Clonable handle for sending frames to the backend
///
/// Sends are only permitted while the connection is open; any other state
/// fails fast with [`ConsoleError::NotConnected`] rather than queuing the
/// frame for later.
#[derive(Clone)]
pub struct MessageSender {
    tx: mpsc::Sender<ConsoleFrame>,
    status: watch::Receiver<ConnectionState>,
}

impl MessageSender {
    pub fn new(tx: mpsc::Sender<ConsoleFrame>, status: watch::Receiver<ConnectionState>) -> Self {
        Self { tx, status }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.status.borrow()
    }

    /// Send a frame, rejecting immediately unless the connection is open
    pub async fn send(&self, frame: ConsoleFrame) -> Result<()> {
        if self.state() != ConnectionState::Open {
            return Err(ConsoleError::NotConnected);
        }
        self.tx
            .send(frame)
            .await
            .map_err(|_| ConsoleError::ConnectionClosed)?;
        Ok(())
    }
}
