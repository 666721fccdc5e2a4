//! Outbound command path
//!
//! Validates operator input, ships it over the transport, and records
//! it in the send history. History is only updated for commands that
//! were actually handed to the transport.

use fleet_protocol::ConsoleFrame;
use fleet_utils::{ConsoleError, Result};

use crate::history::SendHistory;
use crate::transport::MessageSender;

pub struct Outbound {
    sender: MessageSender,
    history: SendHistory,
}

impl Outbound {
    pub fn new(sender: MessageSender, history: SendHistory) -> Self {
        Self { sender, history }
    }

    /// Send `text` to `target`. Both are trimmed first; an empty target
    /// or empty command is rejected before anything touches the wire.
    pub async fn send_message(&mut self, target: &str, text: &str) -> Result<()> {
        let target = target.trim();
        let text = text.trim();
        if target.is_empty() {
            return Err(ConsoleError::validation("no target client selected"));
        }
        if text.is_empty() {
            return Err(ConsoleError::validation("refusing to send an empty command"));
        }

        self.sender.send(ConsoleFrame::send(target, text)).await?;
        tracing::info!(target, "Command sent");
        self.history.record(text);
        Ok(())
    }

    pub fn history(&self) -> &SendHistory {
        &self.history
    }
}
