//! Communication with the presentation layer
//!
//! This module defines the trait for sending quiz updates to the view that
//! owns an attempt. The tunnel abstraction keeps the countdown driver
//! independent of how the view renders or transports them.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages to the view of an attempt
///
/// Implementations might forward to a UI event loop, a WebSocket, or a
/// test recorder.
pub trait Tunnel {
    /// Sends an incremental update message
    ///
    /// Update messages describe a single change, such as one second less
    /// on the clock or a newly chosen answer.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends the complete current state
    ///
    /// Sync messages are sent when the attempt starts and whenever its
    /// phase changes, so a view can redraw from scratch.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);

    /// Closes the tunnel once the attempt has ended
    fn close(self);
}
