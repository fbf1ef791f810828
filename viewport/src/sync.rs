//! Client-side endpoints of the frame synchronization channel.
//!
//! The transport itself (WebSocket, relay, renderer) is outside this crate.
//! These types only enforce the channel's ordering contract on our side:
//!
//! - [`Outbox`]: camera state is "latest value wins". Posting twice before a
//!   drain keeps only the second state.
//! - [`Inbox`]: frames are applied in production order. A frame whose `seq`
//!   is not newer than the last accepted one is dropped.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use frames::{CameraState, Envelope, FrameBuffer, Payload};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to decode envelope: {0}")]
    Codec(#[from] frames::CodecError),
    #[error("unexpected {0} payload on the frame channel")]
    UnexpectedPayload(&'static str),
}

/// Local → remote slot holding the most recent unpublished camera state.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Option<CameraState>,
    next_seq: u64,
}

impl Outbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending camera state.
    pub fn post(&mut self, state: CameraState) {
        self.pending = Some(state);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drain the pending state as a camera envelope followed by a render
    /// request. Empty when nothing is pending.
    pub fn take(&mut self) -> Vec<Envelope> {
        let Some(state) = self.pending.take() else {
            return Vec::new();
        };
        let camera = Envelope::camera(self.bump(), state);
        let render = Envelope::render_request(self.bump());
        vec![camera, render]
    }

    fn bump(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// Remote → local filter that keeps frames in production order.
#[derive(Debug, Default)]
pub struct Inbox {
    last_seq: Option<u64>,
}

impl Inbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    /// Decode raw bytes and pass them through [`Inbox::accept`].
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] for undecodable bytes and
    /// [`SyncError::UnexpectedPayload`] for anything other than a frame.
    pub fn accept_bytes(&mut self, bytes: &[u8]) -> Result<Option<FrameBuffer>, SyncError> {
        let envelope = frames::decode_envelope(bytes)?;
        self.accept(envelope)
    }

    /// Returns the frame if it is newer than the last accepted one.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnexpectedPayload`] for non-frame envelopes.
    pub fn accept(&mut self, envelope: Envelope) -> Result<Option<FrameBuffer>, SyncError> {
        let kind = envelope.kind();
        let Payload::Frame(frame) = envelope.payload else {
            return Err(SyncError::UnexpectedPayload(kind));
        };
        if self.last_seq.is_some_and(|last| envelope.seq <= last) {
            return Ok(None);
        }
        self.last_seq = Some(envelope.seq);
        Ok(Some(frame))
    }
}
