//! Session service: create, attach/detach, and channel semantics.
//!
//! DESIGN
//! ======
//! A session is created empty by HTTP and lives in memory while any socket
//! is attached. Sockets attach as a viewer or a renderer; both roles hold a
//! [`SessionHandle`] with the session's channels so the socket loops never
//! take the session map lock on the hot path.
//!
//! Viewer traffic is filtered per connection by a [`ViewerCursor`] and
//! funnels into the control slot ([`offer_camera`], [`request_render`]).
//! The renderer side drains it through a
//! [`RenderCursor`], which remembers what this renderer has already been
//! sent. Frames go the other way through [`validate_frame`] and
//! [`publish_frame`], which re-stamps them from a per-session counter so a
//! restarted renderer does not fall behind what viewers have already shown.
//!
//! A session is evicted when its last socket detaches, or by
//! [`expire_unclaimed`] if no socket ever attached.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::body::Bytes;
use frames::{CodecError, Envelope, FrameError, Payload};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{AppState, Control, SessionState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(Uuid),
    #[error("message of {len} bytes exceeds limit of {max}")]
    TooLarge { len: usize, max: usize },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("malformed frame: {0}")]
    Frame(#[from] FrameError),
    #[error("unexpected {0} payload")]
    UnexpectedPayload(&'static str),
}

/// Which end of the session a socket is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Viewer,
    Renderer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Viewer => "viewer",
            Self::Renderer => "renderer",
        })
    }
}

/// Channels of one session, held by an attached socket.
#[derive(Clone)]
pub struct SessionHandle {
    pub id: Uuid,
    pub control: Arc<watch::Sender<Control>>,
    pub frames: broadcast::Sender<Bytes>,
    pub frame_seq: Arc<AtomicU64>,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Create an empty session and return its ID. The session expires after
/// the configured unclaimed TTL unless a socket attaches first.
pub async fn create_session(state: &AppState) -> Uuid {
    let id = Uuid::new_v4();
    state.sessions.write().await.insert(id, SessionState::new(state.config.frame_backlog));
    info!(session_id = %id, "session created");
    tokio::spawn(expire_unclaimed(state.clone(), id, state.config.unclaimed_ttl()));
    id
}

/// Wait `ttl`, then remove the session if no socket ever attached to it.
pub async fn expire_unclaimed(state: AppState, id: Uuid, ttl: Duration) {
    tokio::time::sleep(ttl).await;
    let mut sessions = state.sessions.write().await;
    if sessions.get(&id).is_some_and(|session| !session.claimed) {
        sessions.remove(&id);
        info!(session_id = %id, "expired unclaimed session");
    }
}

pub async fn session_exists(state: &AppState, id: Uuid) -> bool {
    state.sessions.read().await.contains_key(&id)
}

/// Attach a socket to a session.
///
/// # Errors
///
/// Returns [`SessionError::NotFound`] if the session does not exist.
pub async fn attach(state: &AppState, id: Uuid, role: Role) -> Result<SessionHandle, SessionError> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or(SessionError::NotFound(id))?;
    session.sockets += 1;
    session.claimed = true;
    info!(session_id = %id, %role, sockets = session.sockets, "socket attached");
    Ok(SessionHandle {
        id,
        control: Arc::clone(&session.control),
        frames: session.frames.clone(),
        frame_seq: Arc::clone(&session.frame_seq),
    })
}

/// Detach a socket. Evicts the session when it was the last one.
pub async fn detach(state: &AppState, id: Uuid, role: Role) {
    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&id) else {
        return;
    };
    session.sockets = session.sockets.saturating_sub(1);
    info!(session_id = %id, %role, remaining = session.sockets, "socket detached");

    if session.sockets == 0 {
        sessions.remove(&id);
        info!(session_id = %id, "evicted session from memory");
    }
}

// =============================================================================
// VIEWER → RENDERER
// =============================================================================

/// Per-viewer ordering filter. Each viewer numbers its own envelopes, so
/// staleness is judged per connection before anything reaches the shared
/// slot.
#[derive(Debug, Default)]
pub struct ViewerCursor {
    last_camera_seq: Option<u64>,
}

impl ViewerCursor {
    /// Returns `true` and records `seq` if it is newer than the last camera
    /// accepted from this viewer.
    pub fn accept_camera(&mut self, seq: u64) -> bool {
        if self.last_camera_seq.is_some_and(|last| seq <= last) {
            return false;
        }
        self.last_camera_seq = Some(seq);
        true
    }
}

/// Replace the control camera. The stored envelope is re-stamped with the
/// slot's own sequence so renderers see one increasing series no matter how
/// many viewers feed it.
///
/// # Errors
///
/// Returns [`SessionError::UnexpectedPayload`] for non-camera envelopes.
pub fn offer_camera(control: &watch::Sender<Control>, envelope: Envelope) -> Result<u64, SessionError> {
    if !matches!(envelope.payload, Payload::Camera(_)) {
        return Err(SessionError::UnexpectedPayload(envelope.kind()));
    }
    let mut stamped = 0;
    control.send_modify(|slot| {
        stamped = slot.camera.as_ref().map_or(1, |current| current.seq + 1);
        slot.camera = Some(Envelope { seq: stamped, ..envelope });
    });
    Ok(stamped)
}

/// Record one more render request.
pub fn request_render(control: &watch::Sender<Control>) {
    control.send_modify(|slot| slot.render_seq += 1);
}

/// What one renderer has already been sent.
#[derive(Debug, Default)]
pub struct RenderCursor {
    camera_seq: Option<u64>,
    render_seq: u64,
}

impl RenderCursor {
    /// Envelopes to forward for the current control value: the camera if it
    /// is new to this renderer, then a render request if any arrived since
    /// the last one forwarded.
    pub fn pending(&mut self, control: &Control) -> Vec<Envelope> {
        let mut out = Vec::new();
        if let Some(camera) = &control.camera {
            if self.camera_seq != Some(camera.seq) {
                self.camera_seq = Some(camera.seq);
                out.push(camera.clone());
            }
        }
        if control.render_seq > self.render_seq {
            self.render_seq = control.render_seq;
            out.push(Envelope::render_request(control.render_seq));
        }
        out
    }
}

// =============================================================================
// RENDERER → VIEWER
// =============================================================================

/// Decode and validate a frame message from the renderer.
///
/// # Errors
///
/// Returns an error for oversized, undecodable, non-frame, or internally
/// inconsistent messages.
pub fn validate_frame(bytes: &[u8], max_frame_bytes: usize) -> Result<Envelope, SessionError> {
    if bytes.len() > max_frame_bytes {
        return Err(SessionError::TooLarge { len: bytes.len(), max: max_frame_bytes });
    }
    let envelope = frames::decode_envelope(bytes)?;
    let Payload::Frame(frame) = &envelope.payload else {
        return Err(SessionError::UnexpectedPayload(envelope.kind()));
    };
    frame.check()?;
    Ok(envelope)
}

/// A frame after it has been stamped and broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    /// Sequence the renderer sent.
    pub renderer_seq: u64,
    /// Sequence viewers see.
    pub seq: u64,
    pub viewers: usize,
}

/// Re-stamp a validated frame with the session's next frame sequence and
/// broadcast it to every viewer. The session sequence keeps increasing
/// across renderer reconnects.
pub fn publish_frame(handle: &SessionHandle, envelope: Envelope) -> Published {
    let renderer_seq = envelope.seq;
    let seq = handle.frame_seq.fetch_add(1, Ordering::Relaxed) + 1;
    let bytes = Bytes::from(frames::encode_envelope(&Envelope { seq, ..envelope }));
    // No subscribers is not an error: the frame is simply unseen.
    let viewers = handle.frames.send(bytes).unwrap_or(0);
    if renderer_seq != seq {
        debug!(session_id = %handle.id, renderer_seq, seq, "frame restamped");
    }
    Published { renderer_seq, seq, viewers }
}
