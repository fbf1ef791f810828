//! WebSocket handlers for the viewer and renderer ends of a session.
//!
//! DESIGN
//! ======
//! Both roles enter a `select!` loop after upgrade:
//! - Viewer: inbound camera / render-request envelopes → control slot;
//!   broadcast frames → forwarded verbatim to the viewer.
//! - Renderer: control slot changes → camera + render request to the
//!   renderer; inbound frame envelopes → validated → re-stamped → broadcast.
//!
//! Malformed messages are logged and dropped. They never end the loop; only
//! a closed or failed socket does.
//!
//! LIFECYCLE
//! =========
//! 1. Unknown session → 404 before upgrade
//! 2. Upgrade → attach to session
//! 3. Loop until close
//! 4. Detach (evicts the session after its last socket)

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use frames::{Envelope, Payload};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::session::{self, RenderCursor, Role, SessionHandle, ViewerCursor};
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_view(State(state): State<AppState>, Path(id): Path<Uuid>, ws: WebSocketUpgrade) -> Response {
    upgrade(state, id, ws, Role::Viewer).await
}

pub async fn handle_render(State(state): State<AppState>, Path(id): Path<Uuid>, ws: WebSocketUpgrade) -> Response {
    upgrade(state, id, ws, Role::Renderer).await
}

async fn upgrade(state: AppState, id: Uuid, ws: WebSocketUpgrade, role: Role) -> Response {
    if !session::session_exists(&state, id).await {
        return (StatusCode::NOT_FOUND, "session not found").into_response();
    }
    ws.on_upgrade(move |socket| run_ws(socket, state, id, role))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(socket: WebSocket, state: AppState, id: Uuid, role: Role) {
    // The session can be evicted between the existence check and here.
    let handle = match session::attach(&state, id, role).await {
        Ok(handle) => handle,
        Err(e) => {
            warn!(session_id = %id, %role, error = %e, "ws: attach failed");
            return;
        }
    };

    info!(session_id = %id, %role, "ws: connected");
    match role {
        Role::Viewer => run_viewer(socket, &handle).await,
        Role::Renderer => run_renderer(socket, &handle, state.config.max_frame_bytes).await,
    }

    session::detach(&state, id, role).await;
    info!(session_id = %id, %role, "ws: disconnected");
}

async fn run_viewer(mut socket: WebSocket, handle: &SessionHandle) {
    let mut frames_rx = handle.frames.subscribe();
    let mut cursor = ViewerCursor::default();

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Binary(bytes) => apply_viewer_message(handle, &mut cursor, &bytes),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frame = frames_rx.recv() => {
                match frame {
                    Ok(bytes) => {
                        if socket.send(Message::Binary(bytes)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(session_id = %handle.id, skipped, "ws: viewer lagging, skipped frames");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

async fn run_renderer(mut socket: WebSocket, handle: &SessionHandle, max_frame_bytes: usize) {
    let mut control_rx = handle.control.subscribe();
    let mut cursor = RenderCursor::default();

    // A renderer joining late still gets the current camera.
    let initial = cursor.pending(&control_rx.borrow_and_update());
    if send_envelopes(&mut socket, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Binary(bytes) => apply_renderer_message(handle, &bytes, max_frame_bytes),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            changed = control_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let pending = cursor.pending(&control_rx.borrow_and_update());
                if send_envelopes(&mut socket, &pending).await.is_err() {
                    break;
                }
            }
        }
    }
}

// =============================================================================
// MESSAGE HANDLING
// =============================================================================

fn apply_viewer_message(handle: &SessionHandle, cursor: &mut ViewerCursor, bytes: &[u8]) {
    let envelope = match frames::decode_envelope(bytes) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(session_id = %handle.id, error = %e, "ws: invalid viewer message");
            return;
        }
    };

    match envelope.payload {
        Payload::Camera(_) => {
            let seq = envelope.seq;
            if !cursor.accept_camera(seq) {
                debug!(session_id = %handle.id, seq, "ws: stale camera dropped");
                return;
            }
            match session::offer_camera(&handle.control, envelope) {
                Ok(slot_seq) => debug!(session_id = %handle.id, seq, slot_seq, "ws: camera updated"),
                Err(e) => warn!(session_id = %handle.id, error = %e, "ws: camera rejected"),
            }
        }
        Payload::RenderRequest => session::request_render(&handle.control),
        Payload::Frame(_) => {
            warn!(session_id = %handle.id, seq = envelope.seq, "ws: frame from viewer dropped");
        }
    }
}

fn apply_renderer_message(handle: &SessionHandle, bytes: &[u8], max_frame_bytes: usize) {
    match session::validate_frame(bytes, max_frame_bytes) {
        Ok(envelope) => {
            let published = session::publish_frame(handle, envelope);
            debug!(session_id = %handle.id, seq = published.seq, viewers = published.viewers, "ws: frame relayed");
        }
        Err(e) => warn!(session_id = %handle.id, error = %e, "ws: invalid frame dropped"),
    }
}

async fn send_envelopes(socket: &mut WebSocket, envelopes: &[Envelope]) -> Result<(), axum::Error> {
    for envelope in envelopes {
        socket.send(Message::Binary(frames::encode_envelope(envelope).into())).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;
