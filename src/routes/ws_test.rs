//! End-to-end relay tests over real sockets.

use std::net::SocketAddr;

use frames::{CameraState, FrameBuffer, PixelFormat};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::*;
use crate::config::RelayConfig;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// HELPERS
// =============================================================================

async fn spawn_relay() -> (SocketAddr, AppState) {
    let state = AppState::new(RelayConfig { max_frame_bytes: 64 * 1024, ..RelayConfig::default() });
    let app = crate::routes::app(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, id: Uuid, role: &str) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/api/session/{id}/{role}")).await.expect("connect");
    ws
}

async fn send(ws: &mut Client, envelope: &Envelope) {
    send_raw(ws, frames::encode_envelope(envelope)).await;
}

async fn send_raw(ws: &mut Client, bytes: Vec<u8>) {
    ws.send(WsMessage::Binary(bytes.into())).await.expect("send");
}

async fn recv_envelope(ws: &mut Client) -> Envelope {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for message")
            .expect("stream ended")
            .expect("websocket error");
        if let WsMessage::Binary(bytes) = msg {
            return frames::decode_envelope(&bytes).expect("decode");
        }
    }
}

async fn assert_silent(ws: &mut Client) {
    assert!(timeout(Duration::from_millis(100), ws.next()).await.is_err(), "expected no message");
}

async fn http(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(request.as_bytes()).await.expect("write");
    let mut response = String::new();
    stream.read_to_string(&mut response).await.expect("read");
    response
}

fn camera(z: f64) -> CameraState {
    CameraState { position: [0.0, 0.0, z], focal_point: [0.0; 3], up_vector: [0.0, 1.0, 0.0] }
}

fn frame(seq: u64) -> Envelope {
    Envelope::frame(seq, FrameBuffer::new(2, 1, PixelFormat::Rgba8, vec![1, 2, 3, 4, 5, 6, 7, 8]))
}

/// `sent` as a viewer receives it: same content, session sequence `seq`.
fn relayed(sent: &Envelope, seq: u64) -> Envelope {
    Envelope { seq, ..sent.clone() }
}

/// Connect a viewer and a renderer and prove both loops are running by
/// passing one render request through.
async fn paired(addr: SocketAddr, id: Uuid) -> (Client, Client) {
    let mut renderer = connect(addr, id, "render").await;
    let mut viewer = connect(addr, id, "view").await;
    send(&mut viewer, &Envelope::render_request(1)).await;
    let first = recv_envelope(&mut renderer).await;
    assert_eq!(first.payload, Payload::RenderRequest);
    (viewer, renderer)
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
async fn healthz_is_ok() {
    let (addr, _state) = spawn_relay().await;
    let response = http(addr, "GET /healthz HTTP/1.1\r\nHost: relay\r\nConnection: close\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
}

#[tokio::test]
async fn create_session_returns_201_with_id() {
    let (addr, state) = spawn_relay().await;
    let response = http(
        addr,
        "POST /api/session HTTP/1.1\r\nHost: relay\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 201"), "{response}");

    let body = response.split("\r\n\r\n").nth(1).expect("body");
    let json: serde_json::Value = serde_json::from_str(body).expect("json");
    let id: Uuid = json["id"].as_str().expect("id").parse().expect("uuid");
    assert!(session::session_exists(&state, id).await);
}

#[tokio::test]
async fn unknown_session_is_404() {
    let (addr, _state) = spawn_relay().await;
    let url = format!("ws://{addr}/api/session/{}/view", Uuid::new_v4());
    match connect_async(url).await {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 404),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("upgrade should be refused"),
    }
}

// =============================================================================
// RELAY
// =============================================================================

#[tokio::test]
async fn camera_reaches_renderer_and_frame_reaches_viewer() {
    let (addr, state) = spawn_relay().await;
    let id = session::create_session(&state).await;
    let (mut viewer, mut renderer) = paired(addr, id).await;

    send(&mut viewer, &Envelope::camera(2, camera(42.0))).await;
    send(&mut viewer, &Envelope::render_request(3)).await;

    let cam = recv_envelope(&mut renderer).await;
    assert_eq!(cam.payload, Payload::Camera(camera(42.0)));
    let req = recv_envelope(&mut renderer).await;
    assert_eq!(req.payload, Payload::RenderRequest);

    let sent = frame(1);
    send(&mut renderer, &sent).await;
    assert_eq!(recv_envelope(&mut viewer).await, relayed(&sent, 1));
}

#[tokio::test]
async fn late_renderer_gets_current_camera() {
    let (addr, state) = spawn_relay().await;
    let id = session::create_session(&state).await;
    let mut viewer = connect(addr, id, "view").await;
    send(&mut viewer, &Envelope::camera(1, camera(7.0))).await;
    send(&mut viewer, &Envelope::render_request(2)).await;

    // Wait until the viewer's messages have reached the control slot.
    let ready = timeout(Duration::from_secs(2), async {
        loop {
            let seen = state
                .sessions
                .read()
                .await
                .get(&id)
                .is_some_and(|session| session.control.borrow().render_seq == 1);
            if seen {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(ready.is_ok(), "viewer messages never arrived");

    let mut renderer = connect(addr, id, "render").await;
    assert_eq!(recv_envelope(&mut renderer).await.payload, Payload::Camera(camera(7.0)));
    assert_eq!(recv_envelope(&mut renderer).await.payload, Payload::RenderRequest);
}

#[tokio::test]
async fn stale_viewer_camera_is_not_forwarded() {
    let (addr, state) = spawn_relay().await;
    let id = session::create_session(&state).await;
    let (mut viewer, mut renderer) = paired(addr, id).await;

    send(&mut viewer, &Envelope::camera(5, camera(1.0))).await;
    assert_eq!(recv_envelope(&mut renderer).await.payload, Payload::Camera(camera(1.0)));

    send(&mut viewer, &Envelope::camera(4, camera(2.0))).await;
    send(&mut viewer, &Envelope::render_request(6)).await;
    assert_eq!(recv_envelope(&mut renderer).await.payload, Payload::RenderRequest);
    assert_silent(&mut renderer).await;
}

#[tokio::test]
async fn invalid_frames_are_dropped_without_closing() {
    let (addr, state) = spawn_relay().await;
    let id = session::create_session(&state).await;
    let (mut viewer, mut renderer) = paired(addr, id).await;

    send_raw(&mut renderer, vec![0xff, 0xff, 0xff]).await;
    let short = Envelope::frame(1, FrameBuffer::new(2, 2, PixelFormat::Rgba8, vec![0; 4]));
    send(&mut renderer, &short).await;
    send(&mut renderer, &Envelope::camera(2, camera(1.0))).await;
    send_raw(&mut renderer, vec![0; 128 * 1024]).await;

    let good = frame(9);
    send(&mut renderer, &good).await;
    assert_eq!(recv_envelope(&mut viewer).await, relayed(&good, 1));
}

#[tokio::test]
async fn frames_from_viewers_are_dropped() {
    let (addr, state) = spawn_relay().await;
    let id = session::create_session(&state).await;
    let (mut viewer, mut renderer) = paired(addr, id).await;

    send(&mut viewer, &frame(1)).await;
    assert_silent(&mut renderer).await;
    assert_silent(&mut viewer).await;
}

#[tokio::test]
async fn frames_fan_out_to_every_viewer() {
    let (addr, state) = spawn_relay().await;
    let id = session::create_session(&state).await;
    let (mut first, mut renderer) = paired(addr, id).await;
    let mut second = connect(addr, id, "view").await;
    send(&mut second, &Envelope::render_request(1)).await;
    assert_eq!(recv_envelope(&mut renderer).await.payload, Payload::RenderRequest);

    let sent = frame(3);
    send(&mut renderer, &sent).await;
    assert_eq!(recv_envelope(&mut first).await, relayed(&sent, 1));
    assert_eq!(recv_envelope(&mut second).await, relayed(&sent, 1));
}

#[tokio::test]
async fn restarted_renderer_frames_still_reach_viewer() {
    let (addr, state) = spawn_relay().await;
    let id = session::create_session(&state).await;
    let (mut viewer, mut renderer) = paired(addr, id).await;

    for seq in 100..=101 {
        send(&mut renderer, &frame(seq)).await;
    }
    assert_eq!(recv_envelope(&mut viewer).await.seq, 1);
    assert_eq!(recv_envelope(&mut viewer).await.seq, 2);
    renderer.close(None).await.expect("close renderer");

    // The restarted renderer counts from 1 again.
    let mut restarted = connect(addr, id, "render").await;
    assert_eq!(recv_envelope(&mut restarted).await.payload, Payload::RenderRequest);
    let sent = frame(1);
    send(&mut restarted, &sent).await;
    assert_eq!(recv_envelope(&mut viewer).await, relayed(&sent, 3));
}

#[tokio::test]
async fn session_is_evicted_after_last_socket_leaves() {
    let (addr, state) = spawn_relay().await;
    let id = session::create_session(&state).await;
    let (mut viewer, mut renderer) = paired(addr, id).await;

    viewer.close(None).await.expect("close viewer");
    renderer.close(None).await.expect("close renderer");

    let evicted = timeout(Duration::from_secs(2), async {
        while session::session_exists(&state, id).await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(evicted.is_ok(), "session still present");
}
