//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the relay configuration and a map of live sessions. Each session
//! pairs any number of viewers with the renderer through two channels:
//!
//! - a `watch` control slot carrying the latest camera and a render counter
//!   (latest value wins; intermediate values may be coalesced), and
//! - a `broadcast` channel of encoded frames (production order), each
//!   re-stamped from the session's own frame counter.
//!
//! A session nobody ever attaches to expires after
//! [`RelayConfig::unclaimed_ttl`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use axum::body::Bytes;
use frames::Envelope;
use tokio::sync::{RwLock, broadcast, watch};
use uuid::Uuid;

use crate::config::RelayConfig;

// =============================================================================
// CONTROL
// =============================================================================

/// Viewer → renderer state. Only the newest value matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Control {
    /// Most recent camera envelope from any viewer.
    pub camera: Option<Envelope>,
    /// Number of render requests received so far.
    pub render_seq: u64,
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// Per-session live state. Evicted when its last socket leaves.
pub struct SessionState {
    pub control: Arc<watch::Sender<Control>>,
    pub frames: broadcast::Sender<Bytes>,
    /// Last sequence stamped on a relayed frame. Survives renderer restarts.
    pub frame_seq: Arc<AtomicU64>,
    /// Connected sockets of either role.
    pub sockets: usize,
    /// Set on first attach. Unclaimed sessions expire.
    pub claimed: bool,
}

impl SessionState {
    #[must_use]
    pub fn new(frame_backlog: usize) -> Self {
        let (control, _) = watch::channel(Control::default());
        let (frames, _) = broadcast::channel(frame_backlog.max(1));
        Self { control: Arc::new(control), frames, frame_seq: Arc::new(AtomicU64::new(0)), sockets: 0, claimed: false }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub sessions: Arc<RwLock<HashMap<Uuid, SessionState>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self { config, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }
}
