use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use frames::{CameraState, Envelope, FrameBuffer};

use crate::camera::CameraController;
use crate::config::ViewportConfig;
use crate::display::{DisplaySurface, Resolution};
use crate::input::{Button, Gesture, InputState, Point, Rect, WheelDelta};
use crate::sync::{Inbox, Outbox};
use crate::throttle::Throttle;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send these envelopes to the remote renderer, in order.
    Publish(Vec<Envelope>),
    /// The displayed image changed; repaint the canvas.
    RenderNeeded,
    /// A received frame was discarded. The previous image stays on screen.
    FrameRejected(String),
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
/// Timestamps are milliseconds from any monotonic-enough host clock.
pub struct EngineCore {
    pub camera: CameraController,
    pub input: InputState,
    pub display: DisplaySurface,
    pub bounds: Rect,
    orbit_sensitivity: f64,
    throttle: Throttle,
    outbox: Outbox,
    inbox: Inbox,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(&ViewportConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new(config: &ViewportConfig) -> Self {
        let resolution = config.resolution();
        Self {
            camera: CameraController::new(&config.camera, config.tuning()),
            input: InputState::default(),
            display: DisplaySurface::new(resolution),
            bounds: Rect::new(0.0, 0.0, f64::from(resolution.width), f64::from(resolution.height)),
            orbit_sensitivity: config.orbit_sensitivity,
            throttle: Throttle::new(config.publish_interval_ms),
            outbox: Outbox::new(),
            inbox: Inbox::new(),
        }
    }

    // --- Session ---

    /// Publish the current camera state so the remote renders a first frame.
    ///
    /// Also used after a reconnect. Subject to the throttle like any other
    /// publication; a refused publish stays pending for [`Self::on_tick`].
    pub fn start(&mut self, now_ms: f64) -> Vec<Action> {
        self.outbox.post(self.camera.state());
        self.flush(now_ms)
    }

    /// Update the surface's bounding rectangle in client coordinates.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    // --- Pointer / wheel ---

    pub fn on_pointer_down(&mut self, client: Point, button: Button, _now_ms: f64) -> Vec<Action> {
        let Some(ndc) = self.bounds.to_ndc(client) else {
            return Vec::new();
        };
        self.input.advance(ndc);
        self.input.gesture = Gesture::for_button(button);
        Vec::new()
    }

    pub fn on_pointer_move(&mut self, client: Point, now_ms: f64) -> Vec<Action> {
        let Some(ndc) = self.bounds.to_ndc(client) else {
            return Vec::new();
        };
        let delta = self.input.advance(ndc);
        if delta.x == 0.0 && delta.y == 0.0 {
            return Vec::new();
        }

        match self.input.gesture {
            Some(Gesture::Orbit) => {
                let sens = self.orbit_sensitivity;
                self.camera.orbit(delta.x * sens, delta.y * sens);
            }
            Some(Gesture::Pan) => self.camera.pan(delta.x, delta.y),
            None => return Vec::new(),
        }
        self.camera_changed(now_ms)
    }

    /// Ends the drag started by `button`. Releasing a different button
    /// leaves the active gesture alone.
    pub fn on_pointer_up(&mut self, _client: Point, button: Button, now_ms: f64) -> Vec<Action> {
        if self.input.gesture.is_some() && self.input.gesture == Gesture::for_button(button) {
            self.input.gesture = None;
        }
        self.flush(now_ms)
    }

    pub fn on_wheel(&mut self, delta: WheelDelta, now_ms: f64) -> Vec<Action> {
        let detents = delta.detents();
        if detents == 0.0 {
            return Vec::new();
        }
        // Scrolling down (positive) zooms out.
        self.camera.dolly(-detents);
        self.camera_changed(now_ms)
    }

    /// Trailing-edge flush: publishes a change the throttle held back.
    pub fn on_tick(&mut self, now_ms: f64) -> Vec<Action> {
        self.flush(now_ms)
    }

    // --- Frames ---

    /// Apply a raw envelope received from the sync channel.
    pub fn on_message(&mut self, bytes: &[u8]) -> Vec<Action> {
        match self.inbox.accept_bytes(bytes) {
            Ok(Some(frame)) => self.on_frame(&frame),
            Ok(None) => Vec::new(),
            Err(e) => vec![Action::FrameRejected(e.to_string())],
        }
    }

    /// Present a decoded frame.
    pub fn on_frame(&mut self, frame: &FrameBuffer) -> Vec<Action> {
        match self.display.present(frame) {
            Ok(()) => vec![Action::RenderNeeded],
            Err(e) => vec![Action::FrameRejected(e.to_string())],
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn camera_state(&self) -> CameraState {
        self.camera.state()
    }

    #[must_use]
    pub fn image(&self) -> &[u8] {
        self.display.image()
    }

    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.display.resolution()
    }

    /// Whether a camera change is waiting for the throttle.
    #[must_use]
    pub fn pending_publish(&self) -> bool {
        self.outbox.is_pending()
    }

    /// Milliseconds until a pending change can be flushed, if one is pending.
    #[must_use]
    pub fn next_flush_in(&self, now_ms: f64) -> Option<f64> {
        self.outbox.is_pending().then(|| self.throttle.remaining(now_ms))
    }

    // --- Internals ---

    fn camera_changed(&mut self, now_ms: f64) -> Vec<Action> {
        self.outbox.post(self.camera.state());
        self.flush(now_ms)
    }

    fn flush(&mut self, now_ms: f64) -> Vec<Action> {
        if !self.outbox.is_pending() || !self.throttle.try_acquire(now_ms) {
            return Vec::new();
        }
        vec![Action::Publish(self.outbox.take())]
    }
}

/// The full viewport engine. Wraps `EngineCore` and owns the browser canvas.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    pub core: EngineCore,
}

impl Engine {
    /// Create an engine bound to `canvas`, sizing its backing store to the
    /// configured resolution.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the canvas has no 2D context.
    pub fn new(canvas: HtmlCanvasElement, config: &ViewportConfig) -> Result<Self, JsValue> {
        let core = EngineCore::new(config);
        let resolution = core.resolution();
        canvas.set_width(resolution.width);
        canvas.set_height(resolution.height);

        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;

        let mut engine = Self { canvas, ctx, core };
        engine.refresh_bounds();
        Ok(engine)
    }

    /// Re-read the canvas bounding rectangle from the layout.
    pub fn refresh_bounds(&mut self) {
        let r = self.canvas.get_bounding_client_rect();
        self.core.set_bounds(Rect::new(r.left(), r.top(), r.width(), r.height()));
    }

    // --- Delegated handlers ---

    pub fn start(&mut self, now_ms: f64) -> Vec<Action> {
        self.core.start(now_ms)
    }

    pub fn on_pointer_down(&mut self, client: Point, button: Button, now_ms: f64) -> Vec<Action> {
        self.refresh_bounds();
        self.core.on_pointer_down(client, button, now_ms)
    }

    pub fn on_pointer_move(&mut self, client: Point, now_ms: f64) -> Vec<Action> {
        self.core.on_pointer_move(client, now_ms)
    }

    pub fn on_pointer_up(&mut self, client: Point, button: Button, now_ms: f64) -> Vec<Action> {
        self.core.on_pointer_up(client, button, now_ms)
    }

    pub fn on_wheel(&mut self, delta: WheelDelta, now_ms: f64) -> Vec<Action> {
        self.core.on_wheel(delta, now_ms)
    }

    pub fn on_tick(&mut self, now_ms: f64) -> Vec<Action> {
        self.core.on_tick(now_ms)
    }

    pub fn on_message(&mut self, bytes: &[u8]) -> Vec<Action> {
        self.core.on_message(bytes)
    }

    // --- Render ---

    /// Paint the current image onto the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the browser rejects the image data.
    pub fn render(&self) -> Result<(), JsValue> {
        let res = self.core.resolution();
        let image = ImageData::new_with_u8_clamped_array_and_sh(Clamped(self.core.image()), res.width, res.height)?;
        self.ctx.put_image_data(&image, 0.0, 0.0)
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn camera_state(&self) -> CameraState {
        self.core.camera_state()
    }

    #[must_use]
    pub fn next_flush_in(&self, now_ms: f64) -> Option<f64> {
        self.core.next_flush_in(now_ms)
    }
}
