//! Browser binding.
//!
//! The host page creates one [`Viewport`] per canvas, forwards DOM pointer
//! and wheel events to it, and hands it the WebSocket connected to the
//! relay. Incoming binary messages go to [`Viewport::on_message`]. When a
//! handler returns a positive delay the host should call [`Viewport::tick`]
//! after that many milliseconds so throttled camera changes still reach the
//! renderer.

use wasm_bindgen::prelude::*;
use web_sys::{BinaryType, HtmlCanvasElement, WebSocket};

use crate::config::ViewportConfig;
use crate::engine::{Action, Engine};
use crate::input::{Button, Point, WheelDelta, WheelMode};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&e.to_string()));
    }
}

#[wasm_bindgen]
pub struct Viewport {
    engine: Engine,
    socket: Option<WebSocket>,
}

#[wasm_bindgen]
impl Viewport {
    /// `config` is a JSON object; pass `"{}"` for defaults.
    ///
    /// # Errors
    ///
    /// Returns `Err` for malformed configuration or a canvas without a 2D
    /// context.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement, config: &str) -> Result<Viewport, JsValue> {
        let config = ViewportConfig::from_json(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let engine = Engine::new(canvas, &config)?;
        engine.render()?;
        let resolution = config.resolution();
        log::info!("viewport created: {}x{}", resolution.width, resolution.height);
        Ok(Self { engine, socket: None })
    }

    /// Use `socket` as the sync channel and publish the current camera.
    ///
    /// Call again with the new socket after a reconnect.
    pub fn attach_socket(&mut self, socket: WebSocket) -> f64 {
        socket.set_binary_type(BinaryType::Arraybuffer);
        self.socket = Some(socket);
        let actions = self.engine.start(now());
        self.apply(actions)
    }

    pub fn detach_socket(&mut self) {
        self.socket = None;
    }

    pub fn pointer_down(&mut self, client_x: f64, client_y: f64, button: i16) -> f64 {
        let actions = self.engine.on_pointer_down(Point::new(client_x, client_y), Button::from_dom(button), now());
        self.apply(actions)
    }

    pub fn pointer_move(&mut self, client_x: f64, client_y: f64) -> f64 {
        let actions = self.engine.on_pointer_move(Point::new(client_x, client_y), now());
        self.apply(actions)
    }

    pub fn pointer_up(&mut self, client_x: f64, client_y: f64, button: i16) -> f64 {
        let actions = self.engine.on_pointer_up(Point::new(client_x, client_y), Button::from_dom(button), now());
        self.apply(actions)
    }

    pub fn wheel(&mut self, delta_y: f64, delta_mode: u32) -> f64 {
        let actions = self.engine.on_wheel(WheelDelta::new(delta_y, WheelMode::from_dom(delta_mode)), now());
        self.apply(actions)
    }

    pub fn tick(&mut self) -> f64 {
        let actions = self.engine.on_tick(now());
        self.apply(actions)
    }

    /// Layout changed (resize, scroll); re-read the canvas rectangle.
    pub fn refresh_bounds(&mut self) {
        self.engine.refresh_bounds();
    }

    pub fn on_message(&mut self, bytes: &[u8]) -> f64 {
        let actions = self.engine.on_message(bytes);
        self.apply(actions)
    }

    /// Current camera state as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `Err` if serialization fails.
    pub fn camera_state(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.camera_state()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Viewport {
    /// Carry out engine actions. Returns the delay in milliseconds before
    /// [`Viewport::tick`] should run, or `-1` when nothing is pending.
    fn apply(&mut self, actions: Vec<Action>) -> f64 {
        for action in actions {
            match action {
                Action::Publish(envelopes) => self.send(&envelopes),
                Action::RenderNeeded => {
                    if let Err(e) = self.engine.render() {
                        log::error!("canvas paint failed: {e:?}");
                    }
                }
                Action::FrameRejected(reason) => log::warn!("frame rejected: {reason}"),
            }
        }
        self.engine.next_flush_in(now()).unwrap_or(-1.0)
    }

    fn send(&self, envelopes: &[frames::Envelope]) {
        let Some(socket) = &self.socket else {
            log::debug!("no socket attached; dropping {} envelopes", envelopes.len());
            return;
        };
        if socket.ready_state() != WebSocket::OPEN {
            log::debug!("socket not open; dropping {} envelopes", envelopes.len());
            return;
        }
        for envelope in envelopes {
            if let Err(e) = socket.send_with_u8_array(&frames::encode_envelope(envelope)) {
                log::warn!("send failed (seq {}): {e:?}", envelope.seq);
                return;
            }
        }
    }
}

fn now() -> f64 {
    js_sys::Date::now()
}
