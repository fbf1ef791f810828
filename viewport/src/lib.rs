//! Interactive viewport for a remotely rendered 3D scene.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It turns
//! pointer and wheel input into orbit-camera updates, publishes the camera to
//! a remote renderer at most once per throttle interval, and paints the
//! frames the renderer sends back. The host JavaScript layer only wires DOM
//! events and the WebSocket to the `wasm::Viewport` binding.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`camera`] | Orbit camera around a focal point |
//! | [`vec3`] | 3-component vectors and spherical coordinates |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`throttle`] | Fixed-interval publish throttle |
//! | [`sync`] | Outbound camera slot and inbound frame ordering |
//! | [`display`] | Display surface and pixel conversion |
//! | [`config`] | Construction-time configuration |
//! | [`consts`] | Shared numeric constants (clamps, speeds, intervals) |

pub mod camera;
pub mod config;
pub mod consts;
pub mod display;
pub mod engine;
pub mod input;
pub mod sync;
pub mod throttle;
pub mod vec3;

#[cfg(target_arch = "wasm32")]
pub mod wasm;
