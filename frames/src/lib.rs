//! Shared wire model and protobuf codec for the viewport sync channel.
//!
//! This crate owns the binary representation exchanged between the browser
//! viewport, the relay, and the remote renderer. Two directions share one
//! envelope type:
//!
//! - local → remote: [`Payload::Camera`] and [`Payload::RenderRequest`]
//! - remote → local: [`Payload::Frame`]
//!
//! Every envelope carries a producer-assigned `seq` so receivers can keep
//! "latest value wins" for camera state and production order for frames.

use prost::Message;
use serde::{Deserialize, Serialize};

// =============================================================================
// ERRORS
// =============================================================================

/// Error returned by [`decode_envelope`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf `WireEnvelope`.
    #[error("failed to decode protobuf envelope: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The envelope decoded but carried no payload.
    #[error("envelope has no payload")]
    MissingPayload,
    /// A camera vector did not have exactly three components.
    #[error("camera field {field} has {len} components, expected 3")]
    InvalidVector { field: &'static str, len: usize },
    /// The pixel format integer does not map to a known [`PixelFormat`].
    #[error("invalid pixel format: {0}")]
    InvalidFormat(i32),
}

/// Error returned by [`FrameBuffer::check`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Width or height is zero.
    #[error("frame has empty resolution {width}x{height}")]
    EmptyResolution { width: u32, height: u32 },
    /// Byte count is not a whole number of pixels.
    #[error("frame payload of {len} bytes is not a multiple of {bpp}")]
    Misaligned { len: usize, bpp: usize },
    /// Byte count disagrees with the declared resolution.
    #[error("frame payload is {actual} bytes, {width}x{height} needs {expected}")]
    LengthMismatch { width: u32, height: u32, expected: usize, actual: usize },
}

// =============================================================================
// CAMERA STATE
// =============================================================================

/// Camera pose published to the remote renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraState {
    pub position: [f64; 3],
    pub focal_point: [f64; 3],
    pub up_vector: [f64; 3],
}

// =============================================================================
// FRAME BUFFER
// =============================================================================

/// Byte layout of a frame payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// Four bytes per pixel; the fourth byte is ignored by the viewport.
    #[default]
    Rgba8,
    /// Three bytes per pixel, tightly packed.
    Rgb8,
}

impl PixelFormat {
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
            Self::Rgb8 => 3,
        }
    }

    fn as_i32(self) -> i32 {
        match self {
            Self::Rgba8 => WirePixelFormat::Rgba8 as i32,
            Self::Rgb8 => WirePixelFormat::Rgb8 as i32,
        }
    }

    fn from_i32(value: i32) -> Result<Self, CodecError> {
        match WirePixelFormat::try_from(value) {
            Ok(WirePixelFormat::Rgba8) => Ok(Self::Rgba8),
            Ok(WirePixelFormat::Rgb8) => Ok(Self::Rgb8),
            Err(_) => Err(CodecError::InvalidFormat(value)),
        }
    }
}

/// One rendered image as produced by the remote renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl FrameBuffer {
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        Self { width, height, format, pixels }
    }

    /// Byte count implied by the resolution and format, `None` on overflow.
    #[must_use]
    pub fn expected_len(&self) -> Option<usize> {
        let w = usize::try_from(self.width).ok()?;
        let h = usize::try_from(self.height).ok()?;
        w.checked_mul(h)?.checked_mul(self.format.bytes_per_pixel())
    }

    /// Validate the payload length against the declared resolution.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] describing the first inconsistency found.
    pub fn check(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::EmptyResolution { width: self.width, height: self.height });
        }
        let bpp = self.format.bytes_per_pixel();
        let len = self.pixels.len();
        if len % bpp != 0 {
            return Err(FrameError::Misaligned { len, bpp });
        }
        let expected = self.expected_len().unwrap_or(usize::MAX);
        if expected != len {
            return Err(FrameError::LengthMismatch { width: self.width, height: self.height, expected, actual: len });
        }
        Ok(())
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// What an envelope carries.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Camera(CameraState),
    RenderRequest,
    Frame(FrameBuffer),
}

/// A single message on the sync channel.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    /// Producer-assigned sequence number, strictly increasing per producer.
    pub seq: u64,
    /// Milliseconds since the Unix epoch when the envelope was created.
    pub ts: i64,
    pub payload: Payload,
}

/// Wall-clock milliseconds since the Unix epoch. `std::time` is not
/// available in the browser, so wasm builds ask JS.
#[cfg(target_arch = "wasm32")]
#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Envelope {
    #[must_use]
    pub fn camera(seq: u64, state: CameraState) -> Self {
        Self { seq, ts: now_ms(), payload: Payload::Camera(state) }
    }

    #[must_use]
    pub fn render_request(seq: u64) -> Self {
        Self { seq, ts: now_ms(), payload: Payload::RenderRequest }
    }

    #[must_use]
    pub fn frame(seq: u64, frame: FrameBuffer) -> Self {
        Self { seq, ts: now_ms(), payload: Payload::Frame(frame) }
    }

    /// Short label for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.payload {
            Payload::Camera(_) => "camera",
            Payload::RenderRequest => "render_request",
            Payload::Frame(_) => "frame",
        }
    }
}

/// Encode an envelope into protobuf bytes.
#[must_use]
pub fn encode_envelope(envelope: &Envelope) -> Vec<u8> {
    let wire = envelope_to_wire(envelope);

    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec cannot hit `BufferTooSmall`.
    wire.encode(&mut out).unwrap_or_default();
    out
}

/// Decode protobuf bytes into an envelope.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and the other variants
/// for structurally valid protobuf that does not describe a valid envelope.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, CodecError> {
    let wire = WireEnvelope::decode(bytes)?;
    wire_to_envelope(wire)
}

fn envelope_to_wire(envelope: &Envelope) -> WireEnvelope {
    let body = match &envelope.payload {
        Payload::Camera(state) => WireBody::Camera(WireCamera {
            position: state.position.to_vec(),
            focal_point: state.focal_point.to_vec(),
            up_vector: state.up_vector.to_vec(),
        }),
        Payload::RenderRequest => WireBody::RenderRequest(WireRenderRequest {}),
        Payload::Frame(frame) => WireBody::Frame(WireFrame {
            width: frame.width,
            height: frame.height,
            format: frame.format.as_i32(),
            pixels: frame.pixels.clone(),
        }),
    };

    WireEnvelope { seq: envelope.seq, ts: envelope.ts, body: Some(body) }
}

fn wire_to_envelope(wire: WireEnvelope) -> Result<Envelope, CodecError> {
    let payload = match wire.body.ok_or(CodecError::MissingPayload)? {
        WireBody::Camera(camera) => Payload::Camera(CameraState {
            position: vec3_from_wire("position", &camera.position)?,
            focal_point: vec3_from_wire("focal_point", &camera.focal_point)?,
            up_vector: vec3_from_wire("up_vector", &camera.up_vector)?,
        }),
        WireBody::RenderRequest(_) => Payload::RenderRequest,
        WireBody::Frame(frame) => Payload::Frame(FrameBuffer {
            width: frame.width,
            height: frame.height,
            format: PixelFormat::from_i32(frame.format)?,
            pixels: frame.pixels,
        }),
    };

    Ok(Envelope { seq: wire.seq, ts: wire.ts, payload })
}

fn vec3_from_wire(field: &'static str, values: &[f64]) -> Result<[f64; 3], CodecError> {
    match values {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(CodecError::InvalidVector { field, len: values.len() }),
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireEnvelope {
    #[prost(uint64, tag = "1")]
    seq: u64,
    #[prost(int64, tag = "2")]
    ts: i64,
    #[prost(oneof = "WireBody", tags = "3, 4, 5")]
    body: Option<WireBody>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
enum WireBody {
    #[prost(message, tag = "3")]
    Camera(WireCamera),
    #[prost(message, tag = "4")]
    RenderRequest(WireRenderRequest),
    #[prost(message, tag = "5")]
    Frame(WireFrame),
}

#[derive(Clone, PartialEq, Message)]
struct WireCamera {
    #[prost(double, repeated, tag = "1")]
    position: Vec<f64>,
    #[prost(double, repeated, tag = "2")]
    focal_point: Vec<f64>,
    #[prost(double, repeated, tag = "3")]
    up_vector: Vec<f64>,
}

#[derive(Clone, PartialEq, Message)]
struct WireRenderRequest {}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(uint32, tag = "1")]
    width: u32,
    #[prost(uint32, tag = "2")]
    height: u32,
    #[prost(enumeration = "WirePixelFormat", tag = "3")]
    format: i32,
    #[prost(bytes = "vec", tag = "4")]
    pixels: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WirePixelFormat {
    Rgba8 = 0,
    Rgb8 = 1,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
