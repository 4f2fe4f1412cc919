//! The `application/x-color` drag payload: four big-endian `u16` in R, G, B, A order.

use thiserror::Error;

use crate::color::Rgba;

/// Drag target name.
pub const COLOR_MIME_TYPE: &str = "application/x-color";

/// Bits per item in the payload.
pub const COLOR_DATA_FORMAT: u8 = 16;

/// Payload size in bytes.
pub const COLOR_DATA_LEN: usize = 8;

/// Drag payload errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragDataError {
    #[error("Received invalid color data: {0} bytes")]
    InvalidLength(usize),
}

/// Encode a color. Alpha is sent as fully opaque when `with_alpha` is false.
pub fn encode_color(rgba: &Rgba, with_alpha: bool) -> [u8; COLOR_DATA_LEN] {
    let [r, g, b, a] = rgba.to_u16();
    let a = if with_alpha { a } else { u16::MAX };

    let mut out = [0u8; COLOR_DATA_LEN];
    for (chunk, value) in out.chunks_exact_mut(2).zip([r, g, b, a]) {
        chunk.copy_from_slice(&value.to_be_bytes());
    }
    out
}

/// Decode a payload. The length must be exactly 8; a format other than 16
/// is tolerated.
pub fn decode_color(data: &[u8], format: u8) -> Result<Rgba, DragDataError> {
    if data.len() != COLOR_DATA_LEN {
        log::warn!("Received invalid color data: {} bytes", data.len());
        return Err(DragDataError::InvalidLength(data.len()));
    }
    if format != COLOR_DATA_FORMAT {
        log::debug!("Accepting color data with format {}", format);
    }

    let mut channels = [0u16; 4];
    for (value, chunk) in channels.iter_mut().zip(data.chunks_exact(2)) {
        *value = u16::from_be_bytes([chunk[0], chunk[1]]);
    }
    Ok(Rgba::from_u16(channels))
}
