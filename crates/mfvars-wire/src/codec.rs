use bytes::{BufMut, Bytes, BytesMut};

use crate::channel::{DATA_STRING_SIZE, FLOAT_SIZE, MAX_STRING_LEN};
use crate::command::Command;
use crate::error::{Result, WireError};

/// Decimal digits kept when decoding variable values.
pub const VALUE_PRECISION: i32 = 5;

/// Encode a command into a fixed-size, zero-padded ASCII buffer.
pub fn encode_command(command: &Command<'_>) -> Result<Bytes> {
    encode_string(&command.to_string())
}

/// Encode text into a [`DATA_STRING_SIZE`] buffer.
///
/// Wire format:
/// ```text
/// ┌──────────────────────────┬──────────────────────────────┐
/// │ ASCII text (len bytes)   │ 0x00 padding (256 - len)     │
/// └──────────────────────────┴──────────────────────────────┘
/// ```
///
/// At least one zero byte always follows the text, so at most
/// [`MAX_STRING_LEN`] bytes fit. Longer text is rejected, never truncated.
pub fn encode_string(text: &str) -> Result<Bytes> {
    if !text.is_ascii() {
        return Err(WireError::NonAscii);
    }
    if text.len() > MAX_STRING_LEN {
        return Err(WireError::CommandTooLong {
            len: text.len(),
            max: MAX_STRING_LEN,
        });
    }
    let mut dst = BytesMut::with_capacity(DATA_STRING_SIZE);
    dst.put_slice(text.as_bytes());
    dst.put_bytes(0, DATA_STRING_SIZE - text.len());
    Ok(dst.freeze())
}

/// Decode a zero-terminated ASCII string.
///
/// Only bytes before the first zero are decoded. A buffer without any zero
/// byte breaks the contract and is reported as [`WireError::Unterminated`].
pub fn decode_string(payload: &[u8]) -> Result<String> {
    let end = payload
        .iter()
        .position(|&b| b == 0)
        .ok_or(WireError::Unterminated { len: payload.len() })?;
    let text = &payload[..end];
    if !text.is_ascii() {
        return Err(WireError::NonAscii);
    }
    Ok(text.iter().map(|&b| char::from(b)).collect())
}

/// Encode a value as a little-endian single precision payload.
pub fn encode_float(value: f32) -> [u8; FLOAT_SIZE] {
    value.to_le_bytes()
}

/// Decode a 4-byte little-endian payload and round it to [`VALUE_PRECISION`].
pub fn decode_float(payload: &[u8]) -> Result<f32> {
    let raw: [u8; FLOAT_SIZE] = payload.try_into().map_err(|_| WireError::PayloadSize {
        expected: FLOAT_SIZE,
        actual: payload.len(),
    })?;
    Ok(round_value(f32::from_le_bytes(raw)))
}

/// Round to [`VALUE_PRECISION`] decimal digits to absorb float noise.
pub fn round_value(value: f32) -> f32 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(VALUE_PRECISION);
    ((f64::from(value) * scale).round() / scale) as f32
}
