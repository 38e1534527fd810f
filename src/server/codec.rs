//! Request Frame Codec
//!
//! Incremental decoder for the framed JSON request stream.
//!
//! Clients normally terminate each request with a newline, but the decoder
//! works directly on the byte buffer, so back-to-back JSON objects without
//! separators decode just as well. A partial object at the tail of the
//! buffer is left in place until more bytes arrive.

use bytes::{Buf, BytesMut};

use crate::error::{CacheError, Result};
use crate::models::CacheRequest;

/// Attempts to decode one request frame from the front of the buffer.
///
/// Returns `Ok(None)` when the buffer holds no complete frame yet; the
/// consumed bytes of a decoded frame (and any leading whitespace) are
/// advanced past.
///
/// # Errors
/// [`CacheError::MalformedFrame`] when the buffer front is not valid JSON
/// or does not fit the request shape.
pub fn decode_frame(buf: &mut BytesMut) -> Result<Option<CacheRequest>> {
    // Drop leading whitespace, including the newline framing
    let skip = buf
        .iter()
        .take_while(|byte| byte.is_ascii_whitespace())
        .count();
    buf.advance(skip);

    if buf.is_empty() {
        return Ok(None);
    }

    let mut stream = serde_json::Deserializer::from_slice(&buf[..]).into_iter::<CacheRequest>();
    match stream.next() {
        Some(Ok(request)) => {
            let consumed = stream.byte_offset();
            buf.advance(consumed);
            Ok(Some(request))
        }
        Some(Err(err)) if err.is_eof() => Ok(None),
        Some(Err(err)) => Err(CacheError::MalformedFrame(err)),
        None => Ok(None),
    }
}
