//! Transparent gzip decoding of response bodies.

use std::io::{self, Cursor, Read};

use flate2::read::GzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Peek at the first two bytes of `body` and decode it when they carry the
/// gzip magic number.
///
/// Peeked bytes are replayed in front of the remaining stream either way.
///
/// # Errors
///
/// Returns the underlying error when the peek fails.
pub fn decode_if_gzip<'a>(
    mut body: Box<dyn Read + Send + 'a>,
) -> io::Result<Box<dyn Read + Send + 'a>> {
    let mut header = [0_u8; 2];
    let mut filled = 0;
    while let Some(rest) = header.get_mut(filled..).filter(|rest| !rest.is_empty()) {
        match body.read(rest) {
            Ok(0) => break,
            Ok(count) => filled += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    let peeked = header.get(..filled).unwrap_or_default().to_vec();
    let is_gzip = peeked == GZIP_MAGIC;
    let restored = Cursor::new(peeked).chain(body);
    if is_gzip {
        log::debug!("response body is gzip-compressed; decoding");
        Ok(Box::new(GzDecoder::new(restored)))
    } else {
        Ok(Box::new(restored))
    }
}
