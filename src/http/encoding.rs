//! Content-encoding negotiation module
//!
//! Scans the client's `accept-encoding` header in the order the client
//! listed its tokens and honors the first recognized coding. No
//! quality-value (`q=`) weighting.

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{self, Write};

/// A negotiated response compression scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Gzip,
    /// zlib-wrapped deflate, as produced by `zlib.createDeflate`
    Deflate,
}

impl ContentCoding {
    /// `Content-Encoding` header value
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }
}

/// Pick a coding from the client-advertised `accept-encoding` header
///
/// Tokens are split on `", "` and scanned in client order; the first of
/// `gzip`/`deflate` wins. No match or absent header means identity.
pub fn negotiate(accept_encoding: Option<&str>) -> Option<ContentCoding> {
    let header = accept_encoding?;
    for token in header.split(", ") {
        match token {
            "gzip" => return Some(ContentCoding::Gzip),
            "deflate" => return Some(ContentCoding::Deflate),
            _ => {}
        }
    }
    None
}

/// Compress a full buffer in one shot
pub fn compress(coding: ContentCoding, data: &[u8]) -> io::Result<Vec<u8>> {
    match coding {
        ContentCoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
        ContentCoding::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()
        }
    }
}

/// Incremental encoder for streamed file bodies
///
/// Each `write` returns whatever compressed output the underlying encoder
/// has produced so far, so chunks can be forwarded as they become ready.
pub enum ChunkEncoder {
    Gzip(GzEncoder<Vec<u8>>),
    Deflate(ZlibEncoder<Vec<u8>>),
}

impl ChunkEncoder {
    pub fn new(coding: ContentCoding) -> Self {
        match coding {
            ContentCoding::Gzip => Self::Gzip(GzEncoder::new(Vec::new(), Compression::default())),
            ContentCoding::Deflate => {
                Self::Deflate(ZlibEncoder::new(Vec::new(), Compression::default()))
            }
        }
    }

    /// Feed a chunk of input, taking any compressed output produced so far
    pub fn write(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip(encoder) => {
                encoder.write_all(data)?;
                Ok(std::mem::take(encoder.get_mut()))
            }
            Self::Deflate(encoder) => {
                encoder.write_all(data)?;
                Ok(std::mem::take(encoder.get_mut()))
            }
        }
    }

    /// Flush the encoder and return the trailing compressed bytes
    pub fn finish(self) -> io::Result<Vec<u8>> {
        match self {
            Self::Gzip(encoder) => encoder.finish(),
            Self::Deflate(encoder) => encoder.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::{GzDecoder, ZlibDecoder};
    use std::io::Read;

    #[test]
    fn test_first_listed_coding_wins() {
        assert_eq!(
            negotiate(Some("deflate, gzip")),
            Some(ContentCoding::Deflate)
        );
        assert_eq!(negotiate(Some("gzip, deflate")), Some(ContentCoding::Gzip));
    }

    #[test]
    fn test_unrecognized_tokens_are_skipped() {
        assert_eq!(negotiate(Some("br, gzip")), Some(ContentCoding::Gzip));
        assert_eq!(negotiate(Some("br")), None);
        assert_eq!(negotiate(None), None);
    }

    #[test]
    fn test_gzip_round_trip() {
        let compressed = compress(ContentCoding::Gzip, b"hello hello hello").unwrap();
        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"hello hello hello");
    }

    #[test]
    fn test_deflate_round_trip() {
        let compressed = compress(ContentCoding::Deflate, b"abcabcabc").unwrap();
        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abcabcabc");
    }

    #[test]
    fn test_chunk_encoder_matches_one_shot() {
        let mut encoder = ChunkEncoder::new(ContentCoding::Gzip);
        let mut compressed = encoder.write(b"first chunk ").unwrap();
        compressed.extend(encoder.write(b"second chunk").unwrap());
        compressed.extend(encoder.finish().unwrap());

        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"first chunk second chunk");
    }
}
