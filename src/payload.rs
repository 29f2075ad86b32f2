//! Result payload encoding with size-based compression.
//!
//! Small payloads travel as their serialized text; anything at or above the
//! threshold is gzipped and base64-encoded inside a wrapper the caller can
//! detect and reverse.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{GatewayError, Result};

/// Serialized payloads at or above this many bytes are compressed (100 KiB).
pub const COMPRESSION_THRESHOLD: usize = 100 * 1024;

/// Wrapper around a compressed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedPayload {
  /// Always true; distinguishes the wrapper from plain output
  pub compressed: bool,
  /// Gzipped payload, base64-encoded
  pub data: String,
  /// Byte length of the serialized payload before compression
  pub original_size: usize,
  /// Byte length of the gzip stream, before base64 expansion
  pub compressed_size: usize,
}

/// A payload ready for transmission.
#[derive(Debug, Clone)]
pub enum EncodedPayload {
  /// Serialized text, returned verbatim
  Plain(String),
  /// Compressed wrapper
  Compressed(CompressedPayload),
}

impl EncodedPayload {
  pub fn is_compressed(&self) -> bool {
    matches!(self, EncodedPayload::Compressed(_))
  }

  /// Final text representation handed to the caller.
  pub fn into_text(self) -> Result<String> {
    match self {
      EncodedPayload::Plain(text) => Ok(text),
      EncodedPayload::Compressed(wrapper) => serde_json::to_string(&wrapper)
        .map_err(|e| GatewayError::Request(format!("failed to serialize payload wrapper: {}", e))),
    }
  }
}

/// Serialize a value, compressing once the text reaches the threshold.
pub fn encode<T: Serialize>(value: &T) -> Result<EncodedPayload> {
  let text = serde_json::to_string_pretty(value)
    .map_err(|e| GatewayError::Request(format!("failed to serialize payload: {}", e)))?;

  if text.len() < COMPRESSION_THRESHOLD {
    return Ok(EncodedPayload::Plain(text));
  }

  let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
  encoder
    .write_all(text.as_bytes())
    .map_err(|e| GatewayError::Request(format!("compression failed: {}", e)))?;
  let compressed = encoder
    .finish()
    .map_err(|e| GatewayError::Request(format!("compression failed: {}", e)))?;

  Ok(EncodedPayload::Compressed(CompressedPayload {
    compressed: true,
    original_size: text.len(),
    compressed_size: compressed.len(),
    data: BASE64.encode(&compressed),
  }))
}

/// Reverse a compressed wrapper back to the original serialized text.
pub fn decode(wrapper: &CompressedPayload) -> Result<String> {
  let bytes = BASE64
    .decode(&wrapper.data)
    .map_err(|e| GatewayError::Request(format!("payload is not valid base64: {}", e)))?;

  let mut decoder = GzDecoder::new(bytes.as_slice());
  let mut text = String::new();
  decoder
    .read_to_string(&mut text)
    .map_err(|e| GatewayError::Request(format!("payload failed to decompress: {}", e)))?;

  Ok(text)
}

#[cfg(test)]
mod tests {
  use super::*;

  /// A value whose pretty-serialized form is exactly `len` bytes: a JSON
  /// string is its content plus two quotes.
  fn value_of_serialized_len(len: usize) -> String {
    "a".repeat(len - 2)
  }

  #[test]
  fn below_threshold_stays_plain() {
    let value = value_of_serialized_len(COMPRESSION_THRESHOLD - 1);

    let encoded = encode(&value).expect("encode should succeed");

    match encoded {
      EncodedPayload::Plain(text) => assert_eq!(text.len(), COMPRESSION_THRESHOLD - 1),
      EncodedPayload::Compressed(_) => panic!("payload below threshold must not be compressed"),
    }
  }

  #[test]
  fn above_threshold_is_wrapped() {
    let value = value_of_serialized_len(COMPRESSION_THRESHOLD + 1);

    let encoded = encode(&value).expect("encode should succeed");

    match encoded {
      EncodedPayload::Compressed(wrapper) => {
        assert!(wrapper.compressed);
        assert_eq!(wrapper.original_size, COMPRESSION_THRESHOLD + 1);
        assert!(wrapper.compressed_size < wrapper.original_size);
        assert!(!wrapper.data.is_empty());
      }
      EncodedPayload::Plain(_) => panic!("payload above threshold must be compressed"),
    }
  }

  #[test]
  fn exactly_at_threshold_is_wrapped() {
    let value = value_of_serialized_len(COMPRESSION_THRESHOLD);
    let encoded = encode(&value).expect("encode should succeed");
    assert!(encoded.is_compressed());
  }

  #[test]
  fn decode_restores_the_serialized_text() {
    let value = value_of_serialized_len(COMPRESSION_THRESHOLD + 64);
    let original_text = serde_json::to_string_pretty(&value).expect("serialize");

    let encoded = encode(&value).expect("encode should succeed");
    let wrapper = match encoded {
      EncodedPayload::Compressed(wrapper) => wrapper,
      EncodedPayload::Plain(_) => panic!("expected compressed payload"),
    };

    let restored = decode(&wrapper).expect("decode should succeed");
    assert_eq!(restored, original_text);
  }

  #[test]
  fn wrapper_serializes_with_camel_case_metadata() {
    let value = value_of_serialized_len(COMPRESSION_THRESHOLD + 1);
    let text = encode(&value)
      .expect("encode should succeed")
      .into_text()
      .expect("wrapper should serialize");

    assert!(text.contains("\"compressed\":true"));
    assert!(text.contains("\"originalSize\""));
    assert!(text.contains("\"compressedSize\""));
  }
}
