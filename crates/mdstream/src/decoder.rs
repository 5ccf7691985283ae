//! Incremental UTF-8 decoding for chunked response bodies.
//!
//! Transport chunks do not respect character boundaries, so a multi-byte
//! character may arrive split over two or more chunks. The decoder holds the
//! incomplete tail back until the rest of the sequence shows up.

use std::char::REPLACEMENT_CHARACTER;

use crate::errors::{StreamError, StreamResult};

#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
    consumed: usize,
    strict: bool,
}

impl Utf8Decoder {
    /// A decoder that substitutes U+FFFD for malformed input, the way a
    /// browser `TextDecoder` does by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder that fails on malformed input instead of substituting.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Decode the next chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> StreamResult<String> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    self.consumed += rest.len();
                    break;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));

                    match e.error_len() {
                        // Truncated sequence at the end, wait for more bytes
                        None => {
                            self.consumed += valid_up_to;
                            self.pending = rest[valid_up_to..].to_vec();
                            break;
                        }
                        Some(invalid_len) => {
                            if self.strict {
                                return Err(StreamError::Decode {
                                    offset: self.consumed + valid_up_to,
                                });
                            }
                            text.push(REPLACEMENT_CHARACTER);
                            self.consumed += valid_up_to + invalid_len;
                            rest = &rest[valid_up_to + invalid_len..];
                        }
                    }
                }
            }
        }

        Ok(text)
    }

    /// Flush at end of stream. A sequence still incomplete at this point
    /// can never be completed.
    pub fn finish(&mut self) -> StreamResult<String> {
        if self.pending.is_empty() {
            return Ok(String::new());
        }

        if self.strict {
            return Err(StreamError::Decode {
                offset: self.consumed,
            });
        }

        self.consumed += self.pending.len();
        self.pending.clear();
        Ok(REPLACEMENT_CHARACTER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() -> StreamResult<()> {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"Hello")?, "Hello");
        assert_eq!(decoder.decode(b" world")?, " world");
        assert_eq!(decoder.finish()?, "");
        Ok(())
    }

    #[test]
    fn test_two_byte_char_split_across_chunks() -> StreamResult<()> {
        // "café" with the é (C3 A9) split
        let mut decoder = Utf8Decoder::new();
        let first = decoder.decode(&[b'c', b'a', b'f', 0xC3])?;
        let second = decoder.decode(&[0xA9])?;

        assert_eq!(first, "caf");
        assert_eq!(second, "é");
        assert!(!format!("{first}{second}").contains(REPLACEMENT_CHARACTER));
        Ok(())
    }

    #[test]
    fn test_four_byte_char_split_over_three_chunks() -> StreamResult<()> {
        let crab = "🦀".as_bytes();
        assert_eq!(crab.len(), 4);

        let mut decoder = Utf8Decoder::new();
        let mut out = String::new();
        out.push_str(&decoder.decode(&crab[..1])?);
        out.push_str(&decoder.decode(&crab[1..3])?);
        assert_eq!(out, "");
        out.push_str(&decoder.decode(&crab[3..])?);
        out.push_str(&decoder.finish()?);

        assert_eq!(out, "🦀");
        Ok(())
    }

    #[test]
    fn test_lossy_replaces_invalid_bytes() -> StreamResult<()> {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'a', 0xFF, b'b'])?, "a\u{FFFD}b");
        Ok(())
    }

    #[test]
    fn test_strict_reports_offset() {
        let mut decoder = Utf8Decoder::strict();
        assert_eq!(decoder.decode(b"abc").unwrap(), "abc");

        let err = decoder.decode(&[b'd', 0xFF]).unwrap_err();
        assert!(matches!(err, StreamError::Decode { offset: 4 }));
    }

    #[test]
    fn test_finish_flushes_dangling_sequence() {
        let mut lossy = Utf8Decoder::new();
        assert_eq!(lossy.decode(&[b'x', 0xE2, 0x82]).unwrap(), "x");
        assert_eq!(lossy.finish().unwrap(), "\u{FFFD}");
        assert_eq!(lossy.finish().unwrap(), "");

        let mut strict = Utf8Decoder::strict();
        strict.decode(&[0xE2, 0x82]).unwrap();
        assert!(matches!(
            strict.finish(),
            Err(StreamError::Decode { offset: 0 })
        ));
    }
}
