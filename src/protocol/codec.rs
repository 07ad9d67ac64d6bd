//! Module `codec`
//!
//! Splits a player's byte stream into lines no longer than the configured
//! limit. Over-long and non-UTF-8 lines come out as items carrying a
//! `ProtocolError`, so the stream keeps going after bad input.

use std::io;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::ProtocolError;

/// One line read from a player, or the reason it was unusable.
pub type ClientLine = Result<String, ProtocolError>;

#[derive(Debug)]
pub struct MoveLineCodec {
    max_length: usize,
    /// Set while skipping the rest of an over-long line; counts dropped bytes.
    discarding: Option<usize>,
}

impl MoveLineCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            discarding: None,
        }
    }
}

fn decode_line(raw: &[u8]) -> ClientLine {
    String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

impl Decoder for MoveLineCodec {
    type Item = ClientLine;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<ClientLine>, io::Error> {
        let newline = buf.iter().position(|byte| *byte == b'\n');

        if let Some(dropped) = self.discarding {
            return Ok(match newline {
                Some(at) => {
                    buf.advance(at + 1);
                    self.discarding = None;
                    Some(Err(ProtocolError::TooLong(dropped + at)))
                }
                None => {
                    self.discarding = Some(dropped + buf.len());
                    buf.clear();
                    None
                }
            });
        }

        match newline {
            Some(at) if at > self.max_length => {
                buf.advance(at + 1);
                Ok(Some(Err(ProtocolError::TooLong(at))))
            }
            Some(at) => {
                let line = buf.split_to(at + 1);
                Ok(Some(decode_line(&line[..at])))
            }
            None if buf.len() > self.max_length => {
                // Never buffer more than one line's worth.
                self.discarding = Some(buf.len());
                buf.clear();
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<ClientLine>, io::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        if self.discarding.take().is_some() || buf.is_empty() {
            return Ok(None);
        }

        // Unterminated last line
        let line = buf.split();
        Ok(Some(decode_line(&line)))
    }
}
