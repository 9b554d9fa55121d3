//! Incremental control-packet framing.
//!
//! A TCP stream gives no message boundaries: a packet body may arrive
//! across several reads, and one read may carry several packets. The
//! [`FrameReader`] buffers incoming bytes and yields complete frames
//! (fixed-header byte plus remaining-length-bounded body) as they become
//! available.

use bytes::{Bytes, BytesMut};

use crate::error::{ProtocolError, Result};
use crate::varint;

/// One complete control packet as read off the wire, not yet interpreted.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Fixed-header byte: `(packet type << 4) | flags`.
    pub type_and_flags: u8,
    /// Body bytes, exactly `remaining length` long.
    pub body: Bytes,
}

impl Frame {
    /// Packet type nibble from the fixed header.
    pub fn packet_type(&self) -> u8 {
        self.type_and_flags >> 4
    }

    /// Flags nibble from the fixed header.
    pub fn flags(&self) -> u8 {
        self.type_and_flags & 0x0F
    }
}

/// Buffering frame reader over a chunked byte stream.
pub struct FrameReader {
    buf: BytesMut,
    /// Maximum accepted body size. A remaining-length claim above this is
    /// rejected before any body bytes are buffered, so a malicious length
    /// cannot grow the buffer unboundedly.
    max_body_size: usize,
}

impl FrameReader {
    pub fn new(max_body_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(8192),
            max_body_size,
        }
    }

    /// Append freshly read bytes to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered, not yet consumed bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Try to take one complete frame off the buffer.
    ///
    /// Returns `Ok(Some(frame))` when a full frame is buffered, `Ok(None)`
    /// when more bytes are needed, or `Err` on an invalid remaining-length
    /// encoding or an oversized body claim. Call repeatedly after each
    /// `extend` to drain every frame that arrived in one read.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.buf.is_empty() {
            return Ok(None);
        }

        let type_and_flags = self.buf[0];

        let Some((remaining_len, len_bytes)) = varint::decode(&self.buf[1..])? else {
            return Ok(None);
        };

        if remaining_len > self.max_body_size {
            return Err(ProtocolError::FrameTooLarge {
                size: remaining_len,
                max: self.max_body_size,
            }
            .into());
        }

        let header_len = 1 + len_bytes;
        let total_len = header_len + remaining_len;

        if self.buf.len() < total_len {
            // Reserve up front so a large body arriving in many small reads
            // does not trigger repeated reallocation.
            self.buf.reserve(total_len - self.buf.len());
            return Ok(None);
        }

        let mut frame = self.buf.split_to(total_len);
        let body = frame.split_off(header_len).freeze();

        Ok(Some(Frame {
            type_and_flags,
            body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pingreq() -> Vec<u8> {
        vec![0xC0, 0x00]
    }

    fn publish(topic: &[u8], payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x30];
        varint::encode_to_vec(2 + topic.len() + payload.len(), &mut out);
        out.extend_from_slice(&(topic.len() as u16).to_be_bytes());
        out.extend_from_slice(topic);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_empty_buffer_yields_nothing() {
        let mut reader = FrameReader::new(1024);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_whole_frame_in_one_read() {
        let mut reader = FrameReader::new(1024);
        reader.extend(&publish(b"siot/img", b"hello"));

        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.packet_type(), 3);
        assert_eq!(frame.flags(), 0);
        assert_eq!(frame.body.len(), 2 + 8 + 5);
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_frame_split_across_three_reads() {
        let bytes = publish(b"siot/img", b"payload");
        let mut reader = FrameReader::new(1024);

        reader.extend(&bytes[..1]);
        assert!(reader.next_frame().unwrap().is_none());

        reader.extend(&bytes[1..bytes.len() - 3]);
        assert!(reader.next_frame().unwrap().is_none());

        reader.extend(&bytes[bytes.len() - 3..]);
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.packet_type(), 3);
        assert_eq!(&frame.body[2..10], b"siot/img");
    }

    #[test]
    fn test_multiple_frames_in_one_read() {
        let mut bytes = publish(b"a", b"1");
        bytes.extend_from_slice(&pingreq());
        bytes.extend_from_slice(&publish(b"b", b"2"));

        let mut reader = FrameReader::new(1024);
        reader.extend(&bytes);

        assert_eq!(reader.next_frame().unwrap().unwrap().packet_type(), 3);
        assert_eq!(reader.next_frame().unwrap().unwrap().packet_type(), 12);
        assert_eq!(reader.next_frame().unwrap().unwrap().packet_type(), 3);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_body_larger_than_limit_rejected_early() {
        let mut reader = FrameReader::new(64);
        // Header claims a 1MB body; only the header has arrived.
        let mut bytes = vec![0x30];
        varint::encode_to_vec(1024 * 1024, &mut bytes);
        reader.extend(&bytes);

        let err = reader.next_frame().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Protocol(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_malformed_remaining_length() {
        let mut reader = FrameReader::new(1024);
        reader.extend(&[0x30, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);

        let err = reader.next_frame().unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Protocol(ProtocolError::InvalidRemainingLength)
        ));
    }

    #[test]
    fn test_incomplete_varint_waits_for_more() {
        let mut reader = FrameReader::new(usize::MAX);
        reader.extend(&[0x30, 0x80]);
        assert!(reader.next_frame().unwrap().is_none());
        reader.extend(&[0x01]);
        // Length now resolved to 128; body still missing.
        assert!(reader.next_frame().unwrap().is_none());
    }
}
