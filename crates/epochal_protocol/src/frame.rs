//! Length-prefixed frame layer with optional zlib compression.
//!
//! Uncompressed: `[VarInt total][body]`.
//! Compressed: `[VarInt total][VarInt data length][zlib body]`, where a data
//! length of zero means the body follows uncompressed.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::codec::CodecLimits;
use crate::error::{ProtocolError, Result};
use crate::types::VarInt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionState {
    #[default]
    Disabled,
    Enabled {
        threshold: usize,
        level: u32,
    },
}

/// Splits a byte stream into packet bodies (`[id][fields]`) and joins them back.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_length: usize,
    max_uncompressed_length: usize,
    compression: CompressionState,
}

impl FrameCodec {
    pub fn new(limits: &CodecLimits) -> Self {
        Self {
            max_frame_length: limits.max_frame_length,
            max_uncompressed_length: limits.max_uncompressed_length,
            compression: CompressionState::Disabled,
        }
    }

    pub fn enable_compression(&mut self, threshold: usize, level: u32) {
        self.compression = CompressionState::Enabled {
            threshold,
            level: level.min(9),
        };
    }

    pub fn disable_compression(&mut self) {
        self.compression = CompressionState::Disabled;
    }

    pub fn compression(&self) -> CompressionState {
        self.compression
    }

    pub fn is_compressing(&self) -> bool {
        matches!(self.compression, CompressionState::Enabled { .. })
    }

    fn inflate(&self, threshold: usize, mut frame: BytesMut) -> Result<BytesMut> {
        let Some((data_length, header)) = VarInt::peek(&frame)? else {
            return Err(ProtocolError::MalformedCompressedFrame(
                "missing data length".to_string(),
            ));
        };
        frame.advance(header);

        if data_length == 0 {
            return Ok(frame);
        }
        let data_length = usize::try_from(data_length)
            .map_err(|_| ProtocolError::NegativeLength(data_length.into()))?;
        if data_length < threshold {
            return Err(ProtocolError::MalformedCompressedFrame(format!(
                "declared size {data_length} is below the threshold {threshold}"
            )));
        }
        if data_length > self.max_uncompressed_length {
            return Err(ProtocolError::FrameTooLarge {
                length: data_length,
                max: self.max_uncompressed_length,
            });
        }

        let mut inflated = Vec::with_capacity(data_length);
        ZlibDecoder::new(&frame[..])
            .take(data_length as u64 + 1)
            .read_to_end(&mut inflated)
            .map_err(|e| ProtocolError::MalformedCompressedFrame(e.to_string()))?;
        if inflated.len() != data_length {
            return Err(ProtocolError::MalformedCompressedFrame(format!(
                "declared size {data_length}, inflated to {}",
                inflated.len()
            )));
        }
        Ok(BytesMut::from(&inflated[..]))
    }

    fn deflate(&self, threshold: usize, level: u32, body: &[u8]) -> Result<BytesMut> {
        let mut inner = BytesMut::with_capacity(body.len() + 5);
        if body.len() < threshold {
            put_varint(&mut inner, 0);
            inner.put_slice(body);
            return Ok(inner);
        }
        if body.len() > self.max_uncompressed_length {
            return Err(ProtocolError::FrameTooLarge {
                length: body.len(),
                max: self.max_uncompressed_length,
            });
        }

        put_varint(&mut inner, body.len() as i32);
        let mut encoder = ZlibEncoder::new(inner.writer(), Compression::new(level));
        encoder.write_all(body)?;
        Ok(encoder.finish()?.into_inner())
    }
}

fn put_varint(dst: &mut BytesMut, value: i32) {
    let (buffer, len) = VarInt(value).to_bytes();
    dst.put_slice(&buffer[..len]);
}

impl Decoder for FrameCodec {
    type Item = BytesMut;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<BytesMut>> {
        let Some((length, header)) = VarInt::peek(src)? else {
            return Ok(None);
        };
        let length =
            usize::try_from(length).map_err(|_| ProtocolError::NegativeLength(length.into()))?;
        if length > self.max_frame_length {
            return Err(ProtocolError::FrameTooLarge {
                length,
                max: self.max_frame_length,
            });
        }

        let needed = header + length;
        if src.len() < needed {
            src.reserve(needed - src.len());
            return Ok(None);
        }

        src.advance(header);
        let frame = src.split_to(length);
        trace!(length, compressed = self.is_compressing(), "Decoded frame");

        match self.compression {
            CompressionState::Disabled => Ok(Some(frame)),
            CompressionState::Enabled { threshold, .. } => self.inflate(threshold, frame).map(Some),
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, body: Bytes, dst: &mut BytesMut) -> Result<()> {
        let inner = match self.compression {
            CompressionState::Disabled => BytesMut::from(&body[..]),
            CompressionState::Enabled { threshold, level } => self.deflate(threshold, level, &body)?,
        };
        if inner.len() > self.max_frame_length {
            return Err(ProtocolError::FrameTooLarge {
                length: inner.len(),
                max: self.max_frame_length,
            });
        }

        trace!(body = body.len(), length = inner.len(), "Encoded frame");
        dst.reserve(inner.len() + 5);
        put_varint(dst, inner.len() as i32);
        dst.put_slice(&inner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> FrameCodec {
        FrameCodec::new(&CodecLimits::default())
    }

    #[test]
    fn test_plain_frames() {
        let mut codec = codec();
        let mut wire = BytesMut::new();
        codec.encode(Bytes::from_static(&[0x00, 0x2A]), &mut wire).unwrap();
        codec.encode(Bytes::from_static(&[0x01]), &mut wire).unwrap();
        assert_eq!(&wire[..], &[0x02, 0x00, 0x2A, 0x01, 0x01]);

        assert_eq!(&codec.decode(&mut wire).unwrap().unwrap()[..], &[0x00, 0x2A]);
        assert_eq!(&codec.decode(&mut wire).unwrap().unwrap()[..], &[0x01]);
        assert!(codec.decode(&mut wire).unwrap().is_none());
    }

    #[test]
    fn test_partial_frame_waits() {
        let mut codec = codec();
        let mut wire = BytesMut::from(&[0x03, 0x00, 0x01][..]);
        assert!(codec.decode(&mut wire).unwrap().is_none());
        assert_eq!(wire.len(), 3);

        wire.put_u8(0x02);
        assert_eq!(&codec.decode(&mut wire).unwrap().unwrap()[..], &[0x00, 0x01, 0x02]);
    }

    #[test]
    fn test_oversized_length_rejected_early() {
        // 2^21, one past the default ceiling, and no body at all
        let mut wire = BytesMut::from(&[0x80, 0x80, 0x80, 0x01][..]);
        assert!(matches!(
            codec().decode(&mut wire),
            Err(ProtocolError::FrameTooLarge {
                length: 2_097_152,
                ..
            })
        ));
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut wire = BytesMut::from(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F][..]);
        assert!(matches!(
            codec().decode(&mut wire),
            Err(ProtocolError::NegativeLength(-1))
        ));
    }

    #[test]
    fn test_compression_threshold() {
        let mut codec = codec();
        codec.enable_compression(64, 6);

        let mut wire = BytesMut::new();
        codec.encode(Bytes::from_static(&[0x10, 0x01]), &mut wire).unwrap();
        assert_eq!(&wire[..], &[0x03, 0x00, 0x10, 0x01]);

        let large = Bytes::from(vec![0x07; 500]);
        codec.encode(large.clone(), &mut wire).unwrap();

        assert_eq!(&codec.decode(&mut wire).unwrap().unwrap()[..], &[0x10, 0x01]);
        assert_eq!(&codec.decode(&mut wire).unwrap().unwrap()[..], &large[..]);
    }

    fn compressed_frame(declared: i32, payload: &[u8]) -> BytesMut {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload).unwrap();
        let zlib = encoder.finish().unwrap();

        let mut inner = BytesMut::new();
        put_varint(&mut inner, declared);
        inner.put_slice(&zlib);
        let mut wire = BytesMut::new();
        put_varint(&mut wire, inner.len() as i32);
        wire.put_slice(&inner);
        wire
    }

    #[test]
    fn test_declared_size_below_threshold() {
        let mut codec = codec();
        codec.enable_compression(256, 6);
        let mut wire = compressed_frame(10, &[0x01; 10]);
        assert!(matches!(
            codec.decode(&mut wire),
            Err(ProtocolError::MalformedCompressedFrame(_))
        ));
    }

    #[test]
    fn test_inflated_size_mismatch() {
        let mut codec = codec();
        codec.enable_compression(256, 6);
        let mut wire = compressed_frame(400, &[0x01; 300]);
        assert!(matches!(
            codec.decode(&mut wire),
            Err(ProtocolError::MalformedCompressedFrame(_))
        ));
    }

    #[test]
    fn test_declared_size_above_maximum() {
        let mut codec = codec();
        codec.enable_compression(256, 6);
        let mut wire = compressed_frame(8_388_609, &[0x01; 300]);
        assert!(matches!(
            codec.decode(&mut wire),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }
}
