//! Binary frame codec for the Volcengine streaming ASR WebSocket protocol.
//!
//! Every frame starts with a fixed 4-byte header:
//!
//! ```text
//! byte 0: protocol version (4 bits) | header size in 32-bit words (4 bits)
//! byte 1: message type (4 bits)     | message flags (4 bits)
//! byte 2: serialization (4 bits)    | compression (4 bits)
//! byte 3: reserved (0x00)
//! ```
//!
//! followed by an optional big-endian u32 sequence number (server responses
//! with a sequence flag only), a big-endian u32 payload length, and the
//! payload itself. Error responses carry an error code and a UTF-8 message
//! in place of the payload.
//!
//! All functions here are pure.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};
use flate2::Compression as GzipLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde_json::Value;

use crate::core::stt::base::STTError;

pub const PROTOCOL_VERSION: u8 = 0b0001;
/// Header size in 32-bit words
pub const HEADER_SIZE_WORDS: u8 = 0b0001;
pub const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    FullClientRequest,
    AudioOnlyRequest,
    FullServerResponse,
    ErrorResponse,
    Other(u8),
}

impl MessageType {
    pub fn bits(self) -> u8 {
        match self {
            MessageType::FullClientRequest => 0b0001,
            MessageType::AudioOnlyRequest => 0b0010,
            MessageType::FullServerResponse => 0b1001,
            MessageType::ErrorResponse => 0b1111,
            MessageType::Other(bits) => bits & 0x0f,
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x0f {
            0b0001 => MessageType::FullClientRequest,
            0b0010 => MessageType::AudioOnlyRequest,
            0b1001 => MessageType::FullServerResponse,
            0b1111 => MessageType::ErrorResponse,
            other => MessageType::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFlags {
    NoSequence,
    PositiveSequence,
    LastPacketNoSequence,
    LastPacketWithSequence,
    Other(u8),
}

impl MessageFlags {
    pub fn bits(self) -> u8 {
        match self {
            MessageFlags::NoSequence => 0b0000,
            MessageFlags::PositiveSequence => 0b0001,
            MessageFlags::LastPacketNoSequence => 0b0010,
            MessageFlags::LastPacketWithSequence => 0b0011,
            MessageFlags::Other(bits) => bits & 0x0f,
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x0f {
            0b0000 => MessageFlags::NoSequence,
            0b0001 => MessageFlags::PositiveSequence,
            0b0010 => MessageFlags::LastPacketNoSequence,
            0b0011 => MessageFlags::LastPacketWithSequence,
            other => MessageFlags::Other(other),
        }
    }

    /// Whether these flags mark the last packet of a stream
    pub fn is_last_packet(self) -> bool {
        matches!(
            self,
            MessageFlags::LastPacketNoSequence | MessageFlags::LastPacketWithSequence
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serialization {
    None,
    Json,
    Other(u8),
}

impl Serialization {
    pub fn bits(self) -> u8 {
        match self {
            Serialization::None => 0b0000,
            Serialization::Json => 0b0001,
            Serialization::Other(bits) => bits & 0x0f,
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x0f {
            0b0000 => Serialization::None,
            0b0001 => Serialization::Json,
            other => Serialization::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Other(u8),
}

impl Compression {
    pub fn bits(self) -> u8 {
        match self {
            Compression::None => 0b0000,
            Compression::Gzip => 0b0001,
            Compression::Other(bits) => bits & 0x0f,
        }
    }

    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x0f {
            0b0000 => Compression::None,
            0b0001 => Compression::Gzip,
            other => Compression::Other(other),
        }
    }
}

/// Codec failures. All of them map onto [`STTError::ProtocolError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame too short for header: {0} bytes")]
    TruncatedHeader(usize),
    #[error("frame truncated before sequence number")]
    TruncatedSequence,
    #[error("error frame truncated before error code")]
    TruncatedErrorCode,
    #[error("frame truncated before payload length")]
    TruncatedLength,
    #[error("payload length mismatch: declared {declared} bytes, {available} available")]
    PayloadLengthMismatch { declared: usize, available: usize },
    #[error("unsupported compression method {0}")]
    UnsupportedCompression(u8),
    #[error("gzip failure: {0}")]
    Gzip(String),
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),
}

impl From<ProtocolError> for STTError {
    fn from(err: ProtocolError) -> Self {
        STTError::ProtocolError(err.to_string())
    }
}

/// Decoded 4-byte frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub protocol_version: u8,
    pub header_size_words: u8,
    pub message_type: MessageType,
    pub flags: MessageFlags,
    pub serialization: Serialization,
    pub compression: Compression,
}

impl FrameHeader {
    pub fn new(
        message_type: MessageType,
        flags: MessageFlags,
        serialization: Serialization,
        compression: Compression,
    ) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            header_size_words: HEADER_SIZE_WORDS,
            message_type,
            flags,
            serialization,
            compression,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        [
            ((self.protocol_version & 0x0f) << 4) | (self.header_size_words & 0x0f),
            (self.message_type.bits() << 4) | self.flags.bits(),
            (self.serialization.bits() << 4) | self.compression.bits(),
            0x00,
        ]
    }

    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < HEADER_LEN {
            return Err(ProtocolError::TruncatedHeader(data.len()));
        }

        Ok(Self {
            protocol_version: data[0] >> 4,
            header_size_words: data[0] & 0x0f,
            message_type: MessageType::from_bits(data[1] >> 4),
            flags: MessageFlags::from_bits(data[1]),
            serialization: Serialization::from_bits(data[2] >> 4),
            compression: Compression::from_bits(data[2]),
        })
    }

    /// Sequence numbers only accompany server responses flagged with one
    pub fn has_sequence(&self) -> bool {
        self.message_type == MessageType::FullServerResponse
            && matches!(
                self.flags,
                MessageFlags::PositiveSequence | MessageFlags::LastPacketWithSequence
            )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Raw(Bytes),
}

impl Payload {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            Payload::Raw(_) => None,
        }
    }
}

/// A decoded non-error frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: FrameHeader,
    pub sequence: Option<u32>,
    pub payload: Payload,
}

impl Frame {
    pub fn is_final(&self) -> bool {
        self.header.flags.is_last_packet()
    }
}

/// Contents of an ERROR_RESPONSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFrame {
    pub code: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFrame {
    Message(Frame),
    Error(ErrorFrame),
}

struct FrameReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    fn new(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    fn read_u32(&mut self, missing: ProtocolError) -> Result<u32, ProtocolError> {
        let end = self.offset + 4;
        let bytes = self.data.get(self.offset..end).ok_or(missing)?;
        self.offset = end;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_exact(&mut self, len: usize) -> Result<&'a [u8], ProtocolError> {
        let available = self.remaining();
        if len > available {
            return Err(ProtocolError::PayloadLengthMismatch {
                declared: len,
                available,
            });
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }
}

pub fn gzip_compress(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), GzipLevel::default());
    encoder
        .write_all(data)
        .map_err(|e| ProtocolError::Gzip(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ProtocolError::Gzip(e.to_string()))
}

pub fn gzip_decompress(data: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 2);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ProtocolError::Gzip(e.to_string()))?;
    Ok(out)
}

/// Assemble a frame from a header, optional sequence and an already encoded payload.
pub fn encode_frame(header: FrameHeader, sequence: Option<u32>, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + 8 + payload.len());
    buf.put_slice(&header.to_bytes());
    if let Some(sequence) = sequence {
        buf.put_u32(sequence);
    }
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.freeze()
}

/// FULL_CLIENT_REQUEST with a gzip-compressed JSON payload.
pub fn encode_control_frame<T: Serialize>(payload: &T) -> Result<Bytes, ProtocolError> {
    let json = serde_json::to_vec(payload).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    let compressed = gzip_compress(&json)?;
    let header = FrameHeader::new(
        MessageType::FullClientRequest,
        MessageFlags::NoSequence,
        Serialization::Json,
        Compression::Gzip,
    );
    Ok(encode_frame(header, None, &compressed))
}

/// AUDIO_ONLY_REQUEST with gzip-compressed raw audio. An empty buffer is still compressed.
pub fn encode_audio_frame(data: &[u8], is_last: bool) -> Result<Bytes, ProtocolError> {
    let compressed = gzip_compress(data)?;
    let flags = if is_last {
        MessageFlags::LastPacketNoSequence
    } else {
        MessageFlags::NoSequence
    };
    let header = FrameHeader::new(
        MessageType::AudioOnlyRequest,
        flags,
        Serialization::None,
        Compression::Gzip,
    );
    Ok(encode_frame(header, None, &compressed))
}

/// FULL_SERVER_RESPONSE as the service sends it. Used by mock upstreams.
pub fn encode_server_response<T: Serialize>(
    payload: &T,
    flags: MessageFlags,
    sequence: u32,
) -> Result<Bytes, ProtocolError> {
    let json = serde_json::to_vec(payload).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
    let compressed = gzip_compress(&json)?;
    let header = FrameHeader::new(
        MessageType::FullServerResponse,
        flags,
        Serialization::Json,
        Compression::Gzip,
    );
    let sequence = header.has_sequence().then_some(sequence);
    Ok(encode_frame(header, sequence, &compressed))
}

/// ERROR_RESPONSE frame: error code, message length, UTF-8 message.
pub fn encode_error_frame(code: u32, message: &str) -> Bytes {
    let header = FrameHeader::new(
        MessageType::ErrorResponse,
        MessageFlags::NoSequence,
        Serialization::Json,
        Compression::None,
    );
    let mut buf = BytesMut::with_capacity(HEADER_LEN + 8 + message.len());
    buf.put_slice(&header.to_bytes());
    buf.put_u32(code);
    buf.put_u32(message.len() as u32);
    buf.put_slice(message.as_bytes());
    buf.freeze()
}

/// Decode one inbound frame.
///
/// Error responses are returned as [`DecodedFrame::Error`] without touching
/// any payload decoding.
pub fn decode_frame(data: &[u8]) -> Result<DecodedFrame, ProtocolError> {
    let header = FrameHeader::parse(data)?;
    let mut reader = FrameReader::new(data, HEADER_LEN);

    if header.message_type == MessageType::ErrorResponse {
        let code = reader.read_u32(ProtocolError::TruncatedErrorCode)?;
        let len = reader.read_u32(ProtocolError::TruncatedLength)? as usize;
        let message = String::from_utf8_lossy(reader.read_exact(len)?).into_owned();
        return Ok(DecodedFrame::Error(ErrorFrame { code, message }));
    }

    let sequence = if header.has_sequence() {
        Some(reader.read_u32(ProtocolError::TruncatedSequence)?)
    } else {
        None
    };

    let len = reader.read_u32(ProtocolError::TruncatedLength)? as usize;
    let raw = reader.read_exact(len)?;

    let body = match header.compression {
        Compression::Gzip => gzip_decompress(raw)?,
        Compression::None => raw.to_vec(),
        Compression::Other(bits) => return Err(ProtocolError::UnsupportedCompression(bits)),
    };

    let payload = match header.serialization {
        Serialization::Json => {
            let text =
                std::str::from_utf8(&body).map_err(|e| ProtocolError::InvalidUtf8(e.to_string()))?;
            let value =
                serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
            Payload::Json(value)
        }
        _ => Payload::Raw(Bytes::from(body)),
    };

    Ok(DecodedFrame::Message(Frame {
        header,
        sequence,
        payload,
    }))
}
