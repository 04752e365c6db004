// Path: src/frame.rs
//! Frame codec (§4.2): the plaintext unit that is actually encrypted.
//!
//! A frame is a fixed 13-byte header followed by a payload. Messages whose
//! UTF-8 encoding exceeds [`MAX_PAYLOAD_LEN`] are split into multiple
//! frames sharing a random `message_id`; the receiver re-sorts by
//! `chunk_index` and concatenates.

use rand::RngCore;

use crate::error::WireError;

/// Fixed frame header size in bytes.
pub const HEADER_LEN: usize = 13;

/// Largest payload a single frame may carry.
///
/// A transaction's payload/account overhead leaves roughly 900 bytes for
/// ciphertext; after the 16-byte Poly1305 tag and the 13-byte frame header,
/// 661 is the largest chunk guaranteed to fit.
pub const MAX_PAYLOAD_LEN: usize = 661;

const FLAG_STANDALONE: u8 = 0x00;
const FLAG_CHUNKED: u8 = 0x01;

/// A decoded (or about-to-be-encoded) frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// `false` for a standalone message, `true` for one chunk of a larger one.
    pub chunked: bool,
    /// Random identifier shared by every chunk of a logical message.
    pub message_id: u64,
    /// Zero-based index of this chunk among `total_chunks`.
    pub chunk_index: u16,
    /// Total number of chunks in this logical message (>= 1).
    pub total_chunks: u16,
    /// The frame's payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Serializes this frame to its on-wire byte representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.push(if self.chunked { FLAG_CHUNKED } else { FLAG_STANDALONE });
        out.extend_from_slice(&self.message_id.to_be_bytes());
        out.extend_from_slice(&self.chunk_index.to_be_bytes());
        out.extend_from_slice(&self.total_chunks.to_be_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Parses a frame from raw bytes.
    ///
    /// Fails only if fewer than [`HEADER_LEN`] bytes are given. Tolerant of
    /// a payload longer than [`MAX_PAYLOAD_LEN`] so future format revisions
    /// that raise the ceiling can still be decoded by this version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() < HEADER_LEN {
            return Err(WireError::FrameTooShort(bytes.len()));
        }

        let flags = *bytes.first().ok_or(WireError::FrameTooShort(bytes.len()))?;
        let message_id_bytes: [u8; 8] = bytes
            .get(1..9)
            .and_then(|s| s.try_into().ok())
            .ok_or(WireError::FrameTooShort(bytes.len()))?;
        let chunk_index_bytes: [u8; 2] = bytes
            .get(9..11)
            .and_then(|s| s.try_into().ok())
            .ok_or(WireError::FrameTooShort(bytes.len()))?;
        let total_chunks_bytes: [u8; 2] = bytes
            .get(11..13)
            .and_then(|s| s.try_into().ok())
            .ok_or(WireError::FrameTooShort(bytes.len()))?;
        let message_id = u64::from_be_bytes(message_id_bytes);
        let chunk_index = u16::from_be_bytes(chunk_index_bytes);
        let total_chunks = u16::from_be_bytes(total_chunks_bytes);
        let payload = bytes
            .get(HEADER_LEN..)
            .ok_or(WireError::FrameTooShort(bytes.len()))?
            .to_vec();

        Ok(Frame {
            chunked: flags != FLAG_STANDALONE,
            message_id,
            chunk_index,
            total_chunks,
            payload,
        })
    }
}

/// Encodes `text` into one or more frames, chunking if its UTF-8 length
/// exceeds [`MAX_PAYLOAD_LEN`].
pub fn encode(text: &str) -> Vec<Frame> {
    let payload = text.as_bytes();
    let message_id = rand::thread_rng().next_u64();

    if payload.len() <= MAX_PAYLOAD_LEN {
        return vec![Frame {
            chunked: false,
            message_id,
            chunk_index: 0,
            total_chunks: 1,
            payload: payload.to_vec(),
        }];
    }

    let total_chunks = payload.len().div_ceil(MAX_PAYLOAD_LEN) as u16;
    payload
        .chunks(MAX_PAYLOAD_LEN)
        .enumerate()
        .map(|(i, chunk)| Frame {
            chunked: true,
            message_id,
            chunk_index: i as u16,
            total_chunks,
            payload: chunk.to_vec(),
        })
        .collect()
}

/// Decodes a single frame from raw bytes.
pub fn decode(bytes: &[u8]) -> Result<Frame, WireError> {
    Frame::from_bytes(bytes)
}
