// Path: src/messenger/reassembly.rs
//! Chunk reassembly (§4.9): `Empty → Partial(k/N) → Complete` per `(sender, message_id)`.
//!
//! Shared by the history path and the live-listen path so both converge on
//! identical reassembled messages (§8 property S6). Keyed on `(sender,
//! message_id)` rather than also including the recipient, since a given
//! `message_id` is drawn fresh per logical message (§3) and a single
//! listen/read session only ever decrypts traffic addressed to one caller.

use std::collections::BTreeMap;

use dashmap::DashMap;
use tracing::warn;

use crate::address::Address;
use crate::frame::Frame;
use crate::types::{IdentityKey, Message};

struct PendingMessage {
    sender: Address,
    recipient: Address,
    total_chunks: u16,
    timestamp: i64,
    chunks: BTreeMap<u16, (Vec<u8>, String)>,
}

/// Accumulates in-flight chunked messages until every chunk has arrived.
///
/// Owned by a single read/listen session and discarded with it (§3
/// Ownership). Safe to drive from multiple concurrent tasks (the bounded
/// history fetch pool, §5) since the backing map is a [`DashMap`].
#[derive(Default)]
pub struct ReassemblyBuffer {
    pending: DashMap<(Address, u64), PendingMessage>,
}

impl ReassemblyBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { pending: DashMap::new() }
    }

    /// Feeds one decoded frame into the buffer.
    ///
    /// Standalone frames complete immediately. Chunked frames are grouped
    /// by `(sender, message_id)`; a group finalizes once every chunk
    /// `0..total_chunks` has arrived. Returns `None` while a message is
    /// still partial.
    ///
    /// A chunk whose `total_chunks` disagrees with a pending group's
    /// recorded value is treated as adversarial or corrupt input: the
    /// whole logical message is dropped and the disagreement is logged
    /// (§9's recommended behavior for conflicting `total_chunks`).
    pub fn ingest(
        &self,
        sender: Address,
        recipient: Address,
        frame: Frame,
        signature: String,
        timestamp: i64,
    ) -> Option<Message> {
        if !frame.chunked {
            return Some(Message {
                sender: IdentityKey(sender),
                recipient: IdentityKey(recipient),
                text: String::from_utf8_lossy(&frame.payload).into_owned(),
                timestamp,
                message_id: frame.message_id,
                tx_signatures: vec![signature],
            });
        }

        let key = (sender, frame.message_id);
        let mut entry = self.pending.entry(key).or_insert_with(|| PendingMessage {
            sender,
            recipient,
            total_chunks: frame.total_chunks,
            timestamp,
            chunks: BTreeMap::new(),
        });

        if entry.total_chunks != frame.total_chunks {
            warn!(
                message_id = frame.message_id,
                recorded = entry.total_chunks,
                received = frame.total_chunks,
                "conflicting total_chunks for in-flight message, dropping"
            );
            drop(entry);
            self.pending.remove(&key);
            return None;
        }

        // Idempotent: a chunk_index already present is ignored rather than
        // replaced, since a non-adversarial resend carries an equivalent
        // payload (§4.9).
        entry.chunks.entry(frame.chunk_index).or_insert((frame.payload, signature));

        if entry.chunks.len() < entry.total_chunks as usize {
            return None;
        }

        drop(entry);
        let finished = self.pending.remove(&key)?.1;
        let mut text_bytes = Vec::new();
        let mut signatures = Vec::with_capacity(finished.chunks.len());
        for (_, (payload, sig)) in finished.chunks {
            text_bytes.extend_from_slice(&payload);
            signatures.push(sig);
        }

        Some(Message {
            sender: IdentityKey(finished.sender),
            recipient: IdentityKey(finished.recipient),
            text: String::from_utf8_lossy(&text_bytes).into_owned(),
            timestamp: finished.timestamp,
            message_id: frame.message_id,
            tx_signatures: signatures,
        })
    }

    /// Number of logical messages currently partially assembled.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
