// Path: src/wire/event.rs
//! `MessageSent` event parsing from transaction log lines (§4.3).
//!
//! The on-chain program emits one `Program data: <base64>` log line per
//! event. Parsing is defensive by design: unrelated lines, lines with a
//! differing discriminator, and corrupt base64 are skipped rather than
//! treated as errors, since a program-wide log stream mixes events this
//! client does not care about with events it does.

use base64::Engine;
use tracing::trace;

use crate::address::Address;

/// Prefix the host chain uses to surface a program's `emit!`'d data in logs.
const PROGRAM_DATA_PREFIX: &str = "Program data: ";

/// Discriminator identifying a `MessageSent` event.
pub const MESSAGE_SENT_DISCRIMINATOR: [u8; 8] = [0x74, 0x46, 0xE0, 0x4C, 0x80, 0x1C, 0x6E, 0x37];

/// Minimum byte length of a well-formed event body: disc(8) + sender(32) +
/// recipient(32) + ct_len(4) + nonce(24) + timestamp(8), with ct_len = 0.
const MIN_EVENT_LEN: usize = 8 + 32 + 32 + 4 + 24 + 8;

/// A decoded `MessageSent` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSentEvent {
    /// The sender's identity key.
    pub sender: Address,
    /// The recipient's identity key.
    pub recipient: Address,
    /// The encrypted frame bytes.
    pub ciphertext: Vec<u8>,
    /// The 24-byte nonce used for this ciphertext.
    pub nonce: [u8; 24],
    /// Block-assigned unix timestamp, in seconds.
    pub timestamp: i64,
}

/// Scans `logs` for `MessageSent` events, in order, skipping anything that
/// does not parse cleanly. A single transaction may emit more than one event.
pub fn parse_events(logs: &[String]) -> Vec<MessageSentEvent> {
    logs.iter().filter_map(|line| parse_log_line(line)).collect()
}

fn parse_log_line(line: &str) -> Option<MessageSentEvent> {
    let encoded = line.strip_prefix(PROGRAM_DATA_PREFIX)?;
    let raw = match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => bytes,
        Err(e) => {
            trace!(error = %e, "skipping log line with invalid base64");
            return None;
        }
    };

    if raw.len() < MIN_EVENT_LEN {
        trace!(len = raw.len(), "skipping log line shorter than a minimal event");
        return None;
    }
    if raw.get(0..8)? != MESSAGE_SENT_DISCRIMINATOR {
        return None;
    }

    let mut offset = 8;
    let sender: Address = raw.get(offset..offset + 32)?.try_into().ok()?;
    offset += 32;
    let recipient: Address = raw.get(offset..offset + 32)?.try_into().ok()?;
    offset += 32;
    let ct_len = u32::from_le_bytes(raw.get(offset..offset + 4)?.try_into().ok()?) as usize;
    offset += 4;

    if raw.len() < offset + ct_len + 24 + 8 {
        trace!("skipping log line with truncated ciphertext/nonce/timestamp");
        return None;
    }
    let ciphertext = raw.get(offset..offset + ct_len)?.to_vec();
    offset += ct_len;
    let nonce: [u8; 24] = raw.get(offset..offset + 24)?.try_into().ok()?;
    offset += 24;
    let timestamp = i64::from_le_bytes(raw.get(offset..offset + 8)?.try_into().ok()?);

    Some(MessageSentEvent { sender, recipient, ciphertext, nonce, timestamp })
}
