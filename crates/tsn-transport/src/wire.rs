//! # Wire Format
//!
//! Two message shapes travel between a talker and a switch: data blocks
//! (talker → switch) and acknowledgments (switch → talker). Both are carried
//! by the tagged [`Message`] enum.
//!
//! ## Data message (26 bytes)
//!
//! ```text
//! +------+-----------+-----------+--------+----------------+-------------------+
//! | 0x00 | stream_id | idx       | parity | payload_size   | send_timestamp    |
//! | u8   | u32 (BE)  | u32 (BE)  | u8     | u64 (BE)       | f64 seconds (BE)  |
//! +------+-----------+-----------+--------+----------------+-------------------+
//! ```
//!
//! ## Ack message (5 bytes)
//!
//! ```text
//! +------+-----------+
//! | 0x01 | stream_id |
//! | u8   | u32 (BE)  |
//! +------+-----------+
//! ```
//!
//! Ids, indices and sizes are never negative and travel unsigned. Up to
//! `i32::MAX` (`i64::MAX` for the size) the bytes match a signed big-endian
//! encoding, so peers that read `int32`/`int64` fields see the same values.

use bytes::{Buf, BufMut, BytesMut};
use std::fmt;
use std::time::Duration;

use crate::context::SimTime;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Payload size of every block (12.8 MB).
pub const DEFAULT_BLOCK_SIZE: u64 = 12_800_000;

/// Encoded size of a data message.
pub const DATA_MESSAGE_LEN: usize = 1 + 4 + 4 + 1 + 8 + 8;

/// Encoded size of an ack message.
pub const ACK_MESSAGE_LEN: usize = 1 + 4;

/// Identifier of a stream. Assigned sequentially by the talker from 0.
pub type StreamId = u32;

// ─── Message Kind ────────────────────────────────────────────────────────────

/// Leading tag byte of every encoded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Data = 0x00,
    Ack = 0x01,
}

impl MessageKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(MessageKind::Data),
            0x01 => Some(MessageKind::Ack),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Data => f.write_str("data"),
            MessageKind::Ack => f.write_str("ack"),
        }
    }
}

// ─── Block ───────────────────────────────────────────────────────────────────

/// Position of a block within its stream: data index or parity index.
///
/// Data and parity indices overlap (`0..k` and `0..m`), so the parity flag is
/// part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockKey {
    pub is_parity: bool,
    pub idx: u32,
}

/// One fixed-size block of a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stream_id: StreamId,
    /// `0 <= idx < k` for data blocks, `0 <= idx < m` for parity blocks.
    pub idx: u32,
    pub is_parity: bool,
    /// Nominal payload size in bytes. Only the size is modeled, not the bytes.
    pub size_bytes: u64,
    /// Departure time of this copy, stamped by the transmission scheduler.
    pub send_time: SimTime,
}

impl Block {
    pub fn data(stream_id: StreamId, idx: u32, size_bytes: u64) -> Self {
        Block {
            stream_id,
            idx,
            is_parity: false,
            size_bytes,
            send_time: Duration::ZERO,
        }
    }

    pub fn parity(stream_id: StreamId, idx: u32, size_bytes: u64) -> Self {
        Block {
            is_parity: true,
            ..Block::data(stream_id, idx, size_bytes)
        }
    }

    pub fn key(&self) -> BlockKey {
        BlockKey {
            is_parity: self.is_parity,
            idx: self.idx,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(MessageKind::Data as u8);
        buf.put_u32(self.stream_id);
        buf.put_u32(self.idx);
        buf.put_u8(self.is_parity as u8);
        buf.put_u64(self.size_bytes);
        buf.put_f64(self.send_time.as_secs_f64());
    }

    /// Decode the body of a data message (tag byte already consumed).
    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < DATA_MESSAGE_LEN - 1 {
            return None;
        }
        let stream_id = buf.get_u32();
        let idx = buf.get_u32();
        let is_parity = match buf.get_u8() {
            0 => false,
            1 => true,
            _ => return None,
        };
        let size_bytes = buf.get_u64();
        let send_time = Duration::try_from_secs_f64(buf.get_f64()).ok()?;
        Some(Block {
            stream_id,
            idx,
            is_parity,
            size_bytes,
            send_time,
        })
    }
}

// ─── Ack ─────────────────────────────────────────────────────────────────────

/// Acknowledgment that a whole stream is reconstructable at the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub stream_id: StreamId,
}

impl Ack {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(MessageKind::Ack as u8);
        buf.put_u32(self.stream_id);
    }

    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if buf.remaining() < ACK_MESSAGE_LEN - 1 {
            return None;
        }
        Some(Ack {
            stream_id: buf.get_u32(),
        })
    }
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// Everything a node can receive from the network.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Data(Block),
    Ack(Ack),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Data(_) => MessageKind::Data,
            Message::Ack(_) => MessageKind::Ack,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        match self {
            Message::Data(block) => block.stream_id,
            Message::Ack(ack) => ack.stream_id,
        }
    }

    /// Bytes the message occupies on a link. Data blocks count their nominal
    /// payload; acks count their header only.
    pub fn size_bytes(&self) -> u64 {
        match self {
            Message::Data(block) => block.size_bytes,
            Message::Ack(_) => ACK_MESSAGE_LEN as u64,
        }
    }

    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(DATA_MESSAGE_LEN);
        match self {
            Message::Data(block) => block.encode(&mut buf),
            Message::Ack(ack) => ack.encode(&mut buf),
        }
        buf
    }

    /// Decode a message. Returns `None` on truncated input or unknown tag.
    pub fn decode(buf: &mut impl Buf) -> Option<Self> {
        if !buf.has_remaining() {
            return None;
        }
        match MessageKind::from_byte(buf.get_u8())? {
            MessageKind::Data => Block::decode(buf).map(Message::Data),
            MessageKind::Ack => Ack::decode(buf).map(Message::Ack),
        }
    }
}

impl From<Block> for Message {
    fn from(block: Block) -> Self {
        Message::Data(block)
    }
}

impl From<Ack> for Message {
    fn from(ack: Ack) -> Self {
        Message::Ack(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_message_roundtrip() {
        let mut block = Block::parity(7, 3, DEFAULT_BLOCK_SIZE);
        block.send_time = Duration::from_millis(1_250);
        let msg = Message::Data(block.clone());

        let mut encoded = msg.encode().freeze();
        assert_eq!(encoded.len(), DATA_MESSAGE_LEN);
        let decoded = Message::decode(&mut encoded).unwrap();
        assert_eq!(decoded, Message::Data(block));
    }

    #[test]
    fn ack_message_roundtrip() {
        let msg = Message::Ack(Ack { stream_id: 42 });
        let mut encoded = msg.encode().freeze();
        assert_eq!(encoded.len(), ACK_MESSAGE_LEN);
        assert_eq!(Message::decode(&mut encoded), Some(msg));
    }

    #[test]
    fn unsigned_fields_match_signed_encoding() {
        let encoded = Message::Data(Block::data(i32::MAX as u32, 7, DEFAULT_BLOCK_SIZE)).encode();
        assert_eq!(&encoded[1..5], &i32::MAX.to_be_bytes());
        assert_eq!(&encoded[5..9], &7i32.to_be_bytes());
        assert_eq!(&encoded[10..18], &(DEFAULT_BLOCK_SIZE as i64).to_be_bytes());

        let ack = Message::Ack(Ack { stream_id: 12 }).encode();
        assert_eq!(&ack[1..], &12i32.to_be_bytes());
    }

    #[test]
    fn truncated_data_rejected() {
        let msg = Message::Data(Block::data(1, 0, DEFAULT_BLOCK_SIZE));
        let encoded = msg.encode().freeze();
        let mut short = encoded.slice(..DATA_MESSAGE_LEN - 1);
        assert!(Message::decode(&mut short).is_none());
    }

    #[test]
    fn unknown_tag_rejected() {
        let mut buf = bytes::Bytes::from_static(&[0x7f, 0, 0, 0, 1]);
        assert!(Message::decode(&mut buf).is_none());
    }

    #[test]
    fn invalid_parity_flag_rejected() {
        let mut raw = Message::Data(Block::data(1, 0, 100)).encode();
        raw[9] = 2;
        assert!(Message::decode(&mut raw.freeze()).is_none());
    }

    #[test]
    fn empty_buffer_rejected() {
        let mut buf = bytes::Bytes::new();
        assert!(Message::decode(&mut buf).is_none());
    }

    #[test]
    fn block_key_separates_data_and_parity() {
        let d = Block::data(0, 1, 10);
        let p = Block::parity(0, 1, 10);
        assert_ne!(d.key(), p.key());
        assert_eq!(d.key().idx, p.key().idx);
    }

    #[test]
    fn message_size_uses_block_payload() {
        assert_eq!(
            Message::Data(Block::data(0, 0, DEFAULT_BLOCK_SIZE)).size_bytes(),
            DEFAULT_BLOCK_SIZE
        );
        assert_eq!(
            Message::Ack(Ack { stream_id: 0 }).size_bytes(),
            ACK_MESSAGE_LEN as u64
        );
    }
}
