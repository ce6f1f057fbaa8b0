//! Byte packets over 7-bit frames.
//!
//! A packet on the wire is its payload followed by a one-byte checksum. The
//! wire bytes are packed MSB first into 7-bit frames, the last frame padded
//! with zero bits. There is no length field: the receiver knows a packet is
//! over when its face has been quiet for a few sample windows.
//!
//! ```text
//! bytes   | b0             | b1             | sum            |
//! frames  | f0      | f1      | f2      | f3      | (pad)
//! ```
//!
//! `F` frames carry `floor(7 * F / 8)` bytes; whatever is left over must be
//! zero.

use heapless::Vec;

use crate::checksum::checksum;
use crate::consts::{FRAME_DATA_BITS, FRAME_DATA_MASK, PACKET_MAX_FRAMES, PACKET_MAX_LEN};
use crate::error::{PacketError, RxError, SendError};

/// A received or outgoing packet payload.
pub type Packet = Vec<u8, PACKET_MAX_LEN>;

/// Frames making up one packet on the wire.
pub type Frames = Vec<u8, PACKET_MAX_FRAMES>;

/// Packs `payload` and its checksum into 7-bit frames.
pub fn encode(payload: &[u8]) -> Result<Frames, SendError> {
    if payload.is_empty() {
        return Err(SendError::Empty);
    }
    if payload.len() > PACKET_MAX_LEN {
        return Err(SendError::TooLong);
    }

    let sum = checksum(payload);
    let mut frames = Frames::new();
    let mut acc: u16 = 0;
    let mut bits = 0usize;
    for &byte in payload.iter().chain(core::iter::once(&sum)) {
        acc = (acc << 8) | u16::from(byte);
        bits += 8;
        while bits >= FRAME_DATA_BITS {
            bits -= FRAME_DATA_BITS;
            frames
                .push(((acc >> bits) as u8) & FRAME_DATA_MASK)
                .map_err(|_| SendError::TooLong)?;
            acc &= (1 << bits) - 1;
        }
    }
    if bits > 0 {
        frames
            .push(((acc << (FRAME_DATA_BITS - bits)) as u8) & FRAME_DATA_MASK)
            .map_err(|_| SendError::TooLong)?;
    }
    Ok(frames)
}

/// Unpacks frames back into a payload, checking padding and checksum.
pub fn decode(frames: &[u8]) -> Result<Packet, PacketError> {
    if frames.len() > PACKET_MAX_FRAMES {
        return Err(PacketError::TooLong);
    }

    let mut wire: Vec<u8, { PACKET_MAX_LEN + 1 }> = Vec::new();
    let mut acc: u16 = 0;
    let mut bits = 0usize;
    for &frame in frames {
        acc = (acc << FRAME_DATA_BITS) | u16::from(frame & FRAME_DATA_MASK);
        bits += FRAME_DATA_BITS;
        if bits >= 8 {
            bits -= 8;
            wire
                .push((acc >> bits) as u8)
                .map_err(|_| PacketError::TooLong)?;
            acc &= (1 << bits) - 1;
        }
    }
    if bits >= FRAME_DATA_BITS || acc != 0 {
        return Err(PacketError::Padding);
    }

    let Some((&sum, payload)) = wire.split_last() else {
        return Err(PacketError::Truncated);
    };
    if payload.is_empty() {
        return Err(PacketError::Truncated);
    }
    if checksum(payload) != sum {
        return Err(PacketError::Checksum);
    }
    Packet::from_slice(payload).map_err(|_| PacketError::TooLong)
}

/// Collects frames on one face until the face goes quiet.
#[derive(Debug, Default)]
pub struct PacketAssembler {
    frames: Frames,
    error: Option<PacketError>,
    /// Quiet sample windows since the last frame or frame error.
    idle: u8,
    /// At least one frame (or frame error) since the last packet.
    active: bool,
}

impl PacketAssembler {
    /// Creates an empty assembler.
    pub const fn new() -> Self {
        Self {
            frames: Vec::new(),
            error: None,
            idle: 0,
            active: false,
        }
    }

    /// `true` if part of a packet has been received.
    pub fn has_partial(&self) -> bool {
        self.active
    }

    /// Adds the outcome of one frame to the current packet.
    ///
    /// A frame error poisons the whole packet.
    pub fn push(&mut self, frame: Result<u8, RxError>) {
        self.active = true;
        self.idle = 0;
        match frame {
            Ok(data) => {
                if self.frames.push(data).is_err() {
                    self.poison(PacketError::TooLong);
                }
            }
            Err(_) => self.poison(PacketError::Corrupted),
        }
    }

    /// Keeps the first error seen for the current packet.
    fn poison(&mut self, error: PacketError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Advances by one sample window.
    ///
    /// Once `idle_windows` quiet windows have passed since the last frame,
    /// returns the finished packet (or why it was rejected) and starts over.
    pub fn tick(&mut self, receiving: bool, idle_windows: u8) -> Option<Result<Packet, PacketError>> {
        if !self.active {
            return None;
        }
        if receiving {
            self.idle = 0;
            return None;
        }
        self.idle = self.idle.saturating_add(1);
        if self.idle < idle_windows {
            return None;
        }

        let result = match self.error {
            Some(error) => Err(error),
            None => decode(&self.frames),
        };
        self.clear();
        Some(result)
    }

    /// Forgets the packet in progress.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.error = None;
        self.idle = 0;
        self.active = false;
    }
}
