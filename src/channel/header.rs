//! The optional header byte of a face packet and the special packets that
//! share its first byte.

use crate::consts::{FORCE_SLEEP_PACKET, NOP_WAKE_PACKET};

/// The optional second byte of a face packet.
///
/// ```text
///   7    6    5  4  3    2  1  0
/// | NS | PS | ack      | sequence |
/// ```
///
/// - `sequence`: sequence number of the datagram carried by this packet.
/// - `ack`: sequence number of the last datagram accepted from the neighbor.
/// - `PS`: the sender saw user activity; postpone sleep.
/// - `NS`: always set on a normal header. Special packets have it clear.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Header(u8);

impl Header {
    const SEQUENCE_MASK: u8 = 0b0000_0111;
    const ACK_SHIFT: u8 = 3;
    const POSTPONE_SLEEP: u8 = 0b0100_0000;
    const NON_SPECIAL: u8 = 0b1000_0000;

    /// Wraps a raw header byte.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw header byte.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Sequence number of the carried datagram.
    pub const fn sequence(self) -> u8 {
        self.0 & Self::SEQUENCE_MASK
    }

    /// Sets the sequence number (low three bits of `sequence`).
    pub fn set_sequence(&mut self, sequence: u8) {
        self.0 = (self.0 & !Self::SEQUENCE_MASK) | (sequence & Self::SEQUENCE_MASK);
    }

    /// Sequence number of the last datagram accepted from the other side.
    pub const fn ack_sequence(self) -> u8 {
        (self.0 >> Self::ACK_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Sets the acknowledged sequence number (low three bits of `sequence`).
    pub fn set_ack_sequence(&mut self, sequence: u8) {
        self.0 = (self.0 & !(Self::SEQUENCE_MASK << Self::ACK_SHIFT))
            | ((sequence & Self::SEQUENCE_MASK) << Self::ACK_SHIFT);
    }

    /// Postpone-sleep flag.
    pub const fn postpone_sleep(self) -> bool {
        self.0 & Self::POSTPONE_SLEEP != 0
    }

    /// Sets or clears the postpone-sleep flag.
    pub fn set_postpone_sleep(&mut self, on: bool) {
        self.set_flag(Self::POSTPONE_SLEEP, on);
    }

    /// Marks a normal (not special) header.
    pub const fn non_special(self) -> bool {
        self.0 & Self::NON_SPECIAL != 0
    }

    /// Sets or clears the non-special flag.
    pub fn set_non_special(&mut self, on: bool) {
        self.set_flag(Self::NON_SPECIAL, on);
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Sequence number following `sequence`: cycles 1 to 7, never 0.
///
/// Zero is left for "nothing received yet", which is where every
/// acknowledgement starts.
pub const fn next_sequence(sequence: u8) -> u8 {
    (sequence % 7) + 1
}

/// Two-byte packets reserved for sleep coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SpecialPacket {
    /// Puts the receiving tile to sleep.
    ForceSleep,
    /// Wakes a sleeping tile; otherwise ignored.
    NopWake,
}

impl SpecialPacket {
    /// Recognises a special packet by its exact bytes.
    ///
    /// Only two-byte packets whose second byte would not be a valid header
    /// can be special.
    pub fn parse(packet: &[u8]) -> Option<Self> {
        let [first, second] = *packet else {
            return None;
        };
        if Header::from_bits(second).non_special() {
            return None;
        }
        match [first, second] {
            FORCE_SLEEP_PACKET => Some(SpecialPacket::ForceSleep),
            NOP_WAKE_PACKET => Some(SpecialPacket::NopWake),
            _ => None,
        }
    }

    /// Bytes on the wire.
    pub const fn bytes(self) -> [u8; 2] {
        match self {
            SpecialPacket::ForceSleep => FORCE_SLEEP_PACKET,
            SpecialPacket::NopWake => NOP_WAKE_PACKET,
        }
    }
}
