//! Error types for every layer of the IR stack.
//!
//! Nothing in the stack panics on bad input from the outside world. Receive
//! errors are recovered locally and only surface as read-and-clear
//! diagnostics; send errors are returned to the caller.

use thiserror::Error;

/// Why a frame was discarded by the receiver.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RxError {
    /// A decoded value was replaced before anyone read it.
    #[error("received value overwritten before it was read")]
    Overflow,
    /// The parity bit did not match the seven data bits.
    #[error("parity mismatch")]
    Parity,
    /// The light went away in the middle of a frame.
    #[error("signal dropped out mid-frame")]
    Dropout,
    /// Too many flashes to be a valid symbol.
    #[error("noise mid-frame")]
    Noise,
}

impl RxError {
    /// Every kind, in bit order.
    pub const ALL: [RxError; 4] = [
        RxError::Overflow,
        RxError::Parity,
        RxError::Dropout,
        RxError::Noise,
    ];

    /// Bit used for this kind in [`ErrorBits`].
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Set of [`RxError`] kinds seen since the flags were last taken.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ErrorBits(u8);

impl ErrorBits {
    /// No errors.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw flag byte. Overflow is bit 0, parity bit 1, dropout bit 2, noise bit 3.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` if no error was recorded.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` if `error` was recorded.
    pub const fn contains(self, error: RxError) -> bool {
        self.0 & error.bit() != 0
    }

    /// Records `error`.
    pub fn insert(&mut self, error: RxError) {
        self.0 |= error.bit();
    }
}

/// Number of errors of each kind seen since the counters were last taken.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ErrorCounts {
    /// Values overwritten before they were read.
    pub overflow: u16,
    /// Frames with a bad parity bit.
    pub parity: u16,
    /// Frames cut short by missing light.
    pub dropout: u16,
    /// Frames aborted by noise.
    pub noise: u16,
}

impl ErrorCounts {
    /// Bumps the counter for `error`, saturating.
    pub fn record(&mut self, error: RxError) {
        let counter = match error {
            RxError::Overflow => &mut self.overflow,
            RxError::Parity => &mut self.parity,
            RxError::Dropout => &mut self.dropout,
            RxError::Noise => &mut self.noise,
        };
        *counter = counter.saturating_add(1);
    }

    /// Sum over every kind.
    pub fn total(&self) -> u32 {
        u32::from(self.overflow)
            + u32::from(self.parity)
            + u32::from(self.dropout)
            + u32::from(self.noise)
    }
}

/// Why a run of frames could not be turned into a packet.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PacketError {
    /// A frame inside the packet failed to decode.
    #[error("frame error inside packet")]
    Corrupted,
    /// Too few frames to hold a byte and its checksum.
    #[error("packet truncated")]
    Truncated,
    /// Bits left over after the last whole byte were not zero.
    #[error("non-zero padding")]
    Padding,
    /// The trailing checksum did not match.
    #[error("checksum mismatch")]
    Checksum,
    /// More frames than the largest packet needs.
    #[error("packet too long")]
    TooLong,
}

/// Why a packet or byte could not be queued for sending.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SendError {
    /// The face is still sending, or is in the middle of receiving.
    #[error("face busy")]
    Busy,
    /// Nothing to send.
    #[error("empty packet")]
    Empty,
    /// Longer than the largest packet.
    #[error("packet too long")]
    TooLong,
}

/// Why a datagram was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum DatagramError {
    /// The previous datagram on this face has not been acknowledged yet.
    #[error("datagram already pending")]
    Pending,
    /// Zero-length datagram.
    #[error("empty datagram")]
    Empty,
    /// Longer than a datagram slot.
    #[error("datagram too long")]
    TooLong,
    /// Starts with a byte reserved for the sleep and wake packets.
    #[error("datagram starts with a reserved value")]
    Reserved,
}
