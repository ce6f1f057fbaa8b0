//! Physical layer: IR pulse timing to parity-checked 7-bit frames and back.
//!
//! Every face is sampled once per window. A window is either lit (at least
//! one pulse arrived since the last sample) or dark. Symbols are recognised
//! by the pattern of lit windows followed by the dark gap that separates
//! symbols:
//!
//! | Symbol | Flashes                  | Sample pattern (newest right) |
//! |--------|--------------------------|-------------------------------|
//! | 0-bit  | 1                        | `00100`                       |
//! | 1-bit  | 2, 640 µs apart          | `001100` or `0010100`         |
//! | sync   | 4, 384 µs apart          | 3 of the last 4 lit           |
//!
//! A frame is a sync followed by seven data bits (MSB first) and a parity
//! bit. The parity bit is set when the data has an odd number of ones.
//!
//! See [`rx::RxState`] for the per-face decoder and [`tx::Emitter`] for the
//! per-face flash scheduler.

pub mod rx;
pub mod tx;

pub use rx::RxState;
pub use tx::Emitter;

use crate::consts::FRAME_DATA_MASK;

/// One transmitted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Symbol {
    /// Data bit `0`.
    Zero,
    /// Data bit `1`.
    One,
    /// Start of frame.
    Sync,
}

impl Symbol {
    /// Symbol for a data bit.
    pub const fn from_bit(bit: bool) -> Self {
        if bit { Symbol::One } else { Symbol::Zero }
    }
}

/// Parity bit for the seven data bits of `data`.
///
/// `true` when the data holds an odd number of ones.
pub const fn parity(data: u8) -> bool {
    (data & FRAME_DATA_MASK).count_ones() % 2 == 1
}

/// Matches the tail of a face's sample history against the symbol patterns.
///
/// The checks run in a fixed order; the data-bit patterns all end in a dark
/// window while sync needs the newest window lit, so at most one can match.
pub const fn classify(bitstream: u8) -> Option<Symbol> {
    if bitstream & 0b1_1111 == 0b0_0100 {
        Some(Symbol::Zero)
    } else if bitstream & 0b11_1111 == 0b00_1100 || bitstream & 0b111_1111 == 0b001_0100 {
        Some(Symbol::One)
    } else if bitstream & 1 == 1 && (bitstream & 0b1111).count_ones() >= 3 {
        Some(Symbol::Sync)
    } else {
        None
    }
}
