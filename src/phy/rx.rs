//! Per-face frame decoder.
//!
//! [`RxState`] is fed one sample per window and rebuilds frames from the
//! sample history. It keeps no timing state beyond the last eight samples.

use crate::consts::{FRAME_DATA_MASK, FRAME_SENTINEL, VALUE_PRESENT};
use crate::error::{ErrorBits, ErrorCounts, RxError};
use crate::phy::{Symbol, classify, parity};

/// Receive state for one face.
#[derive(Debug, Default, Clone, Copy)]
pub struct RxState {
    /// Most recent samples, newest in bit 0.
    bitstream: u8,
    /// Frame being assembled, behind a sentinel bit. Zero while searching for sync.
    input_buffer: u8,
    /// Last decoded value with [`VALUE_PRESENT`] set, or zero.
    last_value: u8,
    error_bits: ErrorBits,
    error_counts: ErrorCounts,
}

impl RxState {
    /// Creates a decoder that is searching for sync.
    pub const fn new() -> Self {
        Self {
            bitstream: 0,
            input_buffer: 0,
            last_value: 0,
            error_bits: ErrorBits::empty(),
            error_counts: ErrorCounts {
                overflow: 0,
                parity: 0,
                dropout: 0,
                noise: 0,
            },
        }
    }

    /// Shifts in one sample and advances the decoder.
    ///
    /// Returns the seven data bits when a frame completes with good parity,
    /// or the error that made the decoder give up on the current frame.
    /// Errors are also recorded in the diagnostics.
    pub fn sample(&mut self, lit: bool) -> Option<Result<u8, RxError>> {
        self.bitstream = (self.bitstream << 1) | u8::from(lit);

        match classify(self.bitstream) {
            Some(Symbol::Sync) => {
                self.input_buffer = FRAME_SENTINEL;
                None
            }
            Some(symbol) => {
                if self.input_buffer == 0 {
                    return None;
                }
                let bit = symbol == Symbol::One;
                if self.input_buffer & VALUE_PRESENT == 0 {
                    self.input_buffer = (self.input_buffer << 1) | u8::from(bit);
                    return None;
                }

                // sentinel reached the top: this is the parity bit
                let data = self.input_buffer & FRAME_DATA_MASK;
                self.input_buffer = 0;
                if bit == parity(data) {
                    Some(Ok(data))
                } else {
                    self.record(RxError::Parity);
                    Some(Err(RxError::Parity))
                }
            }
            None => {
                if self.input_buffer == 0 {
                    return None;
                }
                let error = match self.bitstream & 0b1_1111 {
                    0b0_0000 => RxError::Dropout,
                    0b1_0101 => RxError::Noise,
                    _ => return None,
                };
                self.input_buffer = 0;
                self.record(error);
                Some(Err(error))
            }
        }
    }

    /// `true` between a sync and the end of its frame.
    pub fn is_receiving(&self) -> bool {
        self.input_buffer != 0
    }

    /// Latches a decoded value for [`take`](RxState::take).
    ///
    /// An unread previous value is overwritten and counted as an overflow.
    pub fn store(&mut self, data: u8) {
        if self.last_value & VALUE_PRESENT != 0 {
            self.record(RxError::Overflow);
        }
        self.last_value = (data & FRAME_DATA_MASK) | VALUE_PRESENT;
    }

    /// Takes the latched value, if any.
    pub fn take(&mut self) -> Option<u8> {
        let value = core::mem::take(&mut self.last_value);
        if value & VALUE_PRESENT != 0 {
            Some(value & FRAME_DATA_MASK)
        } else {
            None
        }
    }

    /// Adds `error` to the diagnostics.
    pub fn record(&mut self, error: RxError) {
        self.error_bits.insert(error);
        self.error_counts.record(error);
    }

    /// Returns and clears the error flags.
    pub fn take_error_bits(&mut self) -> ErrorBits {
        core::mem::take(&mut self.error_bits)
    }

    /// Returns and clears the error counters.
    pub fn take_error_counts(&mut self) -> ErrorCounts {
        core::mem::take(&mut self.error_counts)
    }
}
