//! Per-face flash scheduler.
//!
//! Frames are sent one symbol at a time and every symbol is a handful of
//! flashes placed on ticks (four ticks to a sample window). The port asks
//! each [`Emitter`] once per tick whether its face flashes, so no flash ever
//! waits inside the interrupt:
//!
//! | Symbol | Flashes | Spacing (ticks) | Ticks to next symbol |
//! |--------|---------|-----------------|----------------------|
//! | sync   | 4       | 3               | 9 + 16               |
//! | 0-bit  | 1       | -               | 16                   |
//! | 1-bit  | 2       | 5               | 5 + 16               |
//!
//! With 128 µs ticks and 512 µs windows the receiver sees every symbol as
//! one of its sample patterns, followed by two to four dark windows, for any
//! phase between the two timers and up to 10% difference in their rates.

use heapless::Vec;

use crate::consts::{
    ONE_FLASH_SPACING_TICKS, PACKET_MAX_FRAMES, SYMBOL_GAP_TICKS, SYNC_FLASH_SPACING_TICKS,
    SYNC_PULSE_COUNT,
};
use crate::phy::{Symbol, parity};

/// Number of symbols in a frame: sync, seven data bits, parity.
const SYMBOLS_PER_FRAME: u8 = 9;

impl Symbol {
    /// Number of flashes making up this symbol.
    pub const fn flash_count(self) -> u8 {
        match self {
            Symbol::Sync => SYNC_PULSE_COUNT,
            Symbol::Zero => 1,
            Symbol::One => 2,
        }
    }

    /// Ticks between two flashes of this symbol.
    pub const fn flash_spacing_ticks(self) -> u8 {
        match self {
            Symbol::Sync => SYNC_FLASH_SPACING_TICKS,
            Symbol::Zero => 0,
            Symbol::One => ONE_FLASH_SPACING_TICKS,
        }
    }

    /// Ticks from the first flash of this symbol to the first flash of the next.
    pub const fn slot_ticks(self) -> u16 {
        (self.flash_count() as u16 - 1) * self.flash_spacing_ticks() as u16
            + SYMBOL_GAP_TICKS as u16
    }
}

/// Transmit state for one face.
#[derive(Debug, Default)]
pub struct Emitter {
    /// Queued 7-bit frames. Emptied when the last symbol starts.
    frames: Vec<u8, PACKET_MAX_FRAMES>,
    /// Frame currently being sent.
    frame_index: usize,
    /// Next symbol of the current frame: 0 is the sync, 8 the parity bit.
    symbol: u8,
    /// Symbol whose flashes are going out.
    current: Option<Symbol>,
    /// Flashes of `current` still to come.
    flashes_left: u8,
    /// Silent ticks left before the next flash.
    countdown: u16,
    /// Silent ticks appended after the last frame.
    gap_ticks: u16,
    /// Trailing gap, armed once the last symbol has started.
    tail: u16,
}

impl Emitter {
    /// Creates an idle emitter.
    pub const fn new() -> Self {
        Self {
            frames: Vec::new(),
            frame_index: 0,
            symbol: 0,
            current: None,
            flashes_left: 0,
            countdown: 0,
            gap_ticks: 0,
            tail: 0,
        }
    }

    /// `true` while anything is left to send, trailing gap included.
    pub fn is_busy(&self) -> bool {
        !self.frames.is_empty() || self.flashes_left > 0 || self.countdown > 0
    }

    /// Queues `frames` (low seven bits of each byte) followed by `gap_ticks`
    /// silent ticks.
    ///
    /// Returns `false` without queuing anything if the emitter is busy, or
    /// `frames` is empty or too long.
    pub fn load(&mut self, frames: &[u8], gap_ticks: u16) -> bool {
        if self.is_busy() || frames.is_empty() {
            return false;
        }
        if self.frames.extend_from_slice(frames).is_err() {
            return false;
        }
        self.frame_index = 0;
        self.symbol = 0;
        self.gap_ticks = gap_ticks;
        true
    }

    /// Drops everything queued, including the trailing gap.
    pub fn cancel(&mut self) {
        self.frames.clear();
        self.frame_index = 0;
        self.symbol = 0;
        self.current = None;
        self.flashes_left = 0;
        self.countdown = 0;
        self.tail = 0;
    }

    /// Advances by one tick. Returns `true` if the face flashes on this tick.
    pub fn tick(&mut self) -> bool {
        if self.countdown > 0 {
            self.countdown -= 1;
            return false;
        }
        if self.flashes_left == 0 && !self.start_symbol() {
            return false;
        }
        let Some(symbol) = self.current else {
            return false;
        };

        self.flashes_left -= 1;
        self.countdown = if self.flashes_left > 0 {
            u16::from(symbol.flash_spacing_ticks()) - 1
        } else {
            self.current = None;
            u16::from(SYMBOL_GAP_TICKS) - 1 + core::mem::take(&mut self.tail)
        };
        true
    }

    fn start_symbol(&mut self) -> bool {
        let Some(&data) = self.frames.get(self.frame_index) else {
            return false;
        };
        let symbol = match self.symbol {
            0 => Symbol::Sync,
            8 => Symbol::from_bit(parity(data)),
            n => Symbol::from_bit(data & (1 << (7 - n)) != 0),
        };
        self.symbol += 1;
        if self.symbol == SYMBOLS_PER_FRAME {
            self.symbol = 0;
            self.frame_index += 1;
            if self.frame_index == self.frames.len() {
                self.frames.clear();
                self.frame_index = 0;
                self.tail = self.gap_ticks;
            }
        }
        self.current = Some(symbol);
        self.flashes_left = symbol.flash_count();
        true
    }
}
