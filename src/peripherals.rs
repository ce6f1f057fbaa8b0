//! The rest of the tile, as far as the IR stack is concerned.
//!
//! Rendering and button debouncing live outside this crate. The tile loop
//! only needs to save and restore the face colors around sleep, show a fade
//! while flooding, and see button edges.

pub use smart_leds::RGB8;

use crate::consts::FACE_COUNT;

/// One color per face, double buffered.
pub trait FaceDisplay {
    /// Colors currently in the back buffer.
    fn pixels(&self) -> [RGB8; FACE_COUNT];

    /// Overwrites the back buffer.
    fn set_pixels(&mut self, pixels: &[RGB8; FACE_COUNT]);

    /// Shows the back buffer. Called once per loop iteration.
    fn commit(&mut self);

    /// Sets every face to `color`.
    fn fill(&mut self, color: RGB8) {
        self.set_pixels(&[color; FACE_COUNT]);
    }
}

/// Button events since the previous snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ButtonState {
    /// Held down right now.
    pub down: bool,
    /// Went down.
    pub pressed: bool,
    /// Came up.
    pub released: bool,
    /// A single click completed.
    pub single_clicked: bool,
    /// A double click completed.
    pub double_clicked: bool,
    /// Three or more clicks completed.
    pub multi_clicked: bool,
    /// Number of clicks in the last completed click run.
    pub click_count: u8,
    /// Held past the long-press threshold.
    pub long_pressed: bool,
    /// Held for six seconds.
    pub hold_6s: bool,
}

/// Source of debounced button events.
pub trait Button {
    /// Returns the events since the previous call and clears them.
    fn snapshot(&mut self) -> ButtonState;
}
