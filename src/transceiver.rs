//! Access to the IR LEDs.
//!
//! The stack never touches hardware directly. Everything goes through
//! [`IrTransceiver`], which can be implemented over real pins (see
//! [`LedTransceiver`]) or over a simulated medium in tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::consts::{FACE_COUNT, IR_PULSE_WIDTH_US};

/// Bitmask of faces, bit `n` for face `n`.
pub type FaceMask = u8;

/// Returns the mask with only `face` set.
pub const fn face_bit(face: usize) -> FaceMask {
    1 << face
}

/// The two things the stack needs from the IR hardware.
pub trait IrTransceiver {
    /// Reports which faces saw light since the previous call, and re-arms
    /// every face for the next window.
    fn sample(&mut self) -> FaceMask;

    /// Flashes every face in `faces` once.
    ///
    /// Called from the tick interrupt at most once per tick, and must return
    /// well within a tick. The flash itself should be a few microseconds
    /// long; a flash reaching across a sample instant lights two windows.
    fn flash(&mut self, faces: FaceMask);
}

/// [`IrTransceiver`] over one GPIO per LED.
///
/// Each LED doubles as a light sensor: driving the pin high charges the
/// LED's junction capacitance, and light arriving afterwards discharges it
/// so the pin reads low at the next sample. Driving the pin low flashes
/// the LED.
///
/// `flash` holds the pins low for [`IR_PULSE_WIDTH_US`] using the provided
/// delay, which is the only time the tick interrupt waits.
#[derive(Debug)]
pub struct LedTransceiver<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pins: [P; FACE_COUNT],
    delay: D,
}

impl<P, D> LedTransceiver<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// Takes ownership of the LED pins (indexed by face) and a delay.
    ///
    /// Every pin is driven high so that the first window starts charged.
    pub fn new(pins: [P; FACE_COUNT], delay: D) -> Self {
        let mut transceiver = Self { pins, delay };
        for pin in transceiver.pins.iter_mut() {
            let _ = pin.set_high();
        }
        transceiver
    }

    /// Gives the pins and the delay back.
    pub fn release(self) -> ([P; FACE_COUNT], D) {
        (self.pins, self.delay)
    }

    fn write_faces(&mut self, faces: FaceMask, high: bool) {
        for (face, pin) in self.pins.iter_mut().enumerate() {
            if faces & face_bit(face) == 0 {
                continue;
            }
            let _ = if high { pin.set_high() } else { pin.set_low() };
        }
    }
}

impl<P, D> IrTransceiver for LedTransceiver<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn sample(&mut self) -> FaceMask {
        let mut seen = 0;
        for (face, pin) in self.pins.iter_mut().enumerate() {
            // A pin we cannot read counts as dark.
            if pin.is_low().unwrap_or(false) {
                seen |= face_bit(face);
            }
            let _ = pin.set_high();
        }
        seen
    }

    fn flash(&mut self, faces: FaceMask) {
        if faces == 0 {
            return;
        }
        self.write_faces(faces, false);
        self.delay.delay_us(u32::from(IR_PULSE_WIDTH_US));
        self.write_faces(faces, true);
    }
}
