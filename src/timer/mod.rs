//! Timer and tick-loop utilities for the IR port.
//!
//! [`IrPort::tick`](crate::port::IrPort::tick) has to run once per 128 µs
//! tick. This module helps to get it there in one of two ways: an interrupt
//! service routine sharing the port through `critical_section` (`timer-isr`
//! feature), or a busy loop over a delay provider (`delay-loop` feature).
//!
//! Contains:
//! - `compute_ocr_value`: runtime compare-match calculator
//! - `const_ocr_value`: compile-time compare-match calculator
//! - `tick_us`: the tick a given compare-match value actually produces
//! - `run_ir_tick_loop`: blocking port loop over `DelayNs` (feature `delay-loop`)
//! - `global_ir_timer_tick` and `tick_ir_timer!()`: interrupt-based tick
//!   callback wrappers (feature `timer-isr`)
//!
//! Compare-match values for a 128 µs tick (CTC mode):
//!
//! | F_CPU  | PRESCALER | OCR |
//! |--------|-----------|-----|
//! | 16 MHz |         8 | 256 |
//! | 16 MHz |        64 |  32 |
//! |  8 MHz |         8 | 128 |
//! |  8 MHz |        64 |  16 |

use libm::round;

use crate::consts::IR_TICK_US;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// 1,000,000 microseconds = 1 second
pub const MICROSECONDS_PER_SECOND: u32 = 1_000_000;

/// Computes the compare-match value for a timer in CTC mode.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 8, 64, 256)
/// - `tick_us`: desired tick interval in microseconds (e.g., 128.0)
///
/// # Returns
/// - Timer counts per tick, rounded to the nearest integer. Subtract one for
///   timers that count from zero to OCR inclusive.
pub fn compute_ocr_value(f_cpu: u32, prescaler: u32, tick_us: f32) -> u16 {
    let counts_per_second = f_cpu as f32 / prescaler as f32;
    let counts = counts_per_second * (tick_us / MICROSECONDS_PER_SECOND as f32);
    round(counts as f64) as u16
}

/// Compile-time compare-match calculator for a whole number of microseconds.
///
/// Same as [`compute_ocr_value`], but truncates instead of rounding.
pub const fn const_ocr_value(f_cpu: u32, prescaler: u32, tick_us: u32) -> u16 {
    let counts = (f_cpu / prescaler) as u64 * tick_us as u64 / MICROSECONDS_PER_SECOND as u64;
    counts as u16
}

/// Compare-match value for the default tick.
pub const fn tick_ocr_value(f_cpu: u32, prescaler: u32) -> u16 {
    const_ocr_value(f_cpu, prescaler, IR_TICK_US as u32)
}

/// The tick interval, in whole microseconds, that `ocr` timer counts produce.
///
/// Use it for [`PortConfig::tick_us`](crate::config::PortConfig::tick_us)
/// when the timer cannot hit the default tick exactly.
pub fn tick_us(f_cpu: u32, prescaler: u32, ocr: u16) -> u16 {
    let seconds = f64::from(ocr) * f64::from(prescaler) / f64::from(f_cpu);
    round(seconds * f64::from(MICROSECONDS_PER_SECOND)) as u16
}
