//! # hexir
//!
//! A portable, no_std Rust stack for the infrared links between hexagonal
//! game tiles. Each of the six faces carries an IR LED that is used both to
//! send (by flashing) and to receive (by sampling it as a light sensor), so a
//! tile can talk to whichever neighbor is touching each face.
//!
//! The stack is layered:
//! - [`phy`]: pulse-count symbols (sync, 0-bit, 1-bit), 7-bit frames with odd
//!   parity, decoded from one sample per face per 512 µs window
//! - [`packet`] and [`port`]: checksummed packets of up to 18 bytes per face,
//!   driven from a timer interrupt through a `critical-section` mutex
//! - [`channel`]: a one-byte value broadcast on every face, with liveness
//!   tracking and acknowledged datagrams piggybacked on it
//! - [`sleep`] and [`tile`]: network-wide sleep and wake, and the main loop
//!   that ties everything together
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` |
//! | `delay-loop`          | Blocking tick loop over `embedded_hal::delay::DelayNs` |
//! | `timer-isr` (default) | ISR helpers and macros for a global `SharedIrPort` |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hexir::prelude::*;
//!
//! hexir::init_ir_port!(Leds);
//!
//! fn main() -> ! {
//!     hexir::setup_ir_port!(leds);
//!     // start a 128 µs timer interrupt, see `timer::tick_ocr_value`
//!     let mut tile = Tile::new(&IR_PORT, display, button, TileConfig::new());
//!     loop {
//!         tile.run_once(|tile| {
//!             if tile.button().pressed {
//!                 tile.set_outgoing_value_all(1);
//!             }
//!         });
//!     }
//! }
//!
//! #[interrupt]
//! fn TIMER1_COMPA() {
//!     hexir::tick_ir_timer!();
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - `tick()` runs every 128 µs and samples every fourth time, giving a
//!   512 µs window. Tiles keep talking with up to 10% between their clocks.
//! - `tick()` never waits longer than one flash (12 µs with
//!   [`LedTransceiver`](transceiver::LedTransceiver)).
//! - Only one port should be installed per tile.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

#[macro_use]
mod fmt;

pub use critical_section;
pub use heapless;

pub mod channel;
pub(crate) mod checksum;
pub mod config;
pub mod consts;
pub mod error;
pub mod link;
pub mod packet;
pub mod peripherals;
pub mod phy;
pub mod port;
pub mod sleep;
pub mod tile;
pub mod time;
pub mod timer;
pub mod transceiver;

/// The types most firmware needs.
pub mod prelude {
    pub use crate::config::{Framing, PortConfig, TileConfig};
    pub use crate::error::{DatagramError, SendError};
    pub use crate::link::PacketLink;
    pub use crate::peripherals::{Button, ButtonState, FaceDisplay, RGB8};
    pub use crate::port::{IrPort, SharedIrPort};
    pub use crate::sleep::SleepState;
    pub use crate::tile::Tile;
    pub use crate::time::{Clock, Millis, Timer};
    pub use crate::transceiver::{IrTransceiver, LedTransceiver};
}
