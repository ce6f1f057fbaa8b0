//! The interrupt side of the IR stack.
//!
//! [`IrPort`] owns the transceiver and everything that has to happen on every
//! tick: sampling and decoding each face once per window, assembling packets,
//! flashing every face that is due and keeping the millisecond clock.
//!
//! The port does not care where [`tick()`](IrPort::tick) is called from, as
//! long as it is called once every [`PortConfig::tick_us`]. No tick waits for
//! anything longer than one flash. To share a port between a timer
//! interrupt and the main loop, store it in a [`SharedIrPort`].
//!
//! ## Example
//!
//! ```rust
//! # use hexir::transceiver::{FaceMask, IrTransceiver};
//! # struct Dark;
//! # impl IrTransceiver for Dark {
//! #     fn sample(&mut self) -> FaceMask { 0 }
//! #     fn flash(&mut self, _: FaceMask) {}
//! # }
//! use hexir::config::PortConfig;
//! use hexir::port::IrPort;
//!
//! let mut port = IrPort::new(Dark, PortConfig::new());
//! port.send_packet(2, &[5]).unwrap();
//! for _ in 0..1000 {
//!     port.tick(); // every 128 µs
//! }
//! assert_eq!(port.millis(), 128);
//! ```

use core::cell::RefCell;
use core::convert::Infallible;

use critical_section::Mutex;

use crate::config::{Framing, PortConfig};
use crate::consts::{ALL_FACES, FACE_COUNT, TICKS_PER_WINDOW};
use crate::error::{ErrorBits, ErrorCounts, RxError, SendError};
use crate::packet::{Packet, PacketAssembler, encode};
use crate::phy::{Emitter, RxState};
use crate::time::{Clock, Millis};
use crate::transceiver::{FaceMask, IrTransceiver, face_bit};

/// Link counters since the port was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PortStats {
    /// Packets received intact (or frames, with raw framing).
    pub rx_good: u16,
    /// Packets (or frames) received and discarded.
    pub rx_bad: u16,
    /// Packets (or frames) sent in full.
    pub tx_good: u16,
}

/// IR stack state that lives in interrupt context.
///
/// Faces are numbered `0..FACE_COUNT`; methods taking a face index panic if
/// it is out of range.
#[derive(Debug)]
pub struct IrPort<T: IrTransceiver> {
    transceiver: T,
    config: PortConfig,
    rx: [RxState; FACE_COUNT],
    assemblers: [PacketAssembler; FACE_COUNT],
    inbox: [Option<Packet>; FACE_COUNT],
    emitters: [Emitter; FACE_COUNT],
    /// Faces that decoded a good frame since last asked.
    activity: FaceMask,
    /// Ticks until the next sample.
    sample_countdown: u8,
    /// Microseconds not yet folded into `millis`.
    micros: u32,
    millis: Millis,
    stats: PortStats,
}

impl<T: IrTransceiver> IrPort<T> {
    /// Creates a port with every face idle and the clock at zero.
    pub fn new(transceiver: T, config: PortConfig) -> Self {
        Self {
            transceiver,
            config,
            rx: [RxState::new(); FACE_COUNT],
            assemblers: core::array::from_fn(|_| PacketAssembler::new()),
            inbox: Default::default(),
            emitters: core::array::from_fn(|_| Emitter::new()),
            activity: 0,
            sample_countdown: 0,
            micros: 0,
            millis: 0,
            stats: PortStats::default(),
        }
    }

    /// Settings the port was created with.
    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// The transceiver.
    pub fn transceiver(&self) -> &T {
        &self.transceiver
    }

    /// The transceiver, mutably.
    pub fn transceiver_mut(&mut self) -> &mut T {
        &mut self.transceiver
    }

    /// Consumes the port, giving the transceiver back.
    pub fn release(self) -> T {
        self.transceiver
    }

    /// Advances the whole port by one tick.
    ///
    /// Must be called once every [`PortConfig::tick_us`] microseconds. On
    /// every [`TICKS_PER_WINDOW`]-th tick samples every face and runs the
    /// decoders; on every tick flashes the faces that are due and advances
    /// the clock.
    pub fn tick(&mut self) {
        if self.sample_countdown == 0 {
            self.sample_countdown = TICKS_PER_WINDOW;
            let seen = self.transceiver.sample();
            for face in 0..FACE_COUNT {
                self.receive(face, seen & face_bit(face) != 0);
            }
        }
        self.sample_countdown -= 1;
        self.transmit();

        self.micros += u32::from(self.config.tick_us);
        while self.micros >= 1000 {
            self.micros -= 1000;
            self.millis = self.millis.wrapping_add(1);
        }
    }

    fn receive(&mut self, face: usize, lit: bool) {
        if let Some(frame) = self.rx[face].sample(lit) {
            if frame.is_ok() {
                self.activity |= face_bit(face);
            }
            match (self.config.framing, frame) {
                (Framing::Packets, frame) => self.assemblers[face].push(frame),
                (Framing::RawBytes, Ok(data)) => {
                    self.rx[face].store(data);
                    self.stats.rx_good = self.stats.rx_good.saturating_add(1);
                }
                (Framing::RawBytes, Err(_)) => {
                    self.stats.rx_bad = self.stats.rx_bad.saturating_add(1);
                }
            }
        }

        if self.config.framing != Framing::Packets {
            return;
        }
        let receiving = self.rx[face].is_receiving();
        match self.assemblers[face].tick(receiving, self.config.packet_idle_windows) {
            Some(Ok(packet)) => {
                self.stats.rx_good = self.stats.rx_good.saturating_add(1);
                if self.inbox[face].is_some() {
                    debug!("face {}: inbox full, packet dropped", face);
                    self.rx[face].record(RxError::Overflow);
                } else {
                    trace!("face {}: packet of {} bytes", face, packet.len());
                    self.inbox[face] = Some(packet);
                }
            }
            Some(Err(error)) => {
                debug!("face {}: packet dropped: {}", face, error);
                self.stats.rx_bad = self.stats.rx_bad.saturating_add(1);
            }
            None => {}
        }
    }

    fn transmit(&mut self) {
        let mut faces = 0;
        for (face, emitter) in self.emitters.iter_mut().enumerate() {
            let was_busy = emitter.is_busy();
            if emitter.tick() {
                faces |= face_bit(face);
            }
            if was_busy && !emitter.is_busy() {
                self.stats.tx_good = self.stats.tx_good.saturating_add(1);
            }
        }
        // every face due on this tick flashes at once
        if faces != 0 {
            self.transceiver.flash(faces);
        }
    }

    /// Milliseconds since the port was created.
    pub fn millis(&self) -> Millis {
        self.millis
    }

    /// Non-blocking read of the last raw frame on `face`.
    ///
    /// Only produces values with [`Framing::RawBytes`].
    pub fn read_byte(&mut self, face: usize) -> nb::Result<u8, Infallible> {
        self.rx[face].take().ok_or(nb::Error::WouldBlock)
    }

    /// Queues a single raw frame (low seven bits of `value`) on every face in `faces`.
    ///
    /// Returns `false`, queuing nothing, if any of those faces is still sending.
    pub fn send_byte(&mut self, faces: FaceMask, value: u8) -> bool {
        let faces = faces & ALL_FACES;
        let busy = (0..FACE_COUNT)
            .any(|face| faces & face_bit(face) != 0 && self.emitters[face].is_busy());
        if busy {
            return false;
        }
        for face in 0..FACE_COUNT {
            if faces & face_bit(face) != 0 {
                let _ = self.emitters[face].load(&[value], 0);
            }
        }
        true
    }

    /// Queues a packet on `face`.
    ///
    /// Refused with [`SendError::Busy`] while the face is sending, or is in
    /// the middle of receiving something, so that two neighbors do not keep
    /// talking over each other.
    pub fn send_packet(&mut self, face: usize, payload: &[u8]) -> Result<(), SendError> {
        if self.is_transmitting(face) || self.is_receiving(face) {
            return Err(SendError::Busy);
        }
        let frames = encode(payload)?;
        let gap_ticks = u16::from(self.config.packet_gap_windows) * u16::from(TICKS_PER_WINDOW);
        if self.emitters[face].load(&frames, gap_ticks) {
            Ok(())
        } else {
            Err(SendError::Busy)
        }
    }

    /// Takes the packet waiting on `face`, if any.
    pub fn take_packet(&mut self, face: usize) -> Option<Packet> {
        self.inbox[face].take()
    }

    /// `true` if `face` decoded a good frame since the last call.
    pub fn take_activity(&mut self, face: usize) -> bool {
        let bit = face_bit(face);
        let seen = self.activity & bit != 0;
        self.activity &= !bit;
        seen
    }

    /// Drops every waiting and partially received packet.
    pub fn discard_packets(&mut self) {
        for face in 0..FACE_COUNT {
            self.inbox[face] = None;
            self.assemblers[face].clear();
            let _ = self.rx[face].take();
        }
        self.activity = 0;
    }

    /// `true` while `face` is inside a frame or holds part of a packet.
    pub fn is_receiving(&self, face: usize) -> bool {
        self.rx[face].is_receiving() || self.assemblers[face].has_partial()
    }

    /// `true` while `face` has bursts or a trailing gap left to send.
    pub fn is_transmitting(&self, face: usize) -> bool {
        self.emitters[face].is_busy()
    }

    /// Returns and clears the receive error flags of `face`.
    pub fn take_error_bits(&mut self, face: usize) -> ErrorBits {
        self.rx[face].take_error_bits()
    }

    /// Returns and clears the receive error counters of `face`.
    pub fn take_error_counts(&mut self, face: usize) -> ErrorCounts {
        self.rx[face].take_error_counts()
    }

    /// Link counters.
    pub fn stats(&self) -> PortStats {
        self.stats
    }
}

impl<T: IrTransceiver> Clock for IrPort<T> {
    fn millis(&self) -> Millis {
        self.millis
    }
}

/// An [`IrPort`] shared between the sampling interrupt and the main loop.
///
/// ```rust,ignore
/// static PORT: SharedIrPort<Leds> = SharedIrPort::new();
///
/// fn main() {
///     PORT.install(IrPort::new(leds, PortConfig::new()));
/// }
///
/// #[interrupt]
/// fn TIMER() {
///     PORT.tick();
/// }
/// ```
pub struct SharedIrPort<T: IrTransceiver> {
    inner: Mutex<RefCell<Option<IrPort<T>>>>,
}

impl<T: IrTransceiver> SharedIrPort<T> {
    /// Creates an empty slot, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Stores `port`, returning the one it replaces.
    pub fn install(&self, port: IrPort<T>) -> Option<IrPort<T>> {
        critical_section::with(|cs| self.inner.borrow(cs).replace(Some(port)))
    }

    /// Removes the port.
    pub fn take(&self) -> Option<IrPort<T>> {
        critical_section::with(|cs| self.inner.borrow(cs).take())
    }

    /// Ticks the port if one is installed. Call from the sampling interrupt.
    pub fn tick(&self) {
        let _ = self.with(|port| port.tick());
    }

    /// Runs `f` on the port inside a critical section.
    ///
    /// Returns `None` if no port is installed.
    pub fn with<R>(&self, f: impl FnOnce(&mut IrPort<T>) -> R) -> Option<R> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().as_mut().map(f))
    }
}

impl<T: IrTransceiver> Default for SharedIrPort<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: IrTransceiver> core::fmt::Debug for SharedIrPort<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedIrPort").finish_non_exhaustive()
    }
}

impl<T: IrTransceiver> Clock for SharedIrPort<T> {
    fn millis(&self) -> Millis {
        self.with(|port| port.millis()).unwrap_or(0)
    }
}
