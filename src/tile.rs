//! The main-loop driver.
//!
//! [`Tile`] ties the packet link, the face channel, the sleep controller and
//! the tile's display and button together, and runs them in a fixed order
//! once per loop iteration:
//!
//! 1. snapshot the button and the clock,
//! 2. take received packets and update the faces,
//! 3. run the application,
//! 4. commit the display,
//! 5. send on every face that is due.
//!
//! While the tile is going to sleep, asleep or waking up, the application is
//! not run at all.
//!
//! ## Example
//!
//! ```rust,ignore
//! static PORT: SharedIrPort<Leds> = SharedIrPort::new();
//!
//! let mut tile = Tile::new(&PORT, display, button, TileConfig::new());
//! loop {
//!     tile.run_once(|tile| {
//!         let value = tile.incoming_value(0);
//!         tile.set_outgoing_value_all(value.wrapping_add(1));
//!     });
//! }
//! ```

use crate::channel::FaceChannel;
use crate::config::TileConfig;
use crate::consts::FACE_COUNT;
use crate::error::DatagramError;
use crate::link::PacketLink;
use crate::peripherals::{Button, ButtonState, FaceDisplay};
use crate::sleep::{SleepController, SleepState};
use crate::time::{Clock, LoopClock, Millis, Timer};
use crate::transceiver::{FaceMask, face_bit};

/// One tile: link, protocol state and peripherals.
#[derive(Debug)]
pub struct Tile<L, D, B>
where
    L: PacketLink + Clock,
    D: FaceDisplay,
    B: Button,
{
    link: L,
    display: D,
    button: B,
    config: TileConfig,
    channel: FaceChannel,
    sleep: SleepController,
    clock: LoopClock,
    /// Goes to sleep when this runs out.
    inactivity: Timer,
    buttons: ButtonState,
    has_woken: bool,
}

impl<L, D, B> Tile<L, D, B>
where
    L: PacketLink + Clock,
    D: FaceDisplay,
    B: Button,
{
    /// Creates an awake tile with every face expired.
    pub fn new(link: L, display: D, button: B, config: TileConfig) -> Self {
        let mut clock = LoopClock::new();
        let now = clock.update(link.millis());
        let mut inactivity = Timer::new();
        inactivity.set(now, config.sleep_timeout_ms);
        Self {
            link,
            display,
            button,
            config,
            channel: FaceChannel::new(config),
            sleep: SleepController::new(config),
            clock,
            inactivity,
            buttons: ButtonState::default(),
            has_woken: false,
        }
    }

    /// Runs one loop iteration.
    ///
    /// Returns `true` if `app` ran, `false` while the tile is not awake.
    pub fn run_once(&mut self, app: impl FnOnce(&mut Self)) -> bool {
        if !self.sleep.is_active() {
            let raw = self.link.millis();
            if let Some(away) =
                self.sleep
                    .step(&mut self.link, &mut self.display, &mut self.button, raw)
            {
                self.clock.skip(away);
                let now = self.clock.update(raw);
                self.inactivity.set(now, self.config.sleep_timeout_ms);
                self.buttons = ButtonState::default();
                self.has_woken = true;
            }
            return false;
        }

        let now = self.clock.update(self.link.millis());
        self.buttons = self.button.snapshot();
        if self.buttons.hold_6s && self.channel.is_alone(now) {
            self.enter_sleep();
            return false;
        }
        if self.buttons.pressed {
            self.notify_activity();
        }

        let events = self.channel.receive(&mut self.link, now);
        if events.sleep_requested {
            debug!("sleep requested by a neighbor");
            self.enter_sleep();
            return false;
        }
        // flags heard inside the lockout are dropped
        if events.postpone_seen && self.channel.postpone_sleep(now) {
            self.inactivity.set(now, self.config.sleep_timeout_ms);
        }

        app(self);
        self.display.commit();
        if !self.sleep.is_active() {
            return true;
        }
        self.channel.send(&mut self.link, now);

        if self.inactivity.is_expired(now) {
            info!("inactive for {} ms", self.config.sleep_timeout_ms);
            self.enter_sleep();
        }
        true
    }

    /// Loop time in milliseconds. Does not advance while asleep.
    pub fn millis(&self) -> Millis {
        self.clock.now()
    }

    /// Where the tile is in the sleep cycle.
    pub fn sleep_state(&self) -> SleepState {
        self.sleep.state()
    }

    /// Starts putting this tile, and every tile it can reach, to sleep.
    pub fn enter_sleep(&mut self) {
        let raw = self.link.millis();
        self.sleep.enter(&self.display, raw);
    }

    /// Resets the inactivity timer here and on every tile in reach.
    pub fn notify_activity(&mut self) {
        let now = self.clock.now();
        self.inactivity.set(now, self.config.sleep_timeout_ms);
        let _ = self.channel.postpone_sleep(now);
    }

    /// `true` once after every wake-up.
    pub fn has_woken(&mut self) -> bool {
        core::mem::take(&mut self.has_woken)
    }

    /// Button events seen at the start of this iteration.
    pub fn button(&self) -> ButtonState {
        self.buttons
    }

    /// The display.
    pub fn display(&self) -> &D {
        &self.display
    }

    /// The display, for drawing.
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// The packet link.
    pub fn link(&self) -> &L {
        &self.link
    }

    /// The packet link, mutably.
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// The face channel.
    pub fn channel(&self) -> &FaceChannel {
        &self.channel
    }

    /// Sets the value broadcast on `face`.
    pub fn set_outgoing_value(&mut self, face: usize, value: u8) {
        self.channel.set_outgoing_value(face, value);
    }

    /// Sets the value broadcast on every face.
    pub fn set_outgoing_value_all(&mut self, value: u8) {
        self.channel.set_outgoing_value_all(value);
    }

    /// Last value received on `face`.
    pub fn incoming_value(&self, face: usize) -> u8 {
        self.channel.incoming_value(face)
    }

    /// `true` if the value on `face` changed since the previous call.
    pub fn did_value_change(&mut self, face: usize) -> bool {
        self.channel.did_value_change(face)
    }

    /// `true` if nothing was heard on `face` recently.
    pub fn is_face_expired(&self, face: usize) -> bool {
        self.channel.is_expired(face, self.clock.now())
    }

    /// `true` if no face has a neighbor.
    pub fn is_alone(&self) -> bool {
        self.channel.is_alone(self.clock.now())
    }

    /// Faces with a neighbor, as a bitmask.
    pub fn connected_faces(&self) -> FaceMask {
        (0..FACE_COUNT)
            .filter(|&face| !self.is_face_expired(face))
            .fold(0, |mask, face| mask | face_bit(face))
    }

    /// Queues a datagram on `face`.
    pub fn send_datagram(&mut self, face: usize, payload: &[u8]) -> Result<(), DatagramError> {
        self.channel.send_datagram(face, payload)
    }

    /// `true` if a received datagram is waiting on `face`.
    pub fn is_datagram_ready(&self, face: usize) -> bool {
        self.channel.is_datagram_ready(face)
    }

    /// Length of the waiting datagram on `face`.
    pub fn datagram_len(&self, face: usize) -> usize {
        self.channel.datagram_len(face)
    }

    /// The waiting datagram on `face`.
    pub fn datagram(&self, face: usize) -> &[u8] {
        self.channel.datagram(face)
    }

    /// Frees the inbound datagram slot of `face`.
    pub fn consume_datagram(&mut self, face: usize) {
        self.channel.consume_datagram(face);
    }

    /// `true` while the datagram sent on `face` waits for its ack.
    pub fn is_datagram_pending(&self, face: usize) -> bool {
        self.channel.is_datagram_pending(face)
    }

    /// `true` if any face has a datagram waiting for its ack.
    pub fn is_datagram_pending_on_any_face(&self) -> bool {
        self.channel.is_datagram_pending_on_any_face()
    }

    /// Gives up on the datagram sent on `face`.
    pub fn reset_pending_datagram(&mut self, face: usize) {
        self.channel.reset_pending_datagram(face);
    }
}
