//! Network-wide sleep and wake.
//!
//! Sleep spreads like a rumor: a tile going to sleep floods every face with
//! the force-sleep packet a few times, every neighbor that hears it does the
//! same, and so on until the whole cluster is dark. Waking works the same
//! way with the no-op wake packet, which does nothing except wake the tile
//! that receives it.
//!
//! ```text
//!            enter()               flood done
//! Active ───────────► EnteringSleep ──────────► Asleep
//!   ▲                                              │ button / wake packet
//!   │           flood done                         ▼
//!   └───────────────────────────────────────── Waking
//! ```
//!
//! The controller never blocks. [`SleepController::step`] does a bounded
//! amount of work per call and is driven by the tile loop while the tile is
//! not [`SleepState::Active`].

use crate::channel::SpecialPacket;
use crate::config::TileConfig;
use crate::consts::FACE_COUNT;
use crate::link::PacketLink;
use crate::peripherals::{Button, FaceDisplay, RGB8};
use crate::time::{Millis, Timer};

/// Where the tile is in the sleep cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SleepState {
    /// Running normally.
    #[default]
    Active,
    /// Flooding the force-sleep packet.
    EnteringSleep,
    /// Dark, waiting for a button press or a wake packet.
    Asleep,
    /// Flooding the wake packet.
    Waking,
}

/// Sleep state machine for one tile.
#[derive(Debug, Clone)]
pub struct SleepController {
    state: SleepState,
    config: TileConfig,
    /// Bounds the current flood.
    flood_timer: Timer,
    /// Copies of the current flood packet sent per face.
    sent: [u8; FACE_COUNT],
    /// Face colors from before sleep.
    saved: [RGB8; FACE_COUNT],
    /// Raw time at which sleep started.
    slept_at: Millis,
}

impl SleepController {
    /// Creates an active controller.
    pub fn new(config: TileConfig) -> Self {
        Self {
            state: SleepState::Active,
            config,
            flood_timer: Timer::new(),
            sent: [0; FACE_COUNT],
            saved: [RGB8::default(); FACE_COUNT],
            slept_at: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SleepState {
        self.state
    }

    /// `true` while the tile is running normally.
    pub fn is_active(&self) -> bool {
        self.state == SleepState::Active
    }

    /// Starts going to sleep. Ignored unless active.
    ///
    /// `now` is raw (port) time.
    pub fn enter<D: FaceDisplay>(&mut self, display: &D, now: Millis) {
        if self.state != SleepState::Active {
            return;
        }
        info!("going to sleep");
        self.saved = display.pixels();
        self.slept_at = now;
        self.start_flood(now);
        self.state = SleepState::EnteringSleep;
    }

    fn start_flood(&mut self, now: Millis) {
        self.sent = [0; FACE_COUNT];
        self.flood_timer.set(now, self.config.flood_timeout_ms);
    }

    /// Sends one more copy of `packet` on every face that needs one and the
    /// link accepts. Returns `true` once the flood is complete or timed out.
    fn flood<L: PacketLink>(&mut self, link: &mut L, packet: SpecialPacket, now: Millis) -> bool {
        let bytes = packet.bytes();
        for (face, sent) in self.sent.iter_mut().enumerate() {
            if *sent < self.config.flood_repeats && link.send_packet(face, &bytes).is_ok() {
                *sent += 1;
            }
        }
        let done = self.sent.iter().all(|&sent| sent >= self.config.flood_repeats);
        done || self.flood_timer.is_expired(now)
    }

    fn total_sent(&self) -> u8 {
        self.sent.iter().fold(0u8, |sum, &sent| sum.saturating_add(sent))
    }

    /// Advances a tile that is not active.
    ///
    /// `now` is raw (port) time. Returns the time spent away, in
    /// milliseconds, on the call that brings the tile back to
    /// [`SleepState::Active`].
    pub fn step<L, D, B>(&mut self, link: &mut L, display: &mut D, button: &mut B, now: Millis) -> Option<u32>
    where
        L: PacketLink,
        D: FaceDisplay,
        B: Button,
    {
        match self.state {
            SleepState::Active => None,
            SleepState::EnteringSleep => {
                let done = self.flood(link, SpecialPacket::ForceSleep, now);
                let level = self.config.max_brightness.saturating_sub(self.total_sent());
                display.fill(RGB8::new(level.saturating_mul(8), 0, 0));
                if done {
                    display.fill(RGB8::default());
                    link.discard_packets();
                    self.state = SleepState::Asleep;
                    info!("asleep");
                }
                display.commit();
                None
            }
            SleepState::Asleep => {
                let mut wake = button.snapshot().pressed;
                for face in 0..FACE_COUNT {
                    let _ = link.take_activity(face);
                    if let Some(packet) = link.take_packet(face) {
                        wake |= SpecialPacket::parse(&packet) == Some(SpecialPacket::NopWake);
                    }
                }
                if wake {
                    info!("waking up");
                    link.discard_packets();
                    self.start_flood(now);
                    self.state = SleepState::Waking;
                }
                None
            }
            SleepState::Waking => {
                let done = self.flood(link, SpecialPacket::NopWake, now);
                let level = self.total_sent().min(self.config.max_brightness).saturating_mul(8);
                display.fill(RGB8::new(level, level, level));
                if !done {
                    display.commit();
                    return None;
                }
                display.set_pixels(&self.saved);
                display.commit();
                link.discard_packets();
                self.state = SleepState::Active;
                let away = now.wrapping_sub(self.slept_at);
                info!("awake after {} ms", away);
                Some(away)
            }
        }
    }
}
