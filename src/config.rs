//! Runtime configuration.
//!
//! Both structs default to the values in [`crate::consts`]. Tiles only talk
//! to each other reliably when they agree on the port settings.

use crate::consts::{
    IR_TICK_US, PACKET_GAP_WINDOWS, PACKET_IDLE_WINDOWS, POSTPONE_SLEEP_LOCKOUT_MS, RX_EXPIRE_TIME_MS,
    SLEEP_ANIMATION_MAX_BRIGHTNESS, SLEEP_FLOOD_TIMEOUT_MS, SLEEP_PACKET_REPEAT_COUNT,
    SLEEP_TIMEOUT_MS, TX_FACE_STAGGER_MS, TX_PROBE_TIME_MS,
};

/// How decoded frames are handed to the consumer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Framing {
    /// Frames are assembled into checksummed packets.
    #[default]
    Packets,
    /// Every frame is latched as a single 7-bit value for `read_byte`.
    RawBytes,
}

/// Settings for the interrupt side of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct PortConfig {
    /// Frame handling.
    pub framing: Framing,
    /// Time between two ticks, in microseconds. Drives the millisecond clock.
    pub tick_us: u16,
    /// Quiet sample windows that end a packet.
    pub packet_idle_windows: u8,
    /// Quiet sample windows left after every outgoing packet.
    pub packet_gap_windows: u8,
}

impl PortConfig {
    /// Default port settings.
    pub const fn new() -> Self {
        Self {
            framing: Framing::Packets,
            tick_us: IR_TICK_US,
            packet_idle_windows: PACKET_IDLE_WINDOWS,
            packet_gap_windows: PACKET_GAP_WINDOWS,
        }
    }

    /// Same settings with `framing` replaced.
    pub const fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for the main-loop side of the stack. All times in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct TileConfig {
    /// Interval between packets on a face when nothing is heard back.
    pub probe_ms: u32,
    /// Silence after which a face counts as expired.
    pub expire_ms: u32,
    /// Extra probe delay per face index.
    pub face_stagger_ms: u32,
    /// Received activity flags are not forwarded again within this window.
    pub postpone_lockout_ms: u32,
    /// Inactivity before the tile goes to sleep.
    pub sleep_timeout_ms: u32,
    /// Copies of the sleep and wake packets sent on each face.
    pub flood_repeats: u8,
    /// Upper bound on a sleep or wake flood.
    pub flood_timeout_ms: u32,
    /// Brightness the sleep fade starts from.
    pub max_brightness: u8,
}

impl TileConfig {
    /// Default tile settings.
    pub const fn new() -> Self {
        Self {
            probe_ms: TX_PROBE_TIME_MS,
            expire_ms: RX_EXPIRE_TIME_MS,
            face_stagger_ms: TX_FACE_STAGGER_MS,
            postpone_lockout_ms: POSTPONE_SLEEP_LOCKOUT_MS,
            sleep_timeout_ms: SLEEP_TIMEOUT_MS,
            flood_repeats: SLEEP_PACKET_REPEAT_COUNT,
            flood_timeout_ms: SLEEP_FLOOD_TIMEOUT_MS,
            max_brightness: SLEEP_ANIMATION_MAX_BRIGHTNESS,
        }
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self::new()
    }
}
