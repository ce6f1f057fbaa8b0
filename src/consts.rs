//! Constants used across the IR link implementation.
//!
//! This module defines wire timing, framing limits, protocol timeouts and the
//! reserved special values shared by every layer of the stack.
//!
//! ## Key Concepts
//!
//! - **Sample window**: how often every face is sampled for light.
//! - **Ticks**: the interrupt period; flashes are placed on ticks, four to a window.
//! - **Packet limits**: derived from the face value, the header byte and the
//!   maximum datagram length.
//! - **Special values**: reserved byte patterns that make up the sleep and wake
//!   packets.
//!
//! These values should be used wherever timing or buffer logic is implemented
//! so that both ends of a link agree on message boundaries.

/// Number of faces (and IR LEDs) on a tile.
pub const FACE_COUNT: usize = 6;

/// Bitmask with one bit set for every face.
pub const ALL_FACES: u8 = (1 << FACE_COUNT) - 1;

/// Length of one sample window, in microseconds.
///
/// Every face is sampled once per window and reports whether any light
/// arrived since the previous sample.
pub const IR_WINDOW_US: u16 = 512;

/// Length of one tick, in microseconds.
///
/// The sampling interrupt fires once per tick. Faces are sampled on every
/// [`TICKS_PER_WINDOW`]-th tick; flashes can start on any tick.
pub const IR_TICK_US: u16 = 128;

/// Ticks in one sample window.
pub const TICKS_PER_WINDOW: u8 = 4;

/// Clock spread between two tiles the symbol timing has to survive, in percent.
pub const IR_CLOCK_SPREAD_PCT: u8 = 10;

/// Ticks between the two flashes of a 1-bit (640 µs).
///
/// Even a sender running 10% fast puts the flashes in two different windows,
/// and even one running 10% slow keeps them less than two windows apart.
pub const ONE_FLASH_SPACING_TICKS: u8 = 5;

/// Ticks between consecutive sync flashes (384 µs).
///
/// Short enough that no window is skipped, long enough that the four flashes
/// span more than two windows, at either end of the clock spread.
pub const SYNC_FLASH_SPACING_TICKS: u8 = 3;

/// Ticks from the last flash of a symbol to the first flash of the next (2048 µs).
///
/// Leaves two to four dark windows between symbols across the whole clock
/// spread: at least the two the symbol patterns end in, and never the five
/// that count as a dropout.
pub const SYMBOL_GAP_TICKS: u8 = 16;

/// Length of a single flash, in microseconds.
pub const IR_PULSE_WIDTH_US: u16 = 12;

/// Number of flashes sent for a sync. The receiver only needs three of them.
pub const SYNC_PULSE_COUNT: u8 = 4;

/// Sentinel loaded into the receive buffer on sync.
///
/// It walks up one position per received bit; once it reaches the top bit the
/// next bit is the parity bit.
pub const FRAME_SENTINEL: u8 = 0b0000_0001;

/// Bit marking a decoded value as present.
pub const VALUE_PRESENT: u8 = 0b1000_0000;

/// Mask of the payload bits of a decoded frame.
pub const FRAME_DATA_MASK: u8 = 0b0111_1111;

/// Payload bits carried by one frame.
pub const FRAME_DATA_BITS: usize = 7;

/// Maximum length (in bytes) of a datagram payload.
pub const DATAGRAM_MAX_LEN: usize = 16;

/// Maximum length (in bytes) of an application packet.
///
/// Face value, header byte and a full datagram.
pub const PACKET_MAX_LEN: usize = DATAGRAM_MAX_LEN + 2;

/// Maximum length (in bytes) of a packet on the wire, trailing checksum included.
pub const WIRE_MAX_LEN: usize = PACKET_MAX_LEN + 1;

/// Maximum number of 7-bit frames used by one packet.
pub const PACKET_MAX_FRAMES: usize = (WIRE_MAX_LEN * 8).div_ceil(FRAME_DATA_BITS);

/// Idle sample windows after the last frame before a packet is considered complete.
pub const PACKET_IDLE_WINDOWS: u8 = 8;

/// Empty sample windows a sender leaves after each packet.
///
/// Must be comfortably larger than [`PACKET_IDLE_WINDOWS`].
pub const PACKET_GAP_WINDOWS: u8 = 12;

/// How often a face is probed when nothing was received on it, in milliseconds.
///
/// Shorter than [`RX_EXPIRE_TIME_MS`] so that two consecutive misses are
/// needed before a face expires.
pub const TX_PROBE_TIME_MS: u32 = 150;

/// A face is expired when nothing has been received on it for this long, in milliseconds.
pub const RX_EXPIRE_TIME_MS: u32 = 200;

/// Extra delay added per face index when rescheduling a probe, in milliseconds.
pub const TX_FACE_STAGGER_MS: u32 = 2;

/// Viral activity flags received within this window are not forwarded, in milliseconds.
///
/// Keeps a single button press from circulating around a loop of tiles forever.
pub const POSTPONE_SLEEP_LOCKOUT_MS: u32 = 2_000;

/// Inactivity period after which the tile goes to sleep, in milliseconds.
pub const SLEEP_TIMEOUT_MS: u32 = 10 * 60 * 1_000;

/// How many times the sleep and wake packets are sent on every face.
pub const SLEEP_PACKET_REPEAT_COUNT: u8 = 5;

/// Upper bound on the time spent flooding sleep or wake packets, in milliseconds.
pub const SLEEP_FLOOD_TIMEOUT_MS: u32 = 2_000;

/// Starting brightness of the sleep fade.
pub const SLEEP_ANIMATION_MAX_BRIGHTNESS: u8 = 30;

/// Byte that, repeated twice, makes up the force-sleep packet.
pub const TRIGGER_SLEEP_SPECIAL_VALUE: u8 = 0b0001_0101;

/// Byte that, repeated twice, makes up the no-op wake packet.
pub const NOP_SPECIAL_VALUE: u8 = 0b0011_0011;

/// Packet that puts every tile it reaches to sleep.
pub const FORCE_SLEEP_PACKET: [u8; 2] = [TRIGGER_SLEEP_SPECIAL_VALUE, TRIGGER_SLEEP_SPECIAL_VALUE];

/// Packet that does nothing except wake a sleeping neighbor.
pub const NOP_WAKE_PACKET: [u8; 2] = [NOP_SPECIAL_VALUE, NOP_SPECIAL_VALUE];
