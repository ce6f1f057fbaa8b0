//! Per-face value channel.
//!
//! Every face continuously broadcasts a one-byte "face value" to whatever
//! neighbor is in front of it and remembers the last value it heard back.
//! A face that hears nothing for a while is expired; a tile with every face
//! expired is alone.
//!
//! Each packet is:
//!
//! ```text
//! | value | header (optional) | datagram (0..=16 bytes) |
//! ```
//!
//! Sending is ping-pong: a face replies as soon as it hears a packet, and
//! otherwise probes every [`TileConfig::probe_ms`]. The header is only added
//! when there is something to say (a datagram, an ack, a postpone flag).
//!
//! The datagram half of the channel lives in [`datagram`].

pub mod datagram;
pub mod header;

pub use header::{Header, SpecialPacket, next_sequence};

use heapless::Vec;

use crate::config::TileConfig;
use crate::consts::{DATAGRAM_MAX_LEN, FACE_COUNT, PACKET_MAX_LEN};
use crate::link::PacketLink;
use crate::time::{Millis, Timer};

/// State kept for one face.
#[derive(Debug, Default, Clone)]
pub(crate) struct FaceData {
    /// Last value received, 0 if none yet.
    in_value: u8,
    /// `in_value` as of the last `did_value_change`.
    seen_value: u8,
    expire_timer: Timer,
    out_value: u8,
    send_timer: Timer,
    /// Outgoing header; also holds our sequence and ack state.
    header: Header,
    /// Put the header on the next packet even if nothing else needs it.
    send_header: bool,
    inbound: Vec<u8, DATAGRAM_MAX_LEN>,
    outbound: Vec<u8, DATAGRAM_MAX_LEN>,
}

/// What the receive step saw that concerns the rest of the tile.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ChannelEvents {
    /// A neighbor sent the force-sleep packet.
    pub sleep_requested: bool,
    /// A neighbor sent the no-op wake packet.
    pub wake_requested: bool,
    /// A neighbor reported user activity.
    pub postpone_seen: bool,
}

/// Value and datagram state for all six faces.
#[derive(Debug, Clone)]
pub struct FaceChannel {
    faces: [FaceData; FACE_COUNT],
    config: TileConfig,
    /// Postpone flags are not raised again until this expires.
    postpone_lockout: Timer,
}

impl FaceChannel {
    /// Creates a channel with every face expired and due to probe.
    pub fn new(config: TileConfig) -> Self {
        Self {
            faces: Default::default(),
            config,
            postpone_lockout: Timer::new(),
        }
    }

    /// Sets the value broadcast on `face`.
    pub fn set_outgoing_value(&mut self, face: usize, value: u8) {
        self.faces[face].out_value = value;
    }

    /// Sets the value broadcast on every face.
    pub fn set_outgoing_value_all(&mut self, value: u8) {
        for data in self.faces.iter_mut() {
            data.out_value = value;
        }
    }

    /// Last value received on `face`, or 0 if nothing was ever received.
    pub fn incoming_value(&self, face: usize) -> u8 {
        self.faces[face].in_value
    }

    /// `true` if the value on `face` changed since the previous call.
    pub fn did_value_change(&mut self, face: usize) -> bool {
        let data = &mut self.faces[face];
        let changed = data.in_value != data.seen_value;
        data.seen_value = data.in_value;
        changed
    }

    /// `true` if nothing was heard on `face` recently.
    pub fn is_expired(&self, face: usize, now: Millis) -> bool {
        self.faces[face].expire_timer.is_expired(now)
    }

    /// `true` if every face is expired.
    pub fn is_alone(&self, now: Millis) -> bool {
        (0..FACE_COUNT).all(|face| self.is_expired(face, now))
    }

    /// Raises the postpone-sleep flag on every face.
    ///
    /// Does nothing (and returns `false`) inside the lockout that follows the
    /// previous call, so activity spreads through the network once instead
    /// of echoing around it.
    pub fn postpone_sleep(&mut self, now: Millis) -> bool {
        if !self.postpone_lockout.is_expired(now) {
            return false;
        }
        self.postpone_lockout.set(now, self.config.postpone_lockout_ms);
        for data in self.faces.iter_mut() {
            data.header.set_postpone_sleep(true);
        }
        true
    }

    /// Takes every waiting packet from `link` and updates the faces.
    pub fn receive<L: PacketLink>(&mut self, link: &mut L, now: Millis) -> ChannelEvents {
        let mut events = ChannelEvents::default();

        for face in 0..FACE_COUNT {
            let data = &mut self.faces[face];
            if link.take_activity(face) {
                data.expire_timer.set(now, self.config.expire_ms);
            }
            let Some(packet) = link.take_packet(face) else {
                continue;
            };
            data.expire_timer.set(now, self.config.expire_ms);

            if let Some(special) = SpecialPacket::parse(&packet) {
                debug!("face {}: special packet", face);
                match special {
                    SpecialPacket::ForceSleep => events.sleep_requested = true,
                    SpecialPacket::NopWake => events.wake_requested = true,
                }
                continue;
            }

            let Some((&value, rest)) = packet.split_first() else {
                continue;
            };
            data.in_value = value;
            // answer straight away
            data.send_timer.expire();

            let Some((&header, datagram)) = rest.split_first() else {
                continue;
            };
            let header = Header::from_bits(header);
            if !header.non_special() {
                continue;
            }
            if header.postpone_sleep() {
                events.postpone_seen = true;
            }
            self.accept_header(face, header, datagram);
        }
        events
    }

    /// Sends on every face whose send timer has run out.
    ///
    /// A face the link refuses stays due and is retried on the next call.
    pub fn send<L: PacketLink>(&mut self, link: &mut L, now: Millis) {
        for face in 0..FACE_COUNT {
            let data = &mut self.faces[face];
            if !data.send_timer.is_expired(now) {
                continue;
            }

            // value, then header and datagram when there is something to say
            let mut packet = [0u8; PACKET_MAX_LEN];
            packet[0] = data.out_value;
            let mut len = 1;
            if data.send_header || data.header.postpone_sleep() || !data.outbound.is_empty() {
                data.header.set_non_special(true);
                packet[1] = data.header.bits();
                len = 2 + data.outbound.len();
                packet[2..len].copy_from_slice(&data.outbound);
            }

            if link.send_packet(face, &packet[..len]).is_ok() {
                data.send_header = false;
                data.header.set_postpone_sleep(false);
                let stagger = self.config.face_stagger_ms * face as u32;
                data.send_timer.set(now, self.config.probe_ms + stagger);
            }
        }
    }
}
