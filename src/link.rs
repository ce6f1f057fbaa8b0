//! What the protocol layers need from the packet link.
//!
//! [`FaceChannel`](crate::channel::FaceChannel) and the sleep controller only
//! ever move whole packets. [`PacketLink`] is implemented for [`IrPort`]
//! (when the main loop owns the port outright) and for `&SharedIrPort`
//! (when the port lives in a `static` ticked from an interrupt). Tests
//! implement it over a simulated network.

use crate::error::SendError;
use crate::packet::Packet;
use crate::port::{IrPort, SharedIrPort};
use crate::time::{Clock, Millis};
use crate::transceiver::IrTransceiver;

/// Packet-level access to the six faces.
pub trait PacketLink {
    /// Takes the packet waiting on `face`, if any.
    fn take_packet(&mut self, face: usize) -> Option<Packet>;

    /// `true` if anything decoded on `face` since the last call.
    fn take_activity(&mut self, face: usize) -> bool;

    /// Queues `payload` on `face`.
    fn send_packet(&mut self, face: usize, payload: &[u8]) -> Result<(), SendError>;

    /// Drops everything received but not yet taken.
    fn discard_packets(&mut self);
}

impl<T: IrTransceiver> PacketLink for IrPort<T> {
    fn take_packet(&mut self, face: usize) -> Option<Packet> {
        IrPort::take_packet(self, face)
    }

    fn take_activity(&mut self, face: usize) -> bool {
        IrPort::take_activity(self, face)
    }

    fn send_packet(&mut self, face: usize, payload: &[u8]) -> Result<(), SendError> {
        IrPort::send_packet(self, face, payload)
    }

    fn discard_packets(&mut self) {
        IrPort::discard_packets(self)
    }
}

/// Each call is its own critical section. A port that is not installed yet
/// behaves like a port that never hears anything and is always busy.
impl<T: IrTransceiver> PacketLink for &SharedIrPort<T> {
    fn take_packet(&mut self, face: usize) -> Option<Packet> {
        self.with(|port| port.take_packet(face)).flatten()
    }

    fn take_activity(&mut self, face: usize) -> bool {
        self.with(|port| port.take_activity(face)).unwrap_or(false)
    }

    fn send_packet(&mut self, face: usize, payload: &[u8]) -> Result<(), SendError> {
        self.with(|port| port.send_packet(face, payload))
            .unwrap_or(Err(SendError::Busy))
    }

    fn discard_packets(&mut self) {
        let _ = self.with(|port| port.discard_packets());
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn millis(&self) -> Millis {
        (**self).millis()
    }
}
