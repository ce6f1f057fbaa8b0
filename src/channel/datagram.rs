//! Acknowledged datagrams, one in flight per face and direction.
//!
//! A datagram rides along with the face value in every packet until the
//! neighbor acknowledges it. Each side numbers its datagrams 1 to 7 (see
//! [`next_sequence`]) and echoes back the number of the last one it accepted.
//!
//! - The sender drops its copy when it sees its own sequence number acked.
//! - The receiver accepts a datagram with a new sequence number only when
//!   the application has consumed the previous one. Until then it neither
//!   stores nor acks it, so the sender keeps repeating it.
//! - A repeat of an already accepted datagram is ignored, but the ack is
//!   sent again in case the first one was lost.

use crate::channel::{FaceChannel, Header, next_sequence};
use crate::consts::{DATAGRAM_MAX_LEN, FACE_COUNT, NOP_SPECIAL_VALUE, TRIGGER_SLEEP_SPECIAL_VALUE};
use crate::error::DatagramError;

/// `true` if `payload` starts with a byte reserved for the special packets.
pub fn is_reserved(payload: &[u8]) -> bool {
    matches!(
        payload.first(),
        Some(&TRIGGER_SLEEP_SPECIAL_VALUE) | Some(&NOP_SPECIAL_VALUE)
    )
}

impl FaceChannel {
    /// Queues `payload` on `face` until the neighbor acknowledges it.
    pub fn send_datagram(&mut self, face: usize, payload: &[u8]) -> Result<(), DatagramError> {
        let data = &mut self.faces[face];
        if !data.outbound.is_empty() {
            return Err(DatagramError::Pending);
        }
        if payload.is_empty() {
            return Err(DatagramError::Empty);
        }
        if payload.len() > DATAGRAM_MAX_LEN {
            return Err(DatagramError::TooLong);
        }
        if is_reserved(payload) {
            return Err(DatagramError::Reserved);
        }

        data.outbound
            .extend_from_slice(payload)
            .map_err(|_| DatagramError::TooLong)?;
        let sequence = next_sequence(data.header.sequence());
        data.header.set_sequence(sequence);
        data.send_timer.expire();
        trace!("face {}: datagram {} queued", face, sequence);
        Ok(())
    }

    /// `true` if a received datagram is waiting on `face`.
    pub fn is_datagram_ready(&self, face: usize) -> bool {
        !self.faces[face].inbound.is_empty()
    }

    /// Length of the waiting datagram on `face`, 0 if none.
    pub fn datagram_len(&self, face: usize) -> usize {
        self.faces[face].inbound.len()
    }

    /// The waiting datagram on `face`, empty if none.
    pub fn datagram(&self, face: usize) -> &[u8] {
        &self.faces[face].inbound
    }

    /// Frees the inbound slot of `face` for the next datagram.
    pub fn consume_datagram(&mut self, face: usize) {
        self.faces[face].inbound.clear();
    }

    /// `true` while the datagram sent on `face` is waiting for its ack.
    pub fn is_datagram_pending(&self, face: usize) -> bool {
        !self.faces[face].outbound.is_empty()
    }

    /// `true` if any face has a datagram waiting for its ack.
    pub fn is_datagram_pending_on_any_face(&self) -> bool {
        (0..FACE_COUNT).any(|face| self.is_datagram_pending(face))
    }

    /// Gives up on the datagram sent on `face`.
    pub fn reset_pending_datagram(&mut self, face: usize) {
        self.faces[face].outbound.clear();
    }

    /// Applies the ack and datagram parts of a received header.
    pub(crate) fn accept_header(&mut self, face: usize, header: Header, datagram: &[u8]) {
        let data = &mut self.faces[face];

        if !data.outbound.is_empty() && header.ack_sequence() == data.header.sequence() {
            trace!("face {}: datagram {} acked", face, header.ack_sequence());
            data.outbound.clear();
        }

        if datagram.is_empty() {
            return;
        }
        if header.sequence() == data.header.ack_sequence() {
            // repeat of one we already have
            data.send_header = true;
            return;
        }
        if !data.inbound.is_empty() {
            trace!("face {}: datagram {} held back", face, header.sequence());
            return;
        }
        if data.inbound.extend_from_slice(datagram).is_err() {
            data.inbound.clear();
            return;
        }
        data.header.set_ack_sequence(header.sequence());
        data.send_header = true;
        trace!("face {}: datagram {} accepted", face, header.sequence());
    }
}
