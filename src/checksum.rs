/// Folds one byte into a running packet checksum.
///
/// The running value is rotated right by one bit before the byte is added, so
/// swapped bytes give a different sum.
pub(crate) fn checksum_update(sum: u8, byte: &u8) -> u8 {
    sum.rotate_right(1).wrapping_add(*byte)
}

/// Checksum of a whole packet, starting from zero.
pub(crate) fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, checksum_update)
}
