//! Framing of the bitstream burst write.
//!
//! The burst is one logical I2C write: the `LSC_BITSTREAM_BURST` prefix followed
//! by the whole image. I2C controllers cap the length of a single message (65,535
//! bytes under Linux), so the write is cut into chunks that are issued back to
//! back inside one transaction. Every chunk after the first continues the write
//! without a new START condition, which is what the embedded-hal contract for
//! adjacent [`Operation::Write`]s in [`I2c::transaction`] guarantees.
//!
//! [`Operation::Write`]: embedded_hal::i2c::Operation::Write
//! [`I2c::transaction`]: embedded_hal::i2c::I2c::transaction

use std::collections::TryReserveError;
use std::num::NonZeroUsize;

use crate::commands::Command;

/// One piece of the burst write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferChunk<'a> {
    /// Bytes carried by this chunk.
    pub bytes: &'a [u8],
    /// True for every chunk but the first: no START condition precedes it.
    pub continuation: bool,
}

/// Copy the burst prefix and the image into one contiguous buffer.
///
/// The allocation is fallible so that a huge image surfaces as an error rather
/// than an abort.
pub fn burst_buffer(image: &[u8]) -> Result<Vec<u8>, TryReserveError> {
    let prefix = Command::LscBitstreamBurst.frame();
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(prefix.len() + image.len())?;
    buffer.extend_from_slice(prefix);
    buffer.extend_from_slice(image);
    Ok(buffer)
}

/// Split a burst buffer into chunks of at most `max_transfer` bytes.
///
/// An empty buffer yields no chunks. The driver never builds one, since the
/// prefix alone is four bytes.
pub fn chunks(buffer: &[u8], max_transfer: NonZeroUsize) -> impl Iterator<Item = TransferChunk<'_>> {
    buffer
        .chunks(max_transfer.get())
        .enumerate()
        .map(|(idx, bytes)| TransferChunk {
            bytes,
            continuation: idx > 0,
        })
}

/// Number of chunks [`chunks`] produces for a buffer of `length` bytes.
pub fn chunk_count(length: usize, max_transfer: NonZeroUsize) -> usize {
    length.div_ceil(max_transfer.get())
}

#[cfg(test)]
mod test {
    use std::num::NonZeroUsize;

    use super::{burst_buffer, chunk_count, chunks};

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn empty_image_is_just_the_prefix() {
        let buffer = burst_buffer(&[]).unwrap();
        assert_eq!(buffer, [0x7A, 0x00, 0x00, 0x00]);
        let pieces: Vec<_> = chunks(&buffer, limit(65_535)).collect();
        assert_eq!(pieces.len(), 1);
        assert!(!pieces[0].continuation);
    }

    #[test]
    fn chunks_respect_limit_and_reassemble() {
        let image: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let buffer = burst_buffer(&image).unwrap();
        for max in [1, 3, 4, 5, 64, 1003, 1004, 1005, 65_535] {
            let pieces: Vec<_> = chunks(&buffer, limit(max)).collect();
            assert_eq!(pieces.len(), chunk_count(buffer.len(), limit(max)));
            assert!(pieces.iter().all(|c| c.bytes.len() <= max));
            assert!(pieces.iter().skip(1).all(|c| c.continuation));
            let joined: Vec<u8> = pieces.iter().flat_map(|c| c.bytes).copied().collect();
            assert_eq!(&joined[..4], &[0x7A, 0x00, 0x00, 0x00]);
            assert_eq!(&joined[4..], &image[..]);
        }
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        // 65,531 bytes of image plus the prefix fill one message exactly.
        let image = vec![0u8; 65_531];
        let buffer = burst_buffer(&image).unwrap();
        assert_eq!(chunks(&buffer, limit(65_535)).count(), 1);
        let image = vec![0u8; 65_532];
        let buffer = burst_buffer(&image).unwrap();
        let pieces: Vec<_> = chunks(&buffer, limit(65_535)).collect();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[1].bytes.len(), 1);
    }
}
