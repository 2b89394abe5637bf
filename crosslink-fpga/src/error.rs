use crate::status::StatusWord;

/// Problems encountered while configuring the CrossLink.
///
/// `I` is the error type of the I2C bus and `P` that of the reset pin. Bus
/// errors are passed through untouched so that a flaky bus can be told apart
/// from a device that is absent or is not a CrossLink.
#[derive(Debug, thiserror::Error)]
pub enum Error<I, P> {
    /// The I2C transfer failed (no acknowledge, arbitration loss, bus error).
    ///
    /// The driver never retries a failed transfer on its own.
    #[error("I2C transfer failed: {0:?}")]
    Transport(I),
    /// The reset line could not be driven.
    #[error("could not drive the reset line: {0:?}")]
    ResetLine(P),
    /// The device answered, but with an IDCODE other than the CrossLink's.
    ///
    /// A device stuck in the alternating-reset state answers `0xFFFFFFFF` and
    /// ends up here, so this error is worth one more reset attempt. A repeated
    /// mismatch means the wrong part (or no part) is on the bus.
    #[error("unexpected IDCODE {found:#010x} (expected {expected:#010x})")]
    IdentityMismatch {
        /// IDCODE of the part the driver supports.
        expected: u32,
        /// IDCODE read from the device.
        found: u32,
    },
    /// The status register did not report DONE after the bitstream was written.
    ///
    /// The enclosed status word carries the raw register value.
    #[error("bitstream load incomplete, status {0}")]
    UploadIncomplete(StatusWord),
    /// The buffer for the bitstream burst could not be allocated.
    #[error("could not allocate {requested} bytes for the bitstream burst")]
    Allocation {
        /// Size of the failed allocation in bytes.
        requested: usize,
    },
}

impl<I, P> Error<I, P> {
    /// True if the error came from the I2C bus.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True if the device answered with the wrong IDCODE.
    pub fn is_identity_mismatch(&self) -> bool {
        matches!(self, Error::IdentityMismatch { .. })
    }
}
