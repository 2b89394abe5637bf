//! FPGA manager operations for the CrossLink.
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;

use super::{CrossLink, DriverError};
use crate::manager::{FpgaManagerOps, FpgaManagerState};

impl<I2C, RST, D> FpgaManagerOps for CrossLink<I2C, RST, D>
where
    I2C: I2c,
    RST: OutputPin,
    D: DelayNs,
{
    type Error = DriverError<I2C, RST>;

    fn state(&self) -> FpgaManagerState {
        self.query_state()
    }

    /// Reset (with the configured retry policy) and erase the device.
    fn write_init(&mut self) -> Result<(), Self::Error> {
        self.reset_with_policy(self.config.reset_policy)?;
        self.prepare_erase()
    }

    /// Send one image segment as a complete burst, checking DONE afterwards.
    fn write(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.upload_bitstream(buf).map(|_| ())
    }

    fn write_complete(&mut self) -> Result<(), Self::Error> {
        self.finalize()
    }
}
