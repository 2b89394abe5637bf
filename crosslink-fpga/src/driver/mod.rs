use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::i2c::{self, I2c, Operation};
use log::{debug, error, info, trace, warn};

use crate::burst;
use crate::commands::Command;
use crate::config::{Config, ResetPolarity, ResetPolicy};
use crate::error::Error;
use crate::manager::FpgaManagerState;
use crate::status::StatusWord;
use crate::timing;

mod manager_ops;

/// IDCODE of the CrossLink LIF-MD6000.
pub const CROSSLINK_IDCODE: u32 = 0x43002C01;

/// Error type of a [`CrossLink`] built on the given bus and pin types.
pub type DriverError<I2C, RST> =
    Error<<I2C as i2c::ErrorType>::Error, <RST as digital::ErrorType>::Error>;

/// Progress through one configuration run.
///
/// A run starts with [`CrossLink::reset`] and nothing except
/// [`CrossLink::bitstream_loaded`] carries over into the next one. The driver
/// records the state for inspection but does not refuse calls made out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No reset has been attempted since the driver was created.
    Unreset,
    /// The reset sequence is under way.
    ResetPending,
    /// The device answered with the CrossLink IDCODE.
    Identified,
    /// ISC mode is enabled and the SRAM erase has been issued.
    Erased,
    /// A bitstream is being written.
    Streaming,
    /// The status register reported DONE.
    Verified,
    /// ISC mode was left after a verified load.
    Complete,
    /// A step failed. The device state is unknown until the next reset.
    Failed,
    /// Leaving ISC mode failed after DONE was seen.
    ///
    /// The design may or may not be running. No recovery is attempted; only a
    /// fresh reset starts a new run.
    Indeterminate,
}

/// Driver for a Lattice CrossLink on an I2C configuration port.
///
/// The driver owns the bus, the `CRESET_B` pin and a delay provider for as long
/// as the device is attached. Use [`CrossLink::release`] to get them back.
///
/// # Quick start
///
/// [`CrossLink::probe`] resets and identifies the device. After that, a load is
/// [`CrossLink::prepare_erase`], [`CrossLink::upload_bitstream`] and
/// [`CrossLink::finalize`]. The same sequence is available through the
/// [`FpgaManagerOps`] implementation.
///
/// [`FpgaManagerOps`]: crate::FpgaManagerOps
#[derive(Debug)]
pub struct CrossLink<I2C, RST, D> {
    i2c: I2C,
    reset: RST,
    delay: D,
    config: Config,
    state: RunState,
    bitstream_loaded: bool,
}

impl<I2C, RST, D> CrossLink<I2C, RST, D>
where
    I2C: I2c,
    RST: OutputPin,
    D: DelayNs,
{
    ////////////////////////////////////////////////////////////////////////////////
    // Constructors
    ////////////////////////////////////////////////////////////////////////////////

    /// Create the driver without touching the device.
    pub fn new(i2c: I2C, reset: RST, delay: D, config: Config) -> Self {
        Self {
            i2c,
            reset,
            delay,
            config,
            state: RunState::Unreset,
            bitstream_loaded: false,
        }
    }

    /// Create the driver and reset the device using the configured policy.
    ///
    /// # Errors
    ///
    /// The error from the last reset attempt is returned if none succeeded.
    pub fn probe(
        i2c: I2C,
        reset: RST,
        delay: D,
        config: Config,
    ) -> Result<Self, DriverError<I2C, RST>> {
        let mut driver = Self::new(i2c, reset, delay, config);
        driver.reset_with_policy(config.reset_policy)?;
        Ok(driver)
    }

    /// Give back the bus, reset pin and delay provider.
    pub fn release(self) -> (I2C, RST, D) {
        (self.i2c, self.reset, self.delay)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Configuration sequence
    ////////////////////////////////////////////////////////////////////////////////

    /// Reset the device into I2C configuration mode and check its IDCODE.
    ///
    /// `CRESET_B` is held while the activation key is written, then released.
    /// After a settle delay the device is put into ISC mode and its IDCODE read.
    ///
    /// This runs the sequence exactly once. Every second power-on reset leaves
    /// the CrossLink answering `0xFF` to everything, so callers should normally
    /// use [`CrossLink::reset_with_policy`].
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if any I2C transfer fails.
    /// - [`Error::ResetLine`] if the reset pin cannot be driven.
    /// - [`Error::IdentityMismatch`] if the IDCODE is not [`CROSSLINK_IDCODE`].
    pub fn reset(&mut self) -> Result<(), DriverError<I2C, RST>> {
        self.state = RunState::ResetPending;
        self.bitstream_loaded = false;
        let result = self.reset_sequence();
        self.advance(result, RunState::Identified)
    }

    fn reset_sequence(&mut self) -> Result<(), DriverError<I2C, RST>> {
        self.set_reset_asserted(true)?;
        self.send(Command::Activate)?;
        self.set_reset_asserted(false)?;

        self.delay.delay_ms(timing::RESET_SETTLE_MS);

        self.send(Command::IscEnable)?;
        let idcode = u32::from_le_bytes(self.read_word(Command::ReadIdcode)?);
        debug!("IDCODE: {idcode:#010x}");

        if idcode != CROSSLINK_IDCODE {
            return Err(Error::IdentityMismatch {
                expected: CROSSLINK_IDCODE,
                found: idcode,
            });
        }
        Ok(())
    }

    /// Run [`CrossLink::reset`] until it succeeds or the policy's attempts run out.
    ///
    /// Any failure counts as a failed attempt, whether the bus failed or the
    /// IDCODE was wrong.
    ///
    /// # Errors
    ///
    /// Returns the error from the final attempt.
    pub fn reset_with_policy(&mut self, policy: ResetPolicy) -> Result<(), DriverError<I2C, RST>> {
        let attempts = policy.max_attempts();
        let mut attempt = 1;
        loop {
            match self.reset() {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!("FPGA reset attempt {attempt} of {attempts} failed: {e}");
                    attempt += 1;
                }
                Err(e) => {
                    error!("FPGA reset failed! ({e})");
                    return Err(e);
                }
            }
        }
    }

    /// Enter ISC mode and erase the configuration SRAM.
    ///
    /// <div class="warning">
    ///
    /// The erase is not verified. The status register is only checked after the
    /// bitstream has been written, by [`CrossLink::upload_bitstream`].
    ///
    /// </div>
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] if either command cannot be written.
    pub fn prepare_erase(&mut self) -> Result<(), DriverError<I2C, RST>> {
        let result = self.erase_sequence();
        self.advance(result, RunState::Erased)
    }

    fn erase_sequence(&mut self) -> Result<(), DriverError<I2C, RST>> {
        self.send(Command::IscEnable)?;
        self.delay.delay_ms(timing::ENABLE_SETTLE_MS);
        self.send(Command::IscErase)?;
        self.delay.delay_ms(timing::ERASE_SETTLE_MS);
        Ok(())
    }

    /// Write a bitstream into the configuration SRAM and check the result.
    ///
    /// The image is sent as one burst write, split into continuation chunks no
    /// longer than [`Config::max_transfer`]. The image is treated as opaque bytes
    /// and is neither modified nor kept.
    ///
    /// Success is decided by the DONE bit alone: a status with DONE and FAIL both
    /// set counts as a successful load.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if any I2C transfer fails.
    /// - [`Error::Allocation`] if the burst buffer cannot be allocated.
    /// - [`Error::UploadIncomplete`] if DONE is not set afterwards.
    pub fn upload_bitstream(&mut self, image: &[u8]) -> Result<StatusWord, DriverError<I2C, RST>> {
        self.state = RunState::Streaming;
        let result = self.upload_sequence(image);
        self.advance(result, RunState::Verified)
    }

    fn upload_sequence(&mut self, image: &[u8]) -> Result<StatusWord, DriverError<I2C, RST>> {
        self.send(Command::LscInit)?;
        self.delay.delay_ms(timing::INIT_SETTLE_MS);

        self.burst(image)?;

        let status = StatusWord::from_le_bytes(self.read_word(Command::LscReadStatus)?);
        debug!("STATUS: {status}");

        if !status.done() {
            error!("Bitstream loading failed!");
            return Err(Error::UploadIncomplete(status));
        }
        Ok(status)
    }

    /// Write the burst prefix and image as one multi-chunk transaction.
    fn burst(&mut self, image: &[u8]) -> Result<(), DriverError<I2C, RST>> {
        let max_transfer = self.config.max_transfer;
        let requested = Command::LscBitstreamBurst.frame().len() + image.len();
        let buffer = burst::burst_buffer(image)
            .map_err(|_| DriverError::<I2C, RST>::Allocation { requested })?;

        let count = burst::chunk_count(buffer.len(), max_transfer);
        let mut operations: Vec<Operation<'_>> = Vec::new();
        operations
            .try_reserve_exact(count)
            .map_err(|_| DriverError::<I2C, RST>::Allocation {
                requested: count * size_of::<Operation<'_>>(),
            })?;
        for chunk in burst::chunks(&buffer, max_transfer) {
            trace!(
                "burst chunk of {} bytes (continuation: {})",
                chunk.bytes.len(),
                chunk.continuation
            );
            operations.push(Operation::Write(chunk.bytes));
        }
        debug!("writing {requested} byte bitstream burst in {count} chunk(s)");

        self.i2c
            .transaction(self.config.address, &mut operations)
            .map_err(|e| {
                error!("{} command failed! ({e:?})", Command::LscBitstreamBurst);
                Error::Transport(e)
            })
    }

    /// Leave ISC mode, starting the loaded design.
    ///
    /// There is no rollback. If this fails after DONE was observed the driver
    /// moves to [`RunState::Indeterminate`] and the error is returned as is.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] if the command cannot be written.
    pub fn finalize(&mut self) -> Result<(), DriverError<I2C, RST>> {
        let verified = self.state == RunState::Verified;
        let result = self.send(Command::IscDisable);
        let result = self.advance(result, RunState::Complete);
        match result {
            Ok(()) => {
                self.bitstream_loaded = true;
                info!("Bitstream loading successful!");
            }
            Err(_) if verified => self.state = RunState::Indeterminate,
            Err(_) => {}
        }
        result
    }

    /// Read the 32-bit USERCODE.
    ///
    /// This does not change the run state.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] if the transfer fails.
    pub fn read_usercode(&mut self) -> Result<u32, DriverError<I2C, RST>> {
        let usercode = u32::from_le_bytes(self.read_word(Command::ReadUsercode)?);
        debug!("USERCODE: {usercode:#010x}");
        Ok(usercode)
    }

    ////////////////////////////////////////////////////////////////////////////////
    // State
    ////////////////////////////////////////////////////////////////////////////////

    /// State reported to the FPGA manager. Always [`FpgaManagerState::Operating`].
    ///
    /// The manager only needs to know whether the device can be programmed, so
    /// the intermediate run states are not reported.
    pub fn query_state(&self) -> FpgaManagerState {
        FpgaManagerState::Operating
    }

    /// Where the current configuration run has got to.
    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Whether the last run completed. This is advisory only.
    pub fn bitstream_loaded(&self) -> bool {
        self.bitstream_loaded
    }

    /// The configuration the driver was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Helpers
    ////////////////////////////////////////////////////////////////////////////////

    /// Record the outcome of a step.
    fn advance<T>(
        &mut self,
        result: Result<T, DriverError<I2C, RST>>,
        next: RunState,
    ) -> Result<T, DriverError<I2C, RST>> {
        self.state = match result {
            Ok(_) => next,
            Err(_) => RunState::Failed,
        };
        result
    }

    /// Write a single command frame.
    fn send(&mut self, command: Command) -> Result<(), DriverError<I2C, RST>> {
        trace!("sending {command}");
        self.i2c
            .write(self.config.address, command.frame())
            .map_err(|e| {
                error!("{command} command failed! ({e:?})");
                Error::Transport(e)
            })
    }

    /// Write a command frame and read back a 32-bit register.
    fn read_word(&mut self, command: Command) -> Result<[u8; 4], DriverError<I2C, RST>> {
        trace!("sending {command} with read");
        let mut word = [0u8; 4];
        self.i2c
            .write_read(self.config.address, command.frame(), &mut word)
            .map_err(|e| {
                error!("{command} command failed! ({e:?})");
                DriverError::<I2C, RST>::Transport(e)
            })?;
        Ok(word)
    }

    fn set_reset_asserted(&mut self, asserted: bool) -> Result<(), DriverError<I2C, RST>> {
        let high = match self.config.reset_polarity {
            ResetPolarity::ActiveLow => !asserted,
            ResetPolarity::ActiveHigh => asserted,
        };
        let result = if high {
            self.reset.set_high()
        } else {
            self.reset.set_low()
        };
        result.map_err(|e| {
            error!("Failed to drive CRESET_B: {e:?}");
            Error::ResetLine(e)
        })
    }
}
