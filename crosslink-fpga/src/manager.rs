//! FPGA manager interface.
//!
//! An FPGA manager drives a low-level driver through a fixed series of steps to
//! load an image: one `write_init`, one or more `write`s, then `write_complete`.
//! [`FpgaManagerOps`] is the driver side of that contract and [`FpgaManager`]
//! the caller side, which also tracks which step last failed.

use log::{debug, error, warn};

/// State of an FPGA as reported to, or tracked by, the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpgaManagerState {
    /// The driver cannot tell what the device is doing.
    Unknown,
    /// The device is ready to be programmed, or is running a design.
    Operating,
    /// Preparing the device for a new image.
    WriteInit,
    /// Preparing the device failed.
    WriteInitError,
    /// Writing the image.
    Write,
    /// Writing the image failed.
    WriteError,
    /// Finishing the load.
    WriteComplete,
    /// Finishing the load failed.
    WriteCompleteError,
}

impl FpgaManagerState {
    /// True for the states recorded after a failed step.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::WriteInitError | Self::WriteError | Self::WriteCompleteError
        )
    }
}

/// Low-level operations an FPGA driver provides to the manager.
///
/// The manager guarantees the calls are made one at a time, in the order
/// `write_init`, `write` (once or more), `write_complete`.
pub trait FpgaManagerOps {
    /// Error returned by each step.
    type Error;

    /// Current state of the device.
    fn state(&self) -> FpgaManagerState;

    /// Prepare the device to receive an image.
    fn write_init(&mut self) -> Result<(), Self::Error>;

    /// Write one segment of the image.
    fn write(&mut self, buf: &[u8]) -> Result<(), Self::Error>;

    /// Finish the load.
    fn write_complete(&mut self) -> Result<(), Self::Error>;
}

/// Drives an [`FpgaManagerOps`] implementation through an image load.
#[derive(Debug)]
pub struct FpgaManager<O> {
    ops: O,
    state: FpgaManagerState,
}

impl<O: FpgaManagerOps> FpgaManager<O> {
    /// Take ownership of the driver, seeding the state from it.
    pub fn new(ops: O) -> Self {
        let state = ops.state();
        Self { ops, state }
    }

    /// State after the last step the manager ran.
    pub fn state(&self) -> FpgaManagerState {
        self.state
    }

    /// Load a whole image in one write.
    ///
    /// # Errors
    ///
    /// The error of the first failing step. [`FpgaManager::state`] then says
    /// which step that was.
    pub fn load(&mut self, image: &[u8]) -> Result<(), O::Error> {
        self.load_segments([image])
    }

    /// Load an image delivered in several segments.
    ///
    /// Each segment is handed to [`FpgaManagerOps::write`] separately. With no
    /// segments at all nothing is run and the device is left untouched.
    ///
    /// # Errors
    ///
    /// The error of the first failing step.
    pub fn load_segments<'a, S>(&mut self, segments: S) -> Result<(), O::Error>
    where
        S: IntoIterator<Item = &'a [u8]>,
    {
        let mut segments = segments.into_iter().peekable();
        if segments.peek().is_none() {
            warn!("No image segments given, not loading");
            return Ok(());
        }

        self.state = FpgaManagerState::WriteInit;
        if let Err(e) = self.ops.write_init() {
            error!("Error preparing FPGA for writing");
            self.state = FpgaManagerState::WriteInitError;
            return Err(e);
        }

        self.state = FpgaManagerState::Write;
        for (idx, segment) in segments.enumerate() {
            debug!("writing segment {idx} ({} bytes)", segment.len());
            if let Err(e) = self.ops.write(segment) {
                error!("Error while writing image data to FPGA");
                self.state = FpgaManagerState::WriteError;
                return Err(e);
            }
        }

        self.state = FpgaManagerState::WriteComplete;
        if let Err(e) = self.ops.write_complete() {
            error!("Error after writing image data to FPGA");
            self.state = FpgaManagerState::WriteCompleteError;
            return Err(e);
        }

        self.state = self.ops.state();
        Ok(())
    }

    /// Borrow the driver.
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Mutably borrow the driver.
    pub fn ops_mut(&mut self) -> &mut O {
        &mut self.ops
    }

    /// Give back the driver.
    pub fn into_inner(self) -> O {
        self.ops
    }
}
