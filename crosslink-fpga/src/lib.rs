#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod burst;
pub mod commands;
mod config;
mod driver;
mod error;
pub mod manager;
pub mod status;
pub mod timing;

pub use commands::Command;
pub use config::{Config, ResetPolarity, ResetPolicy};
pub use driver::{CROSSLINK_IDCODE, CrossLink, DriverError, RunState};
pub use error::Error;
pub use manager::{FpgaManager, FpgaManagerOps, FpgaManagerState};
pub use status::StatusWord;
