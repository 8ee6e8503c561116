//! Utilities shared between Hiroba binaries: logging setup and clocks.

pub mod logger;
pub mod time;
