//! Data types and latency statistics shared by the barrage load generator.
mod config;
mod constants;
mod descriptor;
mod error;
mod outcome;
mod stats;

pub use config::*;
pub use constants::*;
pub use descriptor::*;
pub use error::*;
pub use outcome::*;
pub use stats::*;
