//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Records carry host arrival time (`timestamp_ns`, nanoseconds since Unix epoch)
//! - `sequence` is the per-session emission index, used for ordering/diagnostics

mod blueprint;
mod error;
mod layout;
mod record;
mod sink;
mod stats;
mod transport;

pub use blueprint::*;
pub use error::*;
pub use layout::*;
pub use record::*;
pub use sink::*;
pub use stats::*;
pub use transport::*;
