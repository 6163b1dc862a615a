//! Pure conversions between observations, stored sums and displayed consensus.

pub mod config;
pub mod consensus;
pub mod delta;

pub use config::DisplayFormat;
pub use consensus::{is_majority, to_consensus};
pub use delta::{to_delta, Delta};
