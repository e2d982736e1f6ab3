//! Cyclic arbitrage detection engine.
//!
//! Builds the pair registry and path set for a reference asset, keeps pool
//! reserves current, sizes each loop in closed form and gates firing on
//! profit and cooldown.

pub mod balance;
pub mod cache;
pub mod config;
pub mod cycle;
pub mod error;
pub mod optimizer;
pub mod path_set;
pub mod registry;
pub mod throttle;

#[cfg(test)]
mod test_support;

pub use balance::*;
pub use cache::*;
pub use config::*;
pub use cycle::*;
pub use error::*;
pub use optimizer::*;
pub use path_set::*;
pub use registry::*;
pub use throttle::*;
