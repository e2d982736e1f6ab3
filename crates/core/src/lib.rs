//! Core data types for the cyclic arbitrage bot.

pub mod asset;
pub mod error;
pub mod layout;
pub mod pair;
pub mod path;
pub mod quote;

pub use asset::*;
pub use error::*;
pub use layout::*;
pub use pair::*;
pub use path::*;
pub use quote::*;
