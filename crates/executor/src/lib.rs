//! Trade execution for cyclic arbitrage loops.
//!
//! This crate encodes swap instructions, assembles the one-transaction loop,
//! signs it and hands it to the chain without waiting for confirmation.

pub mod assembler;
pub mod client;
pub mod error;
pub mod instruction;
pub mod submit;

pub use assembler::*;
pub use client::*;
pub use error::*;
pub use instruction::*;
pub use submit::*;
