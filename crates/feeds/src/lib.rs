//! Transport collaborators for the loop engine.
//!
//! ## Architecture
//!
//! - `listing` - pool listing feed (HTTP, read once at startup)
//! - `rpc` - single and batched account reads (JSON-RPC over HTTP)
//! - `websocket` - push subscription for one account

pub mod error;
pub mod listing;
pub mod rpc;
pub mod websocket;

pub use error::*;
pub use listing::*;
pub use rpc::*;
pub use websocket::*;
