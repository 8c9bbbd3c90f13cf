//! Read and write flight simulator variables through MobiFlight client data areas.
//!
//! mfvars turns the simulator's asynchronous, change-driven client data
//! notifications into plain synchronous reads with a bounded wait, and sends
//! write expressions as fire-and-forget commands.
//!
//! # Crate Structure
//!
//! - [`transport`]: client data area capability and the loopback emulator
//! - [`wire`]: fixed-size command strings, float payloads and well-known ids
//! - [`client`]: the variable request engine
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use mfvars::client::{SimValue, VariableRequests};
//! use mfvars::transport::LoopbackTransport;
//!
//! let transport = Arc::new(LoopbackTransport::new().with_value("(A:PLANE ALTITUDE,Feet)", 1234.5));
//! let requests = VariableRequests::connect_fixed(transport)?;
//! assert_eq!(requests.get("(A:PLANE ALTITUDE,Feet)")?, SimValue::Value(1234.5));
//! # Ok::<(), mfvars::client::ClientError>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use mfvars_transport::*;
}

/// Re-export wire format types.
pub mod wire {
    pub use mfvars_wire::*;
}

/// Re-export engine types.
pub mod client {
    pub use mfvars_client::*;
}
