//! Client data area transport capability.
//!
//! The engine talks to the simulation host exclusively through
//! [`ClientDataTransport`]: binding area names to ids, registering byte-range
//! definitions, subscribing to changes and writing commands. Notifications
//! come back through a single [`NotificationHandler`].
//!
//! [`LoopbackTransport`] is an in-process transport that emulates the remote
//! module, for tests, demos and offline use.

pub mod error;
pub mod loopback;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::{LoopbackTransport, TransportCall};
pub use traits::{ClientDataNotification, ClientDataTransport, NotificationHandler};
