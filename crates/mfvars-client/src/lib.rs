//! Variable request engine for MobiFlight client data areas.
//!
//! This is the "just works" layer. Connect over a transport, read simulation
//! variables synchronously with a bounded wait, and fire write expressions,
//! while values keep arriving asynchronously in the background.
//!
//! Two channel lifecycles are supported: the well-known `MobiFlight.*` areas
//! ([`FixedChannels`]) and private per-client areas obtained through a
//! registration handshake ([`NegotiatedChannels`]).

pub mod channel;
pub mod dispatch;
pub mod error;
pub mod handshake;
pub mod provider;
pub mod requests;
pub mod store;

pub use channel::{ChannelBinding, ChannelIds, ChannelLifecycle, ChannelManager, ChannelSet};
pub use dispatch::{Dispatcher, Route};
pub use error::{ClientError, Result};
pub use handshake::{HandshakeConfig, HandshakePayload, NegotiationState, Negotiator};
pub use provider::{ChannelSetProvider, FixedChannels, NegotiatedChannels};
pub use requests::{RequestConfig, VariableRequests};
pub use store::{Allocation, SampleOutcome, SimValue, VariableSlot, VariableStore};
