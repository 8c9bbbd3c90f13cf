use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::channel::ChannelIds;
use crate::error::{ClientError, Result};

const MAX_CLIENT_NAME_LEN: usize = 64;

/// Granularity of the blocking wait; bounds how late a cancellation is noticed.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Handshake answer written by the remote module on the initialization
/// response channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// Name of the client the areas were created for.
    #[serde(rename = "Name")]
    pub name: String,
    /// Area id of the client's variables area.
    #[serde(rename = "SimVars")]
    pub sim_vars: u32,
    /// Area id of the client's command area.
    #[serde(rename = "Command")]
    pub command: u32,
    /// Area id of the client's response area.
    #[serde(rename = "Response")]
    pub response: u32,
}

impl HandshakePayload {
    /// Parse the JSON text of a handshake answer.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The announced area ids.
    pub fn channel_ids(&self) -> ChannelIds {
        ChannelIds {
            variables: self.sim_vars,
            command: self.command,
            response: self.response,
        }
    }
}

/// Configuration for handshake negotiation.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Name the client registers under.
    pub client_name: String,
    /// Upper bound for the wait. `None` waits until cancelled.
    pub timeout: Option<Duration>,
    /// Aborts the wait from another thread.
    pub cancel: CancellationToken,
}

impl HandshakeConfig {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            ..Self::default()
        }
    }
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            client_name: "mfvars".to_string(),
            timeout: Some(Duration::from_secs(5)),
            cancel: CancellationToken::new(),
        }
    }
}

/// Negotiation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Negotiating,
    Ready(ChannelIds),
}

/// Waits for the handshake answer naming this client.
///
/// [`offer`](Self::offer) runs in the transport's delivery context and only
/// records the result; the waiting thread performs the rebind.
#[derive(Debug)]
pub struct Negotiator {
    client_name: String,
    state: Mutex<NegotiationState>,
    ready: Condvar,
}

impl Negotiator {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            state: Mutex::new(NegotiationState::Negotiating),
            ready: Condvar::new(),
        }
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn state(&self) -> NegotiationState {
        *self.lock()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state(), NegotiationState::Ready(_))
    }

    /// Returns true if a response string looks like this client's handshake.
    pub fn is_candidate(&self, text: &str) -> bool {
        text.starts_with('{') && text.contains(&self.client_name)
    }

    /// Feed a response string. Returns true if it completed the handshake.
    ///
    /// Malformed payloads and payloads for other clients are logged and leave
    /// the state untouched.
    pub fn offer(&self, text: &str) -> bool {
        let payload = match HandshakePayload::parse(text) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, text, "malformed handshake payload");
                return false;
            }
        };
        if payload.name != self.client_name {
            warn!(name = %payload.name, "handshake payload for another client");
            return false;
        }

        let mut state = self.lock();
        if let NegotiationState::Ready(_) = *state {
            return false;
        }
        let ids = payload.channel_ids();
        info!(client = %self.client_name, ?ids, "handshake complete");
        *state = NegotiationState::Ready(ids);
        self.ready.notify_all();
        true
    }

    /// Block until ready, the timeout elapses, or the token is cancelled.
    pub fn wait_ready(
        &self,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<ChannelIds> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.lock();
        loop {
            if let NegotiationState::Ready(ids) = *state {
                return Ok(ids);
            }
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled);
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ClientError::Timeout(timeout.unwrap_or_default()));
                    }
                    (deadline - now).min(WAIT_SLICE)
                }
                None => WAIT_SLICE,
            };
            state = self
                .ready
                .wait_timeout(state, slice)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn lock(&self) -> MutexGuard<'_, NegotiationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn validate_client_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_CLIENT_NAME_LEN {
        return Err(ClientError::HandshakeFailed(format!(
            "invalid client name length: {}",
            name.len()
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(ClientError::HandshakeFailed(format!(
            "invalid client name '{name}': expected ASCII letters, digits, '_' or '-'"
        )));
    }
    Ok(())
}
