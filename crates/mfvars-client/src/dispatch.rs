use std::sync::{Arc, Mutex, PoisonError, RwLock};

use mfvars_transport::{ClientDataNotification, NotificationHandler};
use mfvars_wire::{decode_float, decode_string, is_variable_definition, WireError};
use tracing::{debug, error, info, warn};

use crate::handshake::Negotiator;
use crate::store::{lock, SampleOutcome, VariableStore};

/// Where a notification ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Applied to a variable slot.
    Variable(SampleOutcome),
    /// Completed the handshake.
    Handshake,
    /// Informational response text, logged and dropped.
    Response(String),
    /// No slot or response channel owns the definition id.
    Unmatched,
    /// The payload broke the wire contract.
    Malformed(WireError),
}

/// Routes the transport's unified notification stream by definition id.
///
/// Owned by one engine instance; the only writer of slot values.
pub struct Dispatcher {
    store: Arc<Mutex<VariableStore>>,
    responses: RwLock<Vec<u32>>,
    negotiator: Option<Arc<Negotiator>>,
}

impl Dispatcher {
    pub fn new(store: Arc<Mutex<VariableStore>>, negotiator: Option<Arc<Negotiator>>) -> Self {
        Self {
            store,
            responses: RwLock::new(Vec::new()),
            negotiator,
        }
    }

    /// Treat `definition_id` as a response string channel from now on.
    pub fn watch_response(&self, definition_id: u32) {
        let mut responses = self
            .responses
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !responses.contains(&definition_id) {
            responses.push(definition_id);
        }
    }

    fn is_response(&self, definition_id: u32) -> bool {
        self.responses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&definition_id)
    }

    /// Route one notification. Never blocks beyond the store lock.
    pub fn dispatch(&self, notification: &ClientDataNotification) -> Route {
        let id = notification.definition_id;

        {
            let mut store = lock(&self.store);
            if store.contains(id) {
                return match decode_float(&notification.data) {
                    Ok(value) => {
                        let outcome = store.record_sample(id, value);
                        debug!(definition_id = id, value, ?outcome, "variable sample");
                        match outcome {
                            Some(outcome) => Route::Variable(outcome),
                            None => Route::Unmatched,
                        }
                    }
                    Err(err) => {
                        warn!(definition_id = id, %err, "undecodable variable payload");
                        Route::Malformed(err)
                    }
                };
            }
        }

        if self.is_response(id) {
            return self.dispatch_response(id, &notification.data);
        }

        if is_variable_definition(id) {
            // Slots are retired by clear or a failed setup while the remote
            // subscription may still report.
            debug!(definition_id = id, "sample for released slot; dropping");
        } else {
            warn!(definition_id = id, "notification for unknown definition; dropping");
        }
        Route::Unmatched
    }

    fn dispatch_response(&self, id: u32, data: &[u8]) -> Route {
        let text = match decode_string(data) {
            Ok(text) => text,
            Err(err) => {
                error!(definition_id = id, %err, "response payload violates string contract");
                return Route::Malformed(err);
            }
        };

        if let Some(negotiator) = &self.negotiator {
            if !negotiator.is_ready() && negotiator.is_candidate(&text) && negotiator.offer(&text) {
                return Route::Handshake;
            }
        }

        if text.is_empty() {
            debug!(definition_id = id, "empty response");
        } else {
            info!(definition_id = id, response = %text, "response");
        }
        Route::Response(text)
    }
}

impl NotificationHandler for Dispatcher {
    fn on_client_data(&self, notification: ClientDataNotification) {
        let _ = self.dispatch(&notification);
    }
}
