use std::sync::Arc;

use bytes::Bytes;

use crate::error::Result;

/// A change notification for a subscribed byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDataNotification {
    /// Request id given when subscribing.
    pub request_id: u32,
    /// Definition id describing the delivered range.
    pub definition_id: u32,
    /// Raw bytes of the defined range.
    pub data: Bytes,
}

/// Receives the unified notification stream of a transport.
///
/// Called from the transport's delivery context. Implementations must not
/// block and must not call back into the transport.
pub trait NotificationHandler: Send + Sync {
    /// Handle one notification.
    fn on_client_data(&self, notification: ClientDataNotification);
}

impl<F> NotificationHandler for F
where
    F: Fn(ClientDataNotification) + Send + Sync,
{
    fn on_client_data(&self, notification: ClientDataNotification) {
        self(notification)
    }
}

/// Client data area operations of the simulation interface.
///
/// Areas are addressed by numeric ids after a name has been bound to them.
/// Definitions are connection-wide and describe one byte range each.
pub trait ClientDataTransport: Send + Sync {
    /// Map a symbolic area name to a numeric area id.
    fn bind_area(&self, area_name: &str, area_id: u32) -> Result<()>;

    /// Create the area behind a bound id with a fixed size in bytes.
    fn create_area(&self, area_id: u32, size: usize) -> Result<()>;

    /// Register a byte range definition.
    fn define_range(&self, definition_id: u32, offset: u32, size: usize) -> Result<()>;

    /// Ask for a notification whenever the defined range of the area changes.
    ///
    /// Delivery is on write ("on set"), filtered to actual changes; there is
    /// no periodic interval.
    fn subscribe_changes(&self, area_id: u32, request_id: u32, definition_id: u32) -> Result<()>;

    /// Write bytes into the defined range of an area.
    fn write_area(&self, area_id: u32, definition_id: u32, data: &[u8]) -> Result<()>;

    /// Install the single handler receiving every notification.
    fn set_notification_handler(&self, handler: Arc<dyn NotificationHandler>);

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}
