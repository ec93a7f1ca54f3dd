//! Extension points run for every decoded message.

use crate::error::Result;
use crate::message::Message;
use crate::transport::DatagramSocket;

/// Per-message hooks.
///
/// Both methods run after the response has been sent, inside the
/// pipeline's failure boundary: an `Err` or a panic is reported as a
/// [`MessageError`](crate::events::MessageError) and never stops the
/// receiver.
///
/// # Example
///
/// ```rust
/// use async_snmp_receiver::receiver::MessageHooks;
/// use async_snmp_receiver::message::Message;
/// use async_snmp_receiver::pdu::PduType;
/// use async_snmp_receiver::{Error, Result};
///
/// struct SetAudit;
///
/// impl MessageHooks for SetAudit {
///     fn process_message(&self, msg: &Message) -> Result<()> {
///         if msg.pdu.pdu_type != PduType::SetRequest {
///             return Ok(());
///         }
///         if msg.community.as_ref() != b"private" {
///             return Err(Error::hook("SET with read-only community"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait MessageHooks: Send + Sync {
    /// Enrich a message before it is published. `socket` is the reply
    /// socket supplied with the datagram, if any.
    fn augment_message(
        &self,
        _message: &mut Message,
        _socket: Option<&dyn DatagramSocket>,
    ) -> Result<()> {
        Ok(())
    }

    /// Act on a message after it is published.
    fn process_message(&self, message: &Message) -> Result<()> {
        tracing::debug!(target: "async_snmp_receiver::receiver", { snmp.pdu_type = %message.pdu.pdu_type, snmp.request_id = message.pdu.request_id }, "ignoring PDU of inappropriate type {}", message.pdu.pdu_type);
        Ok(())
    }
}

/// Hooks that do nothing beyond the default logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl MessageHooks for DefaultHooks {}
