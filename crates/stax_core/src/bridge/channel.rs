//! Fire-and-forget transport between sandbox instances and the host.
//!
//! Each instance gets its own `BridgeSender`; all senders feed one host-side
//! receiver. Order is preserved per sender; nothing is acknowledged or retried.

use crate::bridge::message::{decode_payload, BridgeEnvelope, BridgeMessage};
use crate::model::app::AppId;
use log::debug;
use std::sync::mpsc::{self, Receiver, Sender};

/// Host end of the bridge.
#[derive(Debug)]
pub struct BridgeHub {
    tx: Sender<BridgeEnvelope>,
    rx: Receiver<BridgeEnvelope>,
}

impl Default for BridgeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeHub {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Creates the sandbox-side sender for `instance`.
    pub fn sender_for(&self, instance: &AppId) -> BridgeSender {
        BridgeSender {
            instance: instance.clone(),
            tx: self.tx.clone(),
        }
    }

    /// Takes every envelope queued so far, in arrival order.
    pub fn drain(&self) -> Vec<BridgeEnvelope> {
        self.rx.try_iter().collect()
    }
}

/// Sandbox end of the bridge, bound to one instance.
#[derive(Debug, Clone)]
pub struct BridgeSender {
    instance: AppId,
    tx: Sender<BridgeEnvelope>,
}

impl BridgeSender {
    pub fn instance(&self) -> &AppId {
        &self.instance
    }

    /// Sends one message; a vanished host is ignored.
    pub fn send(&self, message: BridgeMessage) {
        let envelope = BridgeEnvelope {
            instance: self.instance.clone(),
            message,
        };
        if self.tx.send(envelope).is_err() {
            debug!(
                "event=bridge_send module=bridge status=dropped instance={} reason=host_gone",
                self.instance
            );
        }
    }

    /// Decodes and sends a JSON payload posted by the bootstrap script.
    ///
    /// The envelope instance is always this sender's instance, whatever id the
    /// payload claims. Undecodable payloads are dropped; returns whether one was sent.
    pub fn post_json(&self, payload: &str) -> bool {
        match decode_payload(payload) {
            Ok(envelope) => {
                self.send(envelope.message);
                true
            }
            Err(err) => {
                debug!(
                    "event=bridge_decode module=bridge status=dropped instance={} error={}",
                    self.instance, err
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BridgeHub;
    use crate::bridge::message::{BridgeMessage, LogLevel};
    use crate::model::app::AppId;

    #[test]
    fn preserves_order_per_sender() {
        let hub = BridgeHub::new();
        let sender = hub.sender_for(&AppId::new("a"));
        for index in 0..5 {
            sender.send(BridgeMessage::Log {
                level: LogLevel::Info,
                text: format!("line {index}"),
            });
        }

        let texts: Vec<String> = hub
            .drain()
            .into_iter()
            .map(|envelope| match envelope.message {
                BridgeMessage::Log { text, .. } => text,
                other => panic!("unexpected message {other:?}"),
            })
            .collect();
        assert_eq!(texts, vec!["line 0", "line 1", "line 2", "line 3", "line 4"]);
        assert!(hub.drain().is_empty());
    }

    #[test]
    fn post_json_stamps_sender_instance() {
        let hub = BridgeHub::new();
        let sender = hub.sender_for(&AppId::new("real"));
        assert!(sender.post_json(r#"{"type":"contextmenu","x":1,"y":2,"id":"spoofed"}"#));
        assert!(!sender.post_json("{"));

        let envelopes = hub.drain();
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].instance.as_str(), "real");
    }
}
