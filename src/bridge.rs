//! Restricted messaging surface between the UI layer and the host side.
//!
//! The UI gains exactly five verbs: `send`, `on`, `once`, `remove_listener`,
//! `remove_all_listeners`. Nothing else crosses this boundary. Payloads are
//! opaque JSON values; channel names must be on the allow-list given at
//! construction, and a verb on any other channel is rejected.
//!
//! The host side drains `send` envelopes from the receiver returned by
//! [`HostBridge::new`] and delivers inbound traffic with
//! [`HostBridge::emit`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::BridgeError;

/// One message crossing the bridge in either direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub channel: String,
    pub args: Vec<Value>,
}

/// Handle identifying a registered listener, for `remove_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn Fn(&[Value]) + Send + Sync>;

struct Registration {
    id: ListenerId,
    once: bool,
    listener: Listener,
}

pub struct HostBridge {
    allowed: Vec<String>,
    listeners: Mutex<HashMap<String, Vec<Registration>>>,
    next_id: AtomicU64,
    outbound: mpsc::UnboundedSender<Envelope>,
}

impl HostBridge {
    /// Build a bridge carrying only the given channels. Returns the bridge
    /// and the host-side receiver for `send` envelopes.
    pub fn new<I, S>(allowed: I) -> (Self, mpsc::UnboundedReceiver<Envelope>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (outbound, rx) = mpsc::unbounded_channel();
        let bridge = Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            outbound,
        };
        (bridge, rx)
    }

    fn check(&self, channel: &str) -> Result<(), BridgeError> {
        if self.allowed.iter().any(|c| c == channel) {
            Ok(())
        } else {
            Err(BridgeError::ChannelNotAllowed(channel.to_string()))
        }
    }

    /// UI → host. The envelope is queued for the host drain task.
    pub fn send(&self, channel: &str, args: Vec<Value>) -> Result<(), BridgeError> {
        self.check(channel)?;
        self.outbound
            .send(Envelope {
                channel: channel.to_string(),
                args,
            })
            .map_err(|_| BridgeError::HostClosed)
    }

    /// Register a listener for host traffic on `channel`.
    pub fn on<F>(&self, channel: &str, listener: F) -> Result<ListenerId, BridgeError>
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.register(channel, listener, false)
    }

    /// Like `on`, but the listener is dropped after its first delivery.
    pub fn once<F>(&self, channel: &str, listener: F) -> Result<ListenerId, BridgeError>
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.register(channel, listener, true)
    }

    fn register<F>(&self, channel: &str, listener: F, once: bool) -> Result<ListenerId, BridgeError>
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.check(channel)?;
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut map = self.listeners.lock().map_err(|_| BridgeError::HostClosed)?;
        map.entry(channel.to_string()).or_default().push(Registration {
            id,
            once,
            listener: Box::new(listener),
        });
        Ok(id)
    }

    /// Remove one listener by its handle. No-op when already removed.
    pub fn remove_listener(&self, channel: &str, id: ListenerId) {
        if let Ok(mut map) = self.listeners.lock() {
            if let Some(regs) = map.get_mut(channel) {
                regs.retain(|r| r.id != id);
            }
        }
    }

    /// Remove every listener on `channel`.
    pub fn remove_all_listeners(&self, channel: &str) {
        if let Ok(mut map) = self.listeners.lock() {
            map.remove(channel);
        }
    }

    /// Host → UI. Delivers `args` to each listener registered on `channel`,
    /// dropping `once` listeners after the call. Listeners registered during
    /// dispatch are delivered from the next emit onward.
    pub fn emit(&self, channel: &str, args: &[Value]) {
        let regs = match self.listeners.lock() {
            Ok(mut map) => map.remove(channel),
            Err(_) => None,
        };
        let Some(mut regs) = regs else {
            return;
        };

        let mut keep = Vec::with_capacity(regs.len());
        for reg in regs.drain(..) {
            (reg.listener)(args);
            if !reg.once {
                keep.push(reg);
            }
        }

        if let Ok(mut map) = self.listeners.lock() {
            let entry = map.entry(channel.to_string()).or_default();
            let added = std::mem::take(entry);
            *entry = keep;
            entry.extend(added);
        }
    }
}
