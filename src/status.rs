//! Remote status display publishing.
//!
//! State changes are mirrored to a display node as one-way UDP datagrams
//! of the form `<node>/<path>/set:<value>`. Delivery is best-effort: the
//! display is cosmetic and must never stall the transport.

use std::net::UdpSocket;

use anyhow::{Context, Result};
use tracing::trace;

/// Observer for state-change notifications. Registered once at startup
/// and called unconditionally; implementations must not block.
pub trait StatusPublisher {
    fn publish(&self, path: &str, value: &str);
}

impl StatusPublisher for Box<dyn StatusPublisher> {
    fn publish(&self, path: &str, value: &str) {
        (**self).publish(path, value);
    }
}

/// Publisher that does nothing, used when the status display is disabled.
pub struct NullPublisher;

impl StatusPublisher for NullPublisher {
    fn publish(&self, _path: &str, _value: &str) {}
}

/// UDP datagram publisher for the display node.
pub struct UdpPublisher {
    socket: UdpSocket,
    target: String,
    node: String,
}

impl UdpPublisher {
    pub fn new(host: &str, port: u16, node: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").context("can't bind UDP status socket")?;
        Ok(Self {
            socket,
            target: format!("{host}:{port}"),
            node: node.to_string(),
        })
    }
}

impl StatusPublisher for UdpPublisher {
    fn publish(&self, path: &str, value: &str) {
        let message = format!("{}/{path}/set:{value}", self.node);
        trace!("status: {message}");
        // Best-effort, no retry.
        let _ = self.socket.send_to(message.as_bytes(), &self.target);
    }
}
