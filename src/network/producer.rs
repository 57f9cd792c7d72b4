use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::common::Message;
use crate::error::SendError;

/// Turns form submissions into datagrams for the listener.
///
/// Fire-and-forget: nothing confirms that the listener received or stored
/// the message.
#[derive(Debug, Clone)]
pub struct Producer {
    target: SocketAddr,
}

impl Producer {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }

    pub async fn submit(
        &self,
        username: Option<String>,
        message: Option<String>,
    ) -> Result<Message, SendError> {
        let message = Message::new(username, message);
        let payload = message.encode()?;

        let socket = UdpSocket::bind(self.local_bind_addr())
            .await
            .map_err(SendError::Socket)?;
        socket
            .send_to(&payload, self.target)
            .await
            .map_err(|source| SendError::Send {
                addr: self.target,
                source,
            })?;

        log::debug!(
            "Sent {} byte datagram from {} to {}",
            payload.len(),
            message.username,
            self.target
        );
        Ok(message)
    }

    fn local_bind_addr(&self) -> SocketAddr {
        match self.target {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        }
    }
}
