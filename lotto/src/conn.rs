//! A single TCP connection to the server.
//!
//! Every operation is bounded by the I/O timeout and raced against the
//! session's [`Cancel`] token; dropping a [`Connection`] closes the socket.

use std::time::Duration;

use lotto_proto::Message;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::cancel::Cancel;
use crate::error::{Error, Result};

/// An open connection to the aggregation server.
#[derive(Debug)]
pub(crate) struct Connection {
    /// The underlying socket.
    stream: TcpStream,
    /// Bound on each send and receive.
    io_timeout: Duration,
}

impl Connection {
    /// Dials `addr` once.
    pub(crate) async fn open(addr: &str, io_timeout: Duration, cancel: &Cancel) -> Result<Self> {
        let stream = match cancel.run(timeout(io_timeout, TcpStream::connect(addr))).await? {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(Error::Connection(e.into())),
            Err(_) => return Err(Error::timed_out("connect")),
        };
        // Frames are small and strictly request/response.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(action = "set_nodelay", result = "fail", error = %e);
        }
        Ok(Self { stream, io_timeout })
    }

    /// Writes one complete frame.
    pub(crate) async fn send(&mut self, msg: &Message, cancel: &Cancel) -> Result<()> {
        match cancel
            .run(timeout(self.io_timeout, lotto_proto::send(&mut self.stream, msg)))
            .await?
        {
            Ok(res) => res.map_err(Error::from),
            Err(_) => Err(Error::timed_out("send")),
        }
    }

    /// Reads one complete frame.
    pub(crate) async fn recv(&mut self, cancel: &Cancel) -> Result<Message> {
        match cancel
            .run(timeout(self.io_timeout, lotto_proto::recv(&mut self.stream)))
            .await?
        {
            Ok(res) => res.map_err(Error::from),
            Err(_) => Err(Error::timed_out("receive")),
        }
    }

    /// Sends `msg` and waits for exactly one reply.
    pub(crate) async fn round_trip(&mut self, msg: &Message, cancel: &Cancel) -> Result<Message> {
        self.send(msg, cancel).await?;
        self.recv(cancel).await
    }

    /// Shuts down the write half and drops the socket.
    pub(crate) async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }
}
