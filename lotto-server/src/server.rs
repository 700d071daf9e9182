//! TCP listener and per-connection request loop.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use lotto::Cancel;
use lotto_proto::{FIELD_DELIM, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

use crate::lottery::Lottery;

/// Default winning number.
pub const DEFAULT_WINNING_NUMBER: u32 = 7574;

/// Server settings.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen: String,
    /// Agencies that must finish before the draw.
    pub agencies: usize,
    /// A bet wins when its number equals this.
    pub winning_number: u32,
}

impl ServerConfig {
    /// Creates a configuration with the default winning number.
    pub fn new(listen: impl Into<String>, agencies: usize) -> Self {
        Self {
            listen: listen.into(),
            agencies,
            winning_number: DEFAULT_WINNING_NUMBER,
        }
    }

    /// Sets the winning number.
    #[must_use]
    pub const fn winning_number(mut self, number: u32) -> Self {
        self.winning_number = number;
        self
    }
}

/// A bound aggregation server.
#[derive(Debug)]
pub struct Server {
    /// Accepting socket.
    listener: TcpListener,
    /// State shared with every connection.
    lottery: Arc<Lottery>,
}

impl Server {
    /// Binds the listening socket.
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        if config.agencies == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "expected agency count must be at least 1",
            ));
        }
        let listener = TcpListener::bind(&config.listen).await?;
        tracing::info!(
            action = "listen",
            result = "success",
            addr = %listener.local_addr()?,
            agencies = config.agencies
        );
        Ok(Self {
            listener,
            lottery: Arc::new(Lottery::new(config.agencies, config.winning_number)),
        })
    }

    /// Address actually bound, useful with port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The shared lottery state.
    pub fn lottery(&self) -> Arc<Lottery> {
        Arc::clone(&self.lottery)
    }

    /// Accepts connections until `cancel` fires.
    ///
    /// Each connection runs on its own task and is dropped on cancellation.
    pub async fn run(self, cancel: &Cancel) -> io::Result<()> {
        loop {
            let accepted = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };
            let (stream, peer) = match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(action = "accept_connections", result = "fail", error = %e);
                    continue;
                }
            };
            tracing::debug!(action = "accept_connections", result = "success", %peer);

            let lottery = Arc::clone(&self.lottery);
            let cancel = cancel.clone();
            tokio::spawn(async move {
                match cancel.run(session(stream, &lottery)).await {
                    Ok(Err(e)) => {
                        tracing::warn!(action = "client_session", result = "fail", %peer, error = %e);
                    }
                    Ok(Ok(())) | Err(_) => {}
                }
                tracing::debug!(action = "closing_client_connection", result = "success", %peer);
            });
        }
        tracing::info!(action = "server_shutdown", result = "success");
        Ok(())
    }
}

/// Serves one connection until the peer closes it.
async fn session(mut stream: TcpStream, lottery: &Lottery) -> lotto_proto::Result<()> {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(action = "set_nodelay", result = "fail", error = %e);
    }
    serve(&mut stream, lottery).await
}

/// Request/response loop over any byte stream.
///
/// A frame that cannot be decoded gets a failure response carrying the
/// reason, then the connection is closed.
pub(crate) async fn serve<S>(stream: &mut S, lottery: &Lottery) -> lotto_proto::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + ?Sized,
{
    loop {
        let msg = match lotto_proto::recv(stream).await {
            Ok(msg) => msg,
            Err(lotto_proto::Error::ConnectionClosed) => return Ok(()),
            Err(e) if e.is_transport() => return Err(e),
            Err(e) => {
                tracing::warn!(action = "receive_message", result = "fail", error = %e);
                lotto_proto::send(stream, &Response::fail(reason(&e)).into()).await?;
                return Ok(());
            }
        };
        let reply = lottery.handle(msg);
        lotto_proto::send(stream, &reply).await?;
    }
}

/// Failure text safe to carry in a response, whose message field cannot
/// contain the field delimiter.
fn reason(err: &lotto_proto::Error) -> String {
    err.to_string().replace(FIELD_DELIM, "/")
}
