use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::session::SessionState;
use crate::service::connection::{Command, Connection, Reply};
use crate::transport::tcp;
use crate::utils::metrics::{Metrics, MetricsSnapshot};

/// Commands queued for the connection task before senders wait
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Handle to one RCON connection.
///
/// Cloning is cheap and every clone talks to the same connection, so several
/// tasks can run commands concurrently; each gets its own request id and
/// its own response.
///
/// # Example
/// ```no_run
/// use rcon_protocol::{ClientConfig, RconClient};
///
/// # async fn run() -> rcon_protocol::Result<()> {
/// let client = RconClient::connect(ClientConfig::new("127.0.0.1", 27015)).await?;
/// client.authenticate("hunter2").await?;
/// let status = client.execute("status").await?;
/// println!("{status}");
/// client.disconnect().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RconClient {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
    metrics: Arc<Metrics>,
}

impl RconClient {
    /// Connect over TCP and start the connection task
    #[instrument(skip(config), fields(address = %config.address()))]
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let stream = tcp::connect(&config).await?;
        Ok(Self::from_stream(stream, &config))
    }

    /// Run the protocol over an already open stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_stream<T>(stream: T, config: &ClientConfig) -> Self
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (commands, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (state_tx, state) = watch::channel(SessionState::Unauthenticated);
        let metrics = Arc::new(Metrics::new());

        let connection = Connection::new(stream, config, rx, state_tx, Arc::clone(&metrics));
        tokio::spawn(connection.run());

        Self {
            commands,
            state,
            metrics,
        }
    }

    /// Log in with the server's RCON password.
    ///
    /// Fails with `AuthRejected` (and the connection is closed) if the server
    /// refuses the password, or `AuthTimeout` if it does not answer in time.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, password: &str) -> Result<()> {
        let password = password.to_string();
        self.request(|reply| Command::Authenticate { password, reply })
            .await
            .map(|_| ())
    }

    /// Run a command and return its full output, however many packets it
    /// spans
    #[instrument(skip(self))]
    pub async fn execute(&self, command: &str) -> Result<String> {
        let command = command.to_string();
        self.request(|reply| Command::Execute { command, reply })
            .await
    }

    /// Close the connection.
    ///
    /// Every request still waiting fails with `TransportError`. Returns once
    /// the socket is shut down; an error while closing it is returned here.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Disconnect { reply }).await.is_err() {
            debug!("Already disconnected");
            return Ok(());
        }
        rx.await.unwrap_or(Ok(()))
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }

    /// Wait until the session reaches `target`, or return early once it is
    /// closed
    pub async fn wait_for_state(&self, target: SessionState) -> SessionState {
        let mut state = self.state.clone();
        let reached = match state
            .wait_for(|s| *s == target || *s == SessionState::Closed)
            .await
        {
            Ok(current) => *current,
            Err(_) => SessionState::Closed,
        };
        reached
    }

    /// Traffic and session counters for this connection
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn request<F>(&self, build: F) -> Result<String>
    where
        F: FnOnce(Reply) -> Command,
    {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(build(reply))
            .await
            .map_err(|_| ProtocolError::NotWritable)?;
        rx.await
            .map_err(|_| ProtocolError::TransportError(constants::ERR_ENGINE_GONE.into()))?
    }
}
