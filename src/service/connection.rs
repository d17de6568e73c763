//! # Connection Engine
//!
//! One task per connection owns the framed socket, the in-flight table and the
//! session. Callers never touch any of them directly; they send a [`Command`]
//! over a channel and wait on a oneshot for the answer.
//!
//! ```text
//! RconClient ─┐
//! RconClient ─┼─► mpsc<Command> ─► Connection task ◄─► Framed<T, RconCodec>
//! RconClient ─┘                      │
//!                       session / in-flight table / auth deadline
//! ```
//!
//! Commands, inbound frames and the auth deadline are handled one at a time
//! from a single `select!` loop, so table mutation needs no locking. Writes go
//! out in the order commands arrive.
//!
//! Whatever ends the connection (explicit disconnect, peer close, read error,
//! malformed frame, failed write, rejected password) fails every request still
//! waiting with `TransportError`. Commands queued after that get `NotWritable`.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::ClientConfig;
use crate::core::codec::RconCodec;
use crate::core::packet::{Packet, PacketType};
use crate::error::{constants, ProtocolError, Result};
use crate::protocol::dispatcher::{route, route_name, Route};
use crate::protocol::reassembler::{InFlightTable, Reassembly};
use crate::protocol::session::{AuthOutcome, Session, SessionState};
use crate::utils::metrics::Metrics;
use crate::utils::timeout::with_timeout;

/// Continuation for a request. Authentication resolves with an empty string.
pub(crate) type Reply = oneshot::Sender<Result<String>>;

/// Requests from client handles to the connection task
#[derive(Debug)]
pub(crate) enum Command {
    Authenticate { password: String, reply: Reply },
    Execute { command: String, reply: Reply },
    Disconnect { reply: oneshot::Sender<Result<()>> },
}

impl Command {
    fn reject(self, err: ProtocolError) {
        match self {
            Command::Authenticate { reply, .. } | Command::Execute { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            // Disconnecting a closed connection succeeds
            Command::Disconnect { reply } => {
                let _ = reply.send(Ok(()));
            }
        }
    }
}

pub(crate) struct Connection<T> {
    framed: Framed<T, RconCodec>,
    commands: mpsc::Receiver<Command>,
    table: InFlightTable<Reply>,
    session: Session,
    state_tx: watch::Sender<SessionState>,
    metrics: Arc<Metrics>,
    write_timeout: Duration,
    auth_timeout: Duration,
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(
        stream: T,
        config: &ClientConfig,
        commands: mpsc::Receiver<Command>,
        state_tx: watch::Sender<SessionState>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let codec = RconCodec::new(config.encoding, config.max_packet_size);
        Self {
            framed: Framed::new(stream, codec),
            commands,
            table: InFlightTable::new(),
            session: Session::new(),
            state_tx,
            metrics,
            write_timeout: config.timeout,
            auth_timeout: config.auth_timeout,
        }
    }

    /// Drive the connection until it closes
    #[instrument(skip(self), name = "rcon_connection")]
    pub(crate) async fn run(mut self) {
        debug!("Connection task started");

        while self.session.state() != SessionState::Closed {
            let deadline = self.session.auth_deadline();

            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Disconnect { reply }) => {
                        let result = self.shutdown().await;
                        let _ = reply.send(result);
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!("All client handles dropped");
                        if let Err(e) = self.shutdown().await {
                            debug!(error = %e, "Error closing socket");
                        }
                    }
                },
                frame = self.framed.next() => match frame {
                    Some(Ok(packet)) => self.handle_packet(packet).await,
                    Some(Err(e)) => {
                        error!(error = %e, "Inbound stream failed");
                        self.metrics.protocol_error();
                        self.close_with(&e.to_string());
                    }
                    None => {
                        info!("Connection closed by peer");
                        self.close_with(constants::ERR_PEER_CLOSED);
                    }
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.expire_auth();
                }
            }
        }

        // Nothing queued behind the close will ever be written
        self.commands.close();
        while let Ok(command) = self.commands.try_recv() {
            command.reject(ProtocolError::NotWritable);
        }
        self.close_with(constants::ERR_CONNECTION_CLOSED);
        self.metrics.log_metrics();
        debug!("Connection task stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Authenticate { password, reply } => self.authenticate(password, reply).await,
            Command::Execute { command, reply } => self.execute(command, reply).await,
            Command::Disconnect { reply } => {
                let result = self.shutdown().await;
                let _ = reply.send(result);
            }
        }
    }

    async fn authenticate(&mut self, password: String, reply: Reply) {
        self.metrics.auth_attempt();

        let mut packet = Packet::new(PacketType::Auth, 0, password);
        let prepared = self
            .session
            .can_authenticate()
            .and_then(|_| self.framed.codec().check_size(&packet))
            .and_then(|_| self.table.allocate_one());
        let id = match prepared {
            Ok(id) => id,
            Err(e) => {
                debug!(error = %e, "Authentication refused before sending");
                let _ = reply.send(Err(e));
                return;
            }
        };
        packet.id = id;

        self.table.insert_auth(id, reply);
        if let Err(e) = self.session.begin_auth(id, Instant::now() + self.auth_timeout) {
            if let Some(reply) = self.table.take_auth(id) {
                let _ = reply.send(Err(e));
            }
            return;
        }
        self.publish_state();

        debug!(id, "Sending AUTH");
        if let Err(e) = self.send(vec![packet]).await {
            self.session.abandon_auth(id);
            if let Some(reply) = self.table.take_auth(id) {
                let _ = reply.send(Err(transport_error(&e)));
            }
            self.close_with(&e.to_string());
        }
    }

    async fn execute(&mut self, command: String, reply: Reply) {
        let mut request = Packet::new(PacketType::ExecCommand, 0, command);
        let mut probe = Packet::new(PacketType::ResponseValue, 0, "");
        let codec = *self.framed.codec();

        let prepared = self
            .session
            .ensure_authenticated()
            .and_then(|_| codec.check_size(&request))
            .and_then(|_| codec.check_size(&probe))
            .and_then(|_| self.table.allocate_pair());
        let (id, ack) = match prepared {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, "Command refused before sending");
                let _ = reply.send(Err(e));
                return;
            }
        };
        request.id = id;
        probe.id = ack;

        self.table.insert_command(id, ack, reply);
        debug!(id, ack, "Sending EXEC_COMMAND with completion probe");

        match self.send(vec![request, probe]).await {
            Ok(()) => self.metrics.command_sent(),
            Err(e) => {
                if let Some(reply) = self.table.take_command(id) {
                    let _ = reply.send(Err(transport_error(&e)));
                }
                self.close_with(&e.to_string());
            }
        }
    }

    /// Write `packets` back to back and flush once
    async fn send(&mut self, packets: Vec<Packet>) -> Result<()> {
        let encoding = self.framed.codec().encoding();
        let sizes: Vec<u64> = packets
            .iter()
            .map(|packet| packet.frame_len(encoding) as u64)
            .collect();

        let framed = &mut self.framed;
        with_timeout(self.write_timeout, async move {
            for packet in packets {
                framed.feed(packet).await?;
            }
            framed.flush().await
        })
        .await?;

        for size in sizes {
            self.metrics.packet_sent(size);
        }
        Ok(())
    }

    async fn handle_packet(&mut self, packet: Packet) {
        let encoding = self.framed.codec().encoding();
        self.metrics
            .packet_received(packet.frame_len(encoding) as u64);

        let route = route(&packet);
        debug!(
            kind = %route_name(&route),
            id = packet.id,
            bytes = packet.body.len(),
            "Packet received"
        );

        match route {
            Route::Auth { id } => self.on_auth_response(id).await,
            Route::Response { id } => match self.table.on_response_value(id, &packet.body) {
                Reassembly::Complete {
                    request,
                    body,
                    continuation,
                } => {
                    self.metrics.command_completed();
                    if continuation.send(Ok(body)).is_err() {
                        debug!(request, "Caller gone before response completed");
                    }
                }
                Reassembly::Appended { request } => {
                    trace!(request, "Appended response fragment");
                }
                Reassembly::Ignored => {
                    self.metrics.packet_dropped();
                    trace!(id, "Dropped response with nothing outstanding");
                }
            },
            Route::Unknown { id, kind } => {
                self.metrics.packet_dropped();
                warn!(id, kind, "Dropped packet of unknown type");
            }
        }
    }

    async fn on_auth_response(&mut self, id: i32) {
        match self.session.on_auth_response(id) {
            AuthOutcome::Accepted { attempt } => {
                self.metrics.auth_succeeded();
                self.publish_state();
                info!(id = attempt, "Authenticated");
                if let Some(reply) = self.table.take_auth(attempt) {
                    let _ = reply.send(Ok(String::new()));
                }
            }
            AuthOutcome::Rejected { attempt } => {
                self.metrics.auth_failure();
                if let Some(reply) = attempt.and_then(|attempt| self.table.take_auth(attempt)) {
                    let _ = reply.send(Err(ProtocolError::AuthRejected));
                }
                self.close_with(constants::ERR_AUTH_REJECTED_CLOSE);
                if let Err(e) = self.framed.close().await {
                    debug!(error = %e, "Error closing socket after rejection");
                }
            }
            AuthOutcome::Unsolicited => {
                self.metrics.packet_dropped();
                debug!(id, "Ignoring auth response with no attempt outstanding");
            }
        }
    }

    fn expire_auth(&mut self) {
        if let Some(id) = self.session.expire_auth(Instant::now()) {
            self.metrics.auth_failure();
            warn!(id, "Authentication timed out");
            if let Some(reply) = self.table.take_auth(id) {
                let _ = reply.send(Err(ProtocolError::AuthTimeout));
            }
            self.publish_state();
        }
    }

    /// Explicit close: fail everything, then close the socket and report how
    /// that went
    async fn shutdown(&mut self) -> Result<()> {
        if self.session.state() == SessionState::Closed {
            return Ok(());
        }
        info!("Disconnecting");
        self.close_with(constants::ERR_CONNECTION_CLOSED);
        with_timeout(self.write_timeout, self.framed.close()).await
    }

    /// Move to `Closed` and fail every outstanding request with `reason`
    fn close_with(&mut self, reason: &str) {
        self.session.close();
        self.publish_state();

        let waiting = self.table.drain();
        if !waiting.is_empty() {
            warn!(count = waiting.len(), reason, "Failing outstanding requests");
        }
        for reply in waiting {
            let _ = reply.send(Err(ProtocolError::TransportError(reason.to_string())));
        }
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.session.state());
    }
}

fn transport_error(err: &ProtocolError) -> ProtocolError {
    match err {
        ProtocolError::Timeout => ProtocolError::Timeout,
        other => ProtocolError::TransportError(other.to_string()),
    }
}
