//! Session state machine.
//!
//! ```text
//! Unauthenticated ──auth ok──► Authenticated
//!        │                           │
//!        └──── rejected / close ─────┴──► Closed
//! ```
//!
//! The session also remembers the one authentication attempt that may be
//! outstanding and the instant it expires, so that the connection can settle it
//! exactly once: on the response or on the deadline, whichever comes first.

use std::fmt;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticated => "authenticated",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// The outstanding authentication request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthAttempt {
    pub id: i32,
    pub deadline: Instant,
}

/// Result of feeding an AUTH_RESPONSE into the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Password accepted; `attempt` is the request that is now settled
    Accepted { attempt: i32 },
    /// Negative id: password refused. The connection must be closed whether or
    /// not an attempt was outstanding.
    Rejected { attempt: Option<i32> },
    /// A non-negative response with no attempt waiting (late or duplicate)
    Unsolicited,
}

#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    pending: Option<AuthAttempt>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn pending_auth(&self) -> Option<AuthAttempt> {
        self.pending
    }

    /// Deadline of the outstanding attempt, if any
    pub fn auth_deadline(&self) -> Option<Instant> {
        self.pending.map(|attempt| attempt.deadline)
    }

    /// Check that a new authentication may start
    pub fn can_authenticate(&self) -> Result<()> {
        match self.state {
            SessionState::Authenticated => Err(ProtocolError::AlreadyAuthenticated),
            SessionState::Closed => Err(ProtocolError::NotWritable),
            SessionState::Unauthenticated if self.pending.is_some() => {
                Err(ProtocolError::AuthInProgress)
            }
            SessionState::Unauthenticated => Ok(()),
        }
    }

    /// Record that an AUTH packet with `id` went out
    pub fn begin_auth(&mut self, id: i32, deadline: Instant) -> Result<()> {
        self.can_authenticate()?;
        self.pending = Some(AuthAttempt { id, deadline });
        Ok(())
    }

    /// Forget an attempt whose request never made it onto the wire
    pub fn abandon_auth(&mut self, id: i32) {
        if self.pending.is_some_and(|attempt| attempt.id == id) {
            self.pending = None;
        }
    }

    /// Apply an AUTH_RESPONSE carrying `id`
    pub fn on_auth_response(&mut self, id: i32) -> AuthOutcome {
        let attempt = self.pending.take();

        if id < 0 {
            warn!(id, "Server rejected authentication");
            self.state = SessionState::Closed;
            return AuthOutcome::Rejected {
                attempt: attempt.map(|a| a.id),
            };
        }

        match attempt {
            Some(attempt) if self.state == SessionState::Unauthenticated => {
                if attempt.id != id {
                    debug!(expected = attempt.id, got = id, "Auth response id differs from request");
                }
                self.state = SessionState::Authenticated;
                AuthOutcome::Accepted {
                    attempt: attempt.id,
                }
            }
            _ => AuthOutcome::Unsolicited,
        }
    }

    /// Expire the outstanding attempt if its deadline has passed
    pub fn expire_auth(&mut self, now: Instant) -> Option<i32> {
        match self.pending {
            Some(attempt) if attempt.deadline <= now => {
                self.pending = None;
                Some(attempt.id)
            }
            _ => None,
        }
    }

    /// Only an authenticated session may run commands
    pub fn ensure_authenticated(&self) -> Result<()> {
        match self.state {
            SessionState::Authenticated => Ok(()),
            SessionState::Unauthenticated => Err(ProtocolError::NotAuthenticated),
            SessionState::Closed => Err(ProtocolError::NotWritable),
        }
    }

    /// Terminal transition; returns the attempt that was still waiting, if any
    pub fn close(&mut self) -> Option<i32> {
        self.state = SessionState::Closed;
        self.pending.take().map(|attempt| attempt.id)
    }
}
