//! # In-flight Table and Response Reassembly
//!
//! Command output can span any number of RESPONSE_VALUE packets and the
//! protocol never marks the last one. The client therefore follows every
//! EXEC_COMMAND (real id `R`) with an empty RESPONSE_VALUE carrying a second,
//! auxiliary id `A`. Servers answer requests in order, so once a packet with id
//! `A` and the [`COMPLETION_MARKER`] body shows up, everything for `R` has
//! arrived.
//!
//! All request state sits in one table keyed by id. A command owns two slots:
//! its own entry holding the accumulated body and continuation, and an ack
//! entry pointing back at it. Both are removed together, and both count as
//! taken for id allocation.
//!
//! The table is generic over the continuation type so the bookkeeping can be
//! exercised without a runtime; the connection stores oneshot senders here.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::core::packet::{PacketType, COMPLETION_MARKER};
use crate::error::{ProtocolError, Result};
use crate::protocol::ids;

#[derive(Debug)]
enum Entry<C> {
    Auth {
        continuation: C,
    },
    Command {
        body: String,
        ack: i32,
        continuation: C,
    },
    Ack {
        request: i32,
        request_type: PacketType,
    },
}

/// What a RESPONSE_VALUE packet did to the table
#[derive(Debug)]
pub enum Reassembly<C> {
    /// The command finished; its entries are gone and the body is complete
    Complete {
        request: i32,
        body: String,
        continuation: C,
    },
    /// Body content was appended to a running command
    Appended { request: i32 },
    /// The id belongs to nothing outstanding
    Ignored,
}

/// Requests sent but not yet resolved, keyed by request id
#[derive(Debug)]
pub struct InFlightTable<C> {
    entries: HashMap<i32, Entry<C>>,
}

impl<C> Default for InFlightTable<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> InFlightTable<C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// True if `id` is held by any request or ack
    pub fn contains(&self, id: i32) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of occupied ids (a command counts twice)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Allocate one free id for an authentication request
    pub fn allocate_one(&self) -> Result<i32> {
        ids::allocate(|id| self.contains(id)).ok_or(ProtocolError::IdExhaustion)
    }

    /// Allocate a `(request, ack)` id pair for a command
    pub fn allocate_pair(&self) -> Result<(i32, i32)> {
        let request = self.allocate_one()?;
        let ack = ids::allocate(|id| id == request || self.contains(id))
            .ok_or(ProtocolError::IdExhaustion)?;
        Ok((request, ack))
    }

    pub fn insert_auth(&mut self, id: i32, continuation: C) {
        debug_assert!(!self.contains(id));
        self.entries.insert(id, Entry::Auth { continuation });
    }

    /// Track a command under `request` and its completion probe under `ack`
    pub fn insert_command(&mut self, request: i32, ack: i32, continuation: C) {
        debug_assert!(request != ack && !self.contains(request) && !self.contains(ack));
        self.entries.insert(
            request,
            Entry::Command {
                body: String::new(),
                ack,
                continuation,
            },
        );
        self.entries.insert(
            ack,
            Entry::Ack {
                request,
                request_type: PacketType::ExecCommand,
            },
        );
    }

    /// Remove the authentication request stored under `id`
    pub fn take_auth(&mut self, id: i32) -> Option<C> {
        match self.entries.remove(&id) {
            Some(Entry::Auth { continuation }) => Some(continuation),
            Some(other) => {
                self.entries.insert(id, other);
                None
            }
            None => None,
        }
    }

    /// Remove a command and its ack without completing it
    pub fn take_command(&mut self, request: i32) -> Option<C> {
        match self.entries.remove(&request) {
            Some(Entry::Command {
                ack, continuation, ..
            }) => {
                self.entries.remove(&ack);
                Some(continuation)
            }
            Some(other) => {
                self.entries.insert(request, other);
                None
            }
            None => None,
        }
    }

    /// Feed one RESPONSE_VALUE packet into the table.
    ///
    /// Packets for a command's own id or for its ack id are appended verbatim,
    /// in the order they are fed. The marker on the ack id completes the
    /// command. Anything else is ignored.
    pub fn on_response_value(&mut self, id: i32, body: &str) -> Reassembly<C> {
        let (request, is_ack) = match self.entries.get(&id) {
            Some(Entry::Command { .. }) => (id, false),
            Some(Entry::Ack {
                request,
                request_type,
            }) => {
                trace!(ack = id, request, ?request_type, "Response on ack id");
                (*request, true)
            }
            Some(Entry::Auth { .. }) | None => return Reassembly::Ignored,
        };

        if is_ack && body == COMPLETION_MARKER {
            self.entries.remove(&id);
            return match self.entries.remove(&request) {
                Some(Entry::Command {
                    body, continuation, ..
                }) => {
                    debug!(request, bytes = body.len(), "Command response complete");
                    Reassembly::Complete {
                        request,
                        body,
                        continuation,
                    }
                }
                Some(other) => {
                    self.entries.insert(request, other);
                    Reassembly::Ignored
                }
                None => Reassembly::Ignored,
            };
        }

        match self.entries.get_mut(&request) {
            Some(Entry::Command { body: acc, .. }) => {
                acc.push_str(body);
                Reassembly::Appended { request }
            }
            _ => Reassembly::Ignored,
        }
    }

    /// Empty the table, yielding every continuation still waiting
    pub fn drain(&mut self) -> Vec<C> {
        self.entries
            .drain()
            .filter_map(|(_, entry)| match entry {
                Entry::Auth { continuation } | Entry::Command { continuation, .. } => {
                    Some(continuation)
                }
                Entry::Ack { .. } => None,
            })
            .collect()
    }
}
