//! Query dispatch and response matching. The only part of the lookup that
//! touches the wire.

use super::id::{InfoHash, NodeId};
use super::message;
use crate::compact;
use crate::transport::Transport;
use bytes::Bytes;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// An outstanding `get_peers` query. Never retried: an unresponsive node
/// is simply left behind while the search moves on, and the entry is
/// abandoned when the engine stops.
struct PendingQuery {
    addr: SocketAddr,
    sent_at: Instant,
}

/// Addresses decoded out of one matched response.
pub(crate) struct ResponseLists {
    pub nodes: Vec<SocketAddr>,
    pub peers: Vec<SocketAddr>,
}

pub(crate) struct QueryScheduler {
    node_id: NodeId,
    info_hash: InfoHash,
    transport: Arc<dyn Transport>,
    pending: HashMap<Bytes, PendingQuery>,
    // Wrapping counter; two bytes on the wire. Each in-flight query gets
    // its own id so responses can be told apart.
    next_tid: u16,
}

impl QueryScheduler {
    pub(crate) fn new(node_id: NodeId, info_hash: InfoHash, transport: Arc<dyn Transport>) -> Self {
        Self {
            node_id,
            info_hash,
            transport,
            pending: HashMap::new(),
            next_tid: 0,
        }
    }

    /// Sends a `get_peers` query and records the pending transaction.
    pub(crate) fn send(&mut self, addr: SocketAddr) {
        let tid = self.next_transaction_id();
        let payload = message::encode_get_peers(&tid, &self.node_id, &self.info_hash);

        trace!(%addr, tid = ?tid, "sending get_peers");
        self.pending.insert(
            tid,
            PendingQuery {
                addr,
                sent_at: Instant::now(),
            },
        );
        self.transport.send_to(&payload, addr);
    }

    /// Decodes a datagram and matches it against a pending query.
    ///
    /// Returns `None` for anything unusable: undecodable bytes, non-response
    /// messages, and transaction ids with no pending query (stale, spoofed,
    /// or duplicate responses). None of these are errors worth surfacing.
    pub(crate) fn match_response(&mut self, data: &[u8], from: SocketAddr) -> Option<ResponseLists> {
        let reply = match message::parse_reply(data) {
            Ok(reply) => reply,
            Err(e) => {
                debug!(%from, error = %e, "dropping undecodable datagram");
                return None;
            }
        };

        let Some(query) = self.pending.remove(&reply.transaction_id) else {
            debug!(%from, "dropping response with unknown transaction id");
            return None;
        };

        trace!(
            %from,
            queried = %query.addr,
            elapsed = ?query.sent_at.elapsed(),
            "matched response"
        );

        Some(ResponseLists {
            nodes: compact::parse_node_addrs(&reply.compact_nodes),
            peers: reply
                .compact_peers
                .iter()
                .filter_map(|entry| {
                    let addr = compact::parse_addr(entry);
                    if addr.is_none() {
                        trace!(%from, len = entry.len(), "skipping malformed compact peer");
                    }
                    addr
                })
                .collect(),
        })
    }

    /// Drops all pending queries. Called on stop; responses arriving
    /// afterwards no longer match anything.
    pub(crate) fn abandon_all(&mut self) {
        if !self.pending.is_empty() {
            debug!(abandoned = self.pending.len(), "abandoning in-flight queries");
        }
        self.pending.clear();
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn next_transaction_id(&mut self) -> Bytes {
        self.next_tid = self.next_tid.wrapping_add(1);
        Bytes::copy_from_slice(&self.next_tid.to_be_bytes())
    }
}
