//! Routing bookkeeping: which nodes have been seen, which peers have been
//! found. Pure state transitions, no network or encoding knowledge.

use std::collections::HashSet;
use std::net::SocketAddr;

/// Hard ceiling on remembered node addresses. Caps memory and limits the
/// amplification a malicious responder gets from flooding node lists.
pub(crate) const MAX_KNOWN_NODES: usize = 5000;

/// What to do with a freshly reported node address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeDecision {
    /// Unseen and the search still wants peers: query it immediately.
    QueryNow,
    /// Unseen but the budget is satisfied: hold it for a later search.
    Enqueue,
    /// Already known, or the node ceiling is reached.
    Discard,
}

pub(crate) struct RoutingState {
    known: HashSet<SocketAddr>,
    peers: HashSet<SocketAddr>,
}

impl RoutingState {
    pub(crate) fn new() -> Self {
        Self {
            known: HashSet::new(),
            peers: HashSet::new(),
        }
    }

    /// Classifies a node address from a response.
    ///
    /// `needs_peers` biases accepted nodes toward an immediate query while
    /// the current request is still short of its budget.
    pub(crate) fn observe_node(&mut self, addr: SocketAddr, needs_peers: bool) -> NodeDecision {
        if self.known.contains(&addr) || self.known.len() >= MAX_KNOWN_NODES {
            return NodeDecision::Discard;
        }
        self.known.insert(addr);
        if needs_peers {
            NodeDecision::QueryNow
        } else {
            NodeDecision::Enqueue
        }
    }

    /// Records a peer address; returns whether it was new. Idempotent.
    pub(crate) fn observe_peer(&mut self, addr: SocketAddr) -> bool {
        self.peers.insert(addr)
    }

    /// Records an address queried directly off the queue (bootstrap seeds
    /// included). Returns false when the node ceiling blocks a new entry,
    /// in which case the send is declined.
    pub(crate) fn note_queried(&mut self, addr: SocketAddr) -> bool {
        if self.known.contains(&addr) {
            return true;
        }
        if self.known.len() >= MAX_KNOWN_NODES {
            return false;
        }
        self.known.insert(addr);
        true
    }

    pub(crate) fn is_known(&self, addr: &SocketAddr) -> bool {
        self.known.contains(addr)
    }

    pub(crate) fn at_capacity(&self) -> bool {
        self.known.len() >= MAX_KNOWN_NODES
    }

    pub(crate) fn node_count(&self) -> usize {
        self.known.len()
    }

    pub(crate) fn peer_count(&self) -> usize {
        self.peers.len()
    }
}
