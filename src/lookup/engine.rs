use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, trace, warn};

use super::error::LookupError;
use super::id::{InfoHash, NodeId};
use super::scheduler::QueryScheduler;
use super::state::{NodeDecision, RoutingState};
use crate::transport::Transport;

/// Well-known routers used to enter the network with no prior routing
/// knowledge.
pub const BOOTSTRAP_NODES: &[&str] = &[
    "dht.transmissionbt.com:6881",
    "router.bittorrent.com:6881",
    "router.utorrent.com:6881",
];

/// Ceiling on queued-but-unqueried candidates. One burst of responses must
/// not turn into unbounded breadth expansion.
const QUEUE_SOFT_CAP: usize = 50;

/// Where the engine is in its lifecycle. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, no search started yet.
    Idle,
    /// A search is in progress and still wants more peers.
    Searching,
    /// The requested peer count has been met; no new queries go out, but
    /// the engine keeps processing responses until stopped.
    Satisfied,
    /// Stopped explicitly or by timeout. Inert from here on.
    Stopped,
}

/// Why the engine finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// The requested number of peers was found.
    Satisfied,
    /// The `search` timeout fired first.
    TimedOut,
    /// [`DiscoveryEngine::stop`] was called.
    Stopped,
}

/// Notifications emitted while a search runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A previously unseen peer claims to serve the info hash.
    PeerFound {
        info_hash: InfoHash,
        addr: SocketAddr,
    },
    /// The engine reached `Stopped`. Emitted exactly once.
    Finished(FinishReason),
}

struct Shared {
    state: RoutingState,
    scheduler: QueryScheduler,
    /// Candidates not yet queried, drained most-recently-added first.
    queue: Vec<SocketAddr>,
    /// Distinct peers still needed to satisfy the current request.
    missing: usize,
    phase: Phase,
}

/// A `get_peers` search for one info hash.
///
/// The engine is reactive: [`search`](Self::search) fires the initial
/// queries and returns, responses flow in through
/// [`handle_datagram`](Self::handle_datagram) (usually via
/// [`run`](Self::run)), and discovered peers are delivered on the event
/// channel returned by the constructor.
///
/// # Examples
///
/// ```no_run
/// use peerseek::{DiscoveryEngine, DiscoveryEvent, InfoHash, UdpTransport};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Arc::new(UdpTransport::bind(6881).await?);
/// let socket = transport.socket();
///
/// let info_hash = InfoHash::from_hex("0123456789abcdef0123456789abcdef01234567")?;
/// let (engine, mut events) = DiscoveryEngine::new(info_hash, transport);
///
/// engine.bootstrap().await;
///
/// let runner = Arc::clone(&engine);
/// tokio::spawn(async move { runner.run(&socket).await });
///
/// engine.search(8, Duration::from_secs(30));
///
/// while let Some(event) = events.recv().await {
///     match event {
///         DiscoveryEvent::PeerFound { addr, .. } => println!("peer: {addr}"),
///         DiscoveryEvent::Finished(reason) => {
///             println!("done: {reason:?}");
///             break;
///         }
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct DiscoveryEngine {
    info_hash: InfoHash,
    shared: Mutex<Shared>,
    events: mpsc::UnboundedSender<DiscoveryEvent>,
    stopped: Notify,
    /// Handle for the timeout timer; never keeps the engine alive.
    me: Weak<Self>,
}

impl DiscoveryEngine {
    /// Creates an engine with a freshly generated node id.
    pub fn new(
        info_hash: InfoHash,
        transport: Arc<dyn Transport>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<DiscoveryEvent>) {
        Self::with_node_id(info_hash, NodeId::generate(), transport)
    }

    /// Creates an engine with a caller-supplied node id, for deterministic
    /// tests and custom id schemes.
    pub fn with_node_id(
        info_hash: InfoHash,
        node_id: NodeId,
        transport: Arc<dyn Transport>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<DiscoveryEvent>) {
        let (events, rx) = mpsc::unbounded_channel();

        debug!(%info_hash, %node_id, "discovery engine created");

        let engine = Arc::new_cyclic(|me| Self {
            info_hash,
            shared: Mutex::new(Shared {
                state: RoutingState::new(),
                scheduler: QueryScheduler::new(node_id, info_hash, transport),
                queue: Vec::new(),
                missing: 0,
                phase: Phase::Idle,
            }),
            events,
            stopped: Notify::new(),
            me: me.clone(),
        });

        (engine, rx)
    }

    /// Resolves the built-in bootstrap routers and seeds the queue with
    /// them. Resolution failures are logged and skipped.
    pub async fn bootstrap(&self) {
        let mut seeds = Vec::new();
        for host in BOOTSTRAP_NODES {
            match tokio::net::lookup_host(host).await {
                Ok(mut addrs) => {
                    if let Some(addr) = addrs.find(|a| a.is_ipv4()) {
                        seeds.push(addr);
                    }
                }
                Err(e) => {
                    warn!(%host, error = %e, "failed to resolve bootstrap node");
                }
            }
        }
        self.seed(&seeds);
    }

    /// Pushes candidate addresses onto the discovery queue, skipping any
    /// already queued or already queried.
    pub fn seed(&self, addrs: &[SocketAddr]) {
        let mut shared = self.shared.lock();
        if shared.phase == Phase::Stopped {
            return;
        }
        for &addr in addrs {
            if shared.queue.contains(&addr) || shared.state.is_known(&addr) {
                continue;
            }
            shared.queue.push(addr);
        }
    }

    /// Asks the network for `wanted_peers` more distinct peers.
    ///
    /// Adds to the outstanding budget (a second call while searching widens
    /// the same search rather than starting another), then drains the queue
    /// most-recently-added first until it is empty or the known-node
    /// ceiling blocks further sends.
    ///
    /// A nonzero `timeout` schedules an automatic stop, bounding how long
    /// the caller waits regardless of network responsiveness; this requires
    /// a tokio runtime. With `timeout` zero the search runs until satisfied
    /// or stopped. Calling `search` on a stopped engine does nothing.
    pub fn search(&self, wanted_peers: usize, timeout: Duration) {
        let wanted = wanted_peers.max(1);

        {
            let mut shared = self.shared.lock();
            if shared.phase == Phase::Stopped {
                debug!("search called on a stopped engine");
                return;
            }

            shared.missing += wanted;
            shared.phase = Phase::Searching;
            debug!(wanted, missing = shared.missing, "search started");

            while !shared.state.at_capacity() {
                let Some(addr) = shared.queue.pop() else {
                    break;
                };
                Self::dispatch(&mut shared, addr);
            }
        }

        if timeout > Duration::ZERO {
            let me = self.me.clone();
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(engine) = me.upgrade() {
                    engine.finish(FinishReason::TimedOut);
                }
            });
        }
    }

    /// Stops the search: abandons in-flight queries and makes the engine
    /// inert. Idempotent; late datagrams are discarded, not processed.
    pub fn stop(&self) {
        self.finish(FinishReason::Stopped);
    }

    /// Feeds one inbound datagram through the engine.
    ///
    /// Malformed input, unmatched transaction ids, and datagrams arriving
    /// after stop are all silently dropped; nothing from the network is
    /// ever surfaced as an error.
    pub fn handle_datagram(&self, data: &[u8], from: SocketAddr) {
        let mut shared = self.shared.lock();
        if shared.phase == Phase::Stopped {
            trace!(%from, "ignoring datagram after stop");
            return;
        }

        let Some(lists) = shared.scheduler.match_response(data, from) else {
            return;
        };

        for peer in lists.peers {
            if !shared.state.observe_peer(peer) {
                continue;
            }
            shared.missing = shared.missing.saturating_sub(1);
            if shared.missing == 0 && shared.phase == Phase::Searching {
                shared.phase = Phase::Satisfied;
                debug!(peers = shared.state.peer_count(), "search satisfied");
            }
            self.emit(DiscoveryEvent::PeerFound {
                info_hash: self.info_hash,
                addr: peer,
            });
        }

        for node in lists.nodes {
            let needs_peers = shared.missing > 0;
            match shared.state.observe_node(node, needs_peers) {
                NodeDecision::QueryNow => Self::dispatch(&mut shared, node),
                NodeDecision::Enqueue => {
                    if shared.queue.len() < QUEUE_SOFT_CAP {
                        shared.queue.push(node);
                    }
                }
                NodeDecision::Discard => {}
            }
        }
    }

    /// Receive loop: feeds datagrams from `socket` into the engine until
    /// it stops or the socket fails.
    pub async fn run(&self, socket: &UdpSocket) -> Result<(), LookupError> {
        let mut buf = vec![0u8; 65535];
        loop {
            tokio::select! {
                _ = self.stopped.notified() => return Ok(()),
                result = socket.recv_from(&mut buf) => {
                    let (n, from) = result?;
                    self.handle_datagram(&buf[..n], from);
                }
            }
        }
    }

    /// Distinct peers found so far.
    pub fn peers_found(&self) -> usize {
        self.shared.lock().state.peer_count()
    }

    /// Distinct node addresses seen so far (queried or discovered).
    pub fn nodes_seen(&self) -> usize {
        self.shared.lock().state.node_count()
    }

    /// Candidates waiting in the discovery queue.
    pub fn queue_depth(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Queries sent but not yet answered.
    pub fn queries_in_flight(&self) -> usize {
        self.shared.lock().scheduler.in_flight()
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    /// Sends to `addr` unless the known-node ceiling blocks it.
    fn dispatch(shared: &mut Shared, addr: SocketAddr) {
        if !shared.state.note_queried(addr) {
            trace!(%addr, "node ceiling reached, declining query");
            return;
        }
        shared.scheduler.send(addr);
    }

    /// Transitions to `Stopped` and emits the terminal event. A search
    /// that was already satisfied finishes as `Satisfied` whichever
    /// trigger got here first.
    fn finish(&self, reason: FinishReason) {
        let mut shared = self.shared.lock();
        if shared.phase == Phase::Stopped {
            return;
        }

        let reason = if shared.phase == Phase::Satisfied {
            FinishReason::Satisfied
        } else {
            reason
        };

        shared.scheduler.abandon_all();
        shared.phase = Phase::Stopped;
        drop(shared);

        debug!(?reason, "lookup finished");
        self.emit(DiscoveryEvent::Finished(reason));
        self.stopped.notify_one();
    }

    fn emit(&self, event: DiscoveryEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.events.send(event);
    }
}
