//! peerseek - trackerless peer discovery over the BitTorrent mainline DHT
//!
//! Given a 20-byte info hash, `peerseek` runs a [BEP-5] `get_peers` search:
//! it seeds a queue with well-known bootstrap routers, asks each node for
//! peers serving the hash, and recursively asks any nodes it learns about,
//! until the requested number of peers is found, a timeout fires, or the
//! search is stopped. It is a read-only lookup client: it never announces
//! itself and keeps no routing table between runs.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 bencode encoding/decoding (the wire codec)
//! - [`compact`] - compact node/peer address encoding
//! - [`transport`] - fire-and-forget UDP datagram transport
//! - [`lookup`] - the discovery engine itself
//!
//! See [`DiscoveryEngine`] for a usage example.
//!
//! [BEP-5]: http://bittorrent.org/beps/bep_0005.html

pub mod bencode;
pub mod compact;
pub mod lookup;
pub mod transport;

pub use bencode::{decode, encode, BencodeError, Value};
pub use lookup::{
    DiscoveryEngine, DiscoveryEvent, FinishReason, InfoHash, LookupError, NodeId, Phase,
    BOOTSTRAP_NODES,
};
pub use transport::{Transport, UdpTransport};
