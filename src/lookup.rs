//! Peer lookup over the mainline DHT ([BEP-5]).
//!
//! This module implements the `get_peers` search: seed a queue with
//! well-known bootstrap routers, ask each node for peers serving the
//! target info hash, and recursively ask any nodes it returns until the
//! requested number of peers is found, the caller's timeout fires, or the
//! search is stopped.
//!
//! [BEP-5]: http://bittorrent.org/beps/bep_0005.html

mod engine;
mod error;
mod id;
mod message;
mod scheduler;
mod state;

pub use engine::{DiscoveryEngine, DiscoveryEvent, FinishReason, Phase, BOOTSTRAP_NODES};
pub use error::LookupError;
pub use id::{InfoHash, NodeId};
