//! Compact address encoding ([BEP-5]/[BEP-23]).
//!
//! The DHT packs a peer address into 6 bytes (IPv4 octets followed by a
//! big-endian port) and a node into a 26-byte record (20-byte node id
//! followed by the 6-byte address). Lookups only ever need the address, so
//! node ids are carried on the wire but not interpreted here.
//!
//! [BEP-5]: http://bittorrent.org/beps/bep_0005.html
//! [BEP-23]: http://bittorrent.org/beps/bep_0023.html

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing::trace;

/// IPv4 address + port.
pub const ADDR_LEN: usize = 6;

/// Node id + address.
pub const NODE_RECORD_LEN: usize = 26;

/// Decodes one 6-byte compact address. Anything that is not exactly 6
/// bytes is rejected.
pub fn parse_addr(data: &[u8]) -> Option<SocketAddr> {
    if data.len() != ADDR_LEN {
        return None;
    }
    let ip = Ipv4Addr::new(data[0], data[1], data[2], data[3]);
    let port = u16::from_be_bytes([data[4], data[5]]);
    Some(SocketAddr::new(IpAddr::V4(ip), port))
}

/// Decodes the addresses out of a concatenation of 26-byte node records.
///
/// A trailing partial record is skipped rather than failing the whole
/// batch; responses from the wild routinely carry junk.
pub fn parse_node_addrs(data: &[u8]) -> Vec<SocketAddr> {
    let chunks = data.chunks_exact(NODE_RECORD_LEN);
    if !chunks.remainder().is_empty() {
        trace!(
            len = data.len(),
            "compact node list has a truncated trailing record"
        );
    }
    chunks.filter_map(|record| parse_addr(&record[20..])).collect()
}

/// Encodes an address into the 6-byte compact form. IPv6 addresses have no
/// compact representation here.
pub fn encode_addr(addr: &SocketAddr) -> Option<[u8; ADDR_LEN]> {
    match addr {
        SocketAddr::V4(v4) => {
            let mut out = [0u8; ADDR_LEN];
            out[..4].copy_from_slice(&v4.ip().octets());
            out[4..].copy_from_slice(&v4.port().to_be_bytes());
            Some(out)
        }
        SocketAddr::V6(_) => None,
    }
}

/// Encodes a full 26-byte node record.
pub fn encode_node(id: &[u8; 20], addr: &SocketAddr) -> Option<[u8; NODE_RECORD_LEN]> {
    let compact = encode_addr(addr)?;
    let mut out = [0u8; NODE_RECORD_LEN];
    out[..20].copy_from_slice(id);
    out[20..].copy_from_slice(&compact);
    Some(out)
}
